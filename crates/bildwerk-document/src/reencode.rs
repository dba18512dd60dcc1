// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Re-encode pipeline — lossy size reduction and format conversion of a single
// image. Both entry points are stateless and single-shot; the caller decides
// whether to try again.

use bildwerk_core::PipelineConfig;
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{
    CompressionSpec, ConversionSpec, ImageItem, ProcessingSpec, TargetFormat, validate_quality,
};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;
use crate::image::processor::quality_percent;

/// Result of any re-encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReencodeOutput {
    pub bytes: Vec<u8>,
    pub byte_len: usize,
    /// Pixel size of the encoded image.
    pub width: u32,
    pub height: u32,
}

impl ReencodeOutput {
    fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            byte_len: bytes.len(),
            bytes,
            width,
            height,
        }
    }
}

/// The lossy recompression engine behind [`ReencodePipeline::compress`].
///
/// Implementations always produce JPEG and report failures as
/// [`BildwerkError::CompressionFailure`].
pub trait Recompressor {
    fn recompress(&self, image: &ImageItem, spec: &CompressionSpec) -> Result<ReencodeOutput>;
}

/// JPEG recompressor built on the `image` crate's encoder.
///
/// Scales the long edge down to `max_dimension` and encodes at the requested
/// quality. While the result is larger than `max_output_bytes` or than the
/// source payload, it retries at lower quality until `min_quality` is reached
/// and then returns its best effort.
#[derive(Debug, Clone, Copy)]
pub struct JpegRecompressor {
    min_quality: f32,
    /// Multiplier applied to the quality on each retry, in `(0, 1)`.
    quality_step: f32,
}

impl Default for JpegRecompressor {
    fn default() -> Self {
        Self {
            min_quality: 0.05,
            quality_step: 0.9,
        }
    }
}

impl Recompressor for JpegRecompressor {
    #[instrument(skip_all, fields(name = image.name(), quality = spec.quality))]
    fn recompress(&self, image: &ImageItem, spec: &CompressionSpec) -> Result<ReencodeOutput> {
        let failed = |err: BildwerkError| {
            BildwerkError::CompressionFailure(format!("{}: {err}", image.name()))
        };

        let processor = ImageProcessor::from_item(image)
            .map_err(failed)?
            .limit_long_edge(spec.max_dimension)
            .flatten_alpha();
        let (width, height) = (processor.width(), processor.height());

        let limit = spec.max_output_bytes.min(image.byte_len() as u64);
        let mut quality = spec.quality;
        let mut bytes = processor.to_jpeg_bytes(quality_percent(quality)).map_err(failed)?;
        while bytes.len() as u64 > limit && quality > self.min_quality {
            quality = (quality * self.quality_step).max(self.min_quality);
            debug!(quality, size = bytes.len(), limit, "Output too large, lowering quality");
            bytes = processor.to_jpeg_bytes(quality_percent(quality)).map_err(failed)?;
        }
        if bytes.len() as u64 > spec.max_output_bytes {
            warn!(
                size = bytes.len(),
                limit = spec.max_output_bytes,
                "Size limit not reached at minimum quality; returning best effort"
            );
        } else if bytes.len() > image.byte_len() {
            debug!(
                size = bytes.len(),
                source = image.byte_len(),
                "Output still larger than the source at minimum quality"
            );
        }

        Ok(ReencodeOutput::new(bytes, width, height))
    }
}

/// Entry point for the single-image workflows.
pub struct ReencodePipeline<R = JpegRecompressor> {
    recompressor: R,
    conversion_quality: f32,
    max_output_bytes: u64,
}

impl ReencodePipeline<JpegRecompressor> {
    /// JPEG recompression, 0.9 conversion quality, 100 MiB output cap.
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            recompressor: JpegRecompressor::default(),
            conversion_quality: config.conversion_quality,
            max_output_bytes: config.max_compressed_bytes,
        }
    }
}

impl Default for ReencodePipeline<JpegRecompressor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Recompressor> ReencodePipeline<R> {
    /// Use a different recompression engine.
    pub fn with_recompressor<S: Recompressor>(self, recompressor: S) -> ReencodePipeline<S> {
        ReencodePipeline {
            recompressor,
            conversion_quality: self.conversion_quality,
            max_output_bytes: self.max_output_bytes,
        }
    }

    /// Shrink `image` to a JPEG at `quality` (0.0..=1.0), long edge at most
    /// `max_dimension` pixels.
    pub fn compress(&self, image: &ImageItem, quality: f32, max_dimension: u32) -> Result<ReencodeOutput> {
        self.compress_with(
            image,
            &CompressionSpec {
                quality,
                max_dimension,
                max_output_bytes: self.max_output_bytes,
            },
        )
    }

    #[instrument(skip(self, image), fields(name = image.name(), bytes_len = image.byte_len()))]
    pub fn compress_with(&self, image: &ImageItem, spec: &CompressionSpec) -> Result<ReencodeOutput> {
        spec.validate()?;
        let output = self.recompressor.recompress(image, spec)?;
        info!(
            original = image.byte_len(),
            compressed = output.byte_len,
            width = output.width,
            height = output.height,
            "Image compressed"
        );
        Ok(output)
    }

    /// Re-encode `image` as `target` at the configured conversion quality.
    pub fn convert(&self, image: &ImageItem, target: TargetFormat) -> Result<ReencodeOutput> {
        self.convert_with(
            image,
            &ConversionSpec {
                target,
                quality: self.conversion_quality,
            },
        )
    }

    #[instrument(skip(self, image), fields(name = image.name(), format = %spec.target))]
    pub fn convert_with(&self, image: &ImageItem, spec: &ConversionSpec) -> Result<ReencodeOutput> {
        validate_quality(spec.quality)?;
        let processor = ImageProcessor::from_item(image)?;
        let (width, height) = (processor.width(), processor.height());
        let bytes = processor.encode(spec.target, spec.quality)?;
        info!(
            original = image.byte_len(),
            converted = bytes.len(),
            "Image converted"
        );
        Ok(ReencodeOutput::new(bytes, width, height))
    }

    /// Apply whichever behaviour `spec` selects.
    pub fn reencode(&self, image: &ImageItem, spec: &ProcessingSpec) -> Result<ReencodeOutput> {
        match spec {
            ProcessingSpec::Compression(spec) => self.compress_with(image, spec),
            ProcessingSpec::Conversion(spec) => self.convert_with(image, spec),
        }
    }
}
