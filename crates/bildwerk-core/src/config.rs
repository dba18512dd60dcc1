// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::batch::DEFAULT_BATCH_CAPACITY;
use crate::error::{BildwerkError, Result};
use crate::types::{CompressionSpec, ConversionSpec, PaperSize, TargetFormat, validate_quality};

/// Policy knobs for all three workflows.
///
/// Missing fields in a config file fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Page size used for every page of an assembled document.
    pub paper_size: PaperSize,
    /// Margin on every side of the page, in millimetres.
    pub margin_mm: f32,
    /// Maximum number of images in the document batch.
    pub batch_capacity: usize,
    /// Title embedded in generated PDFs.
    pub pdf_title: String,
    /// JPEG quality for images embedded in generated PDFs.
    pub pdf_image_quality: f32,
    /// Longest edge of a compressed image, in pixels.
    pub max_dimension: u32,
    /// Quality used when the caller does not pick one.
    pub default_compression_quality: f32,
    /// Upper bound for a compressed payload (100 MiB).
    pub max_compressed_bytes: u64,
    /// Fixed encoder quality for format conversion.
    pub conversion_quality: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            margin_mm: 10.0,
            batch_capacity: DEFAULT_BATCH_CAPACITY,
            pdf_title: "Bildwerk Images".into(),
            pdf_image_quality: 0.85,
            max_dimension: 1920,
            default_compression_quality: 0.8,
            max_compressed_bytes: 100 * 1024 * 1024,
            conversion_quality: 0.9,
        }
    }
}

impl PipelineConfig {
    /// Check that the configured values describe a usable pipeline.
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.paper_size.dimensions_mm();
        if w == 0 || h == 0 {
            return Err(BildwerkError::InvalidConfig("paper size must be non-zero".into()));
        }
        let shortest = w.min(h) as f32;
        if !self.margin_mm.is_finite() || self.margin_mm < 0.0 || 2.0 * self.margin_mm >= shortest {
            return Err(BildwerkError::InvalidConfig(format!(
                "margin {} mm leaves no printable area on a {w}x{h} mm page",
                self.margin_mm
            )));
        }
        if self.batch_capacity == 0 {
            return Err(BildwerkError::InvalidConfig("batch_capacity must be at least 1".into()));
        }
        if self.max_dimension == 0 {
            return Err(BildwerkError::InvalidConfig("max_dimension must be at least 1".into()));
        }
        validate_quality(self.pdf_image_quality)?;
        validate_quality(self.default_compression_quality)?;
        validate_quality(self.conversion_quality)?;
        Ok(())
    }

    /// Load from JSON text and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Paper dimensions in millimetres as floats.
    pub fn page_size_mm(&self) -> (f32, f32) {
        let (w, h) = self.paper_size.dimensions_mm();
        (w as f32, h as f32)
    }

    /// Compression parameters for the given quality.
    pub fn compression_spec(&self, quality: f32) -> CompressionSpec {
        CompressionSpec {
            quality,
            max_dimension: self.max_dimension,
            max_output_bytes: self.max_compressed_bytes,
        }
    }

    /// Conversion parameters for the given target.
    pub fn conversion_spec(&self, target: TargetFormat) -> ConversionSpec {
        ConversionSpec {
            target,
            quality: self.conversion_quality,
        }
    }
}
