// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bildwerk image pipeline.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{BildwerkError, Result};

/// Raster formats accepted at ingestion.
///
/// Vector and multi-frame formats (SVG, GIF) are deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    Jpeg,
    Png,
    Webp,
    Bmp,
    Tiff,
}

impl MediaType {
    /// Infer the media type from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" | "jfif" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "bmp" => Ok(Self::Bmp),
            "tif" | "tiff" => Ok(Self::Tiff),
            other => Err(BildwerkError::UnsupportedMedia(format!(".{other}"))),
        }
    }

    /// Infer the media type from a file name or path.
    pub fn from_file_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| BildwerkError::UnsupportedMedia(format!("{name} (no extension)")))?;
        Self::from_extension(ext)
    }
}

/// Output formats for the conversion workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetFormat {
    #[default]
    Jpeg,
    Png,
}

impl TargetFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// File extension enforced on converted output.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    /// Display label used in status messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
        }
    }

    /// Whether the encoded format can carry an alpha channel.
    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Png)
    }
}

impl FromStr for TargetFormat {
    type Err = BildwerkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "image/jpeg" => Ok(Self::Jpeg),
            "png" | "image/png" => Ok(Self::Png),
            other => Err(BildwerkError::UnsupportedMedia(format!(
                "{other} (conversion targets are jpeg and png)"
            ))),
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One user-supplied image: encoded payload plus its declared metadata.
///
/// Immutable once created. The payload is reference-counted so that batch
/// snapshots are cheap; items carry no identity beyond their batch position.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageItem {
    name: String,
    media_type: MediaType,
    data: Arc<[u8]>,
}

impl ImageItem {
    pub fn new(name: impl Into<String>, media_type: MediaType, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            media_type,
            data: data.into(),
        }
    }

    /// Build an item whose media type is inferred from the file name.
    pub fn from_named_bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let name = name.into();
        let media_type = MediaType::from_file_name(&name)?;
        Ok(Self::new(name, media_type, data))
    }

    /// Display name (usually the original file name).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Encoded payload.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// File name without its final extension, used for default output names.
    pub fn stem(&self) -> &str {
        Path::new(&self.name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("image")
    }
}

impl std::fmt::Debug for ImageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageItem")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("byte_len", &self.data.len())
            .finish()
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Lossy size reduction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionSpec {
    /// Target quality as a fraction in `0.0..=1.0`.
    pub quality: f32,
    /// Longest allowed edge in pixels; larger images are scaled down.
    pub max_dimension: u32,
    /// Upper bound for the encoded payload.
    pub max_output_bytes: u64,
}

impl CompressionSpec {
    pub fn validate(&self) -> Result<()> {
        validate_quality(self.quality)?;
        if self.max_dimension == 0 {
            return Err(BildwerkError::InvalidConfig(
                "max_dimension must be at least 1 pixel".into(),
            ));
        }
        Ok(())
    }
}

/// Format conversion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionSpec {
    pub target: TargetFormat,
    /// Encoder quality fraction; ignored by lossless targets.
    pub quality: f32,
}

/// Selects which re-encode behaviour applies to a single image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProcessingSpec {
    Compression(CompressionSpec),
    Conversion(ConversionSpec),
}

/// Reject quality fractions outside `0.0..=1.0` (including NaN).
pub fn validate_quality(quality: f32) -> Result<()> {
    if (0.0..=1.0).contains(&quality) {
        Ok(())
    } else {
        Err(BildwerkError::InvalidQuality(quality))
    }
}

/// A named payload ready to be handed to the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("byte_len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_type_from_extension_is_case_insensitive() {
        assert_eq!(MediaType::from_extension("JPG").unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::from_file_name("scan.Png").unwrap(), MediaType::Png);
    }

    #[test]
    fn multi_frame_and_vector_formats_are_rejected() {
        assert!(matches!(
            MediaType::from_extension("gif"),
            Err(BildwerkError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            MediaType::from_file_name("logo.svg"),
            Err(BildwerkError::UnsupportedMedia(_))
        ));
        assert!(MediaType::from_file_name("README").is_err());
    }

    #[test]
    fn stem_drops_only_the_last_extension() {
        let item = ImageItem::new("holiday.2024.jpg", MediaType::Jpeg, vec![1u8, 2, 3]);
        assert_eq!(item.stem(), "holiday.2024");
        assert_eq!(item.byte_len(), 3);
    }

    #[test]
    fn target_format_parses_common_spellings() {
        assert_eq!("JPEG".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);
        assert_eq!("jpg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpeg);
        assert_eq!("png".parse::<TargetFormat>().unwrap(), TargetFormat::Png);
        assert!("webp".parse::<TargetFormat>().is_err());
    }

    #[test]
    fn quality_outside_unit_range_is_rejected() {
        assert!(validate_quality(0.0).is_ok());
        assert!(validate_quality(1.0).is_ok());
        assert!(validate_quality(1.01).is_err());
        assert!(validate_quality(f32::NAN).is_err());
    }
}
