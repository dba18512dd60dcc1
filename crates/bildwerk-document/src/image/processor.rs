// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — the pixel decode/encode primitive. Turns encoded bytes
// into a raster and back, with the few transformations the re-encode
// workflows need (long-edge bounding, alpha flattening).
//
// Decoding picks the codec from the payload's magic bytes and applies the
// EXIF orientation, so every raster leaves here upright.

use std::io::Cursor;

use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::{ImageItem, MediaType, TargetFormat};
use image::codecs::jpeg::JpegEncoder;
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, Rgb, RgbImage};
use tracing::{debug, instrument};

/// Background used when an alpha channel has to be dropped.
const FLATTEN_BACKGROUND: [u8; 3] = [255, 255, 255];

/// A single decoded image.
///
/// Transformations consume `self` and return a new `ImageProcessor`,
/// enabling method chaining:
///
/// ```ignore
/// let jpeg = ImageProcessor::from_item(&item)?
///     .limit_long_edge(1920)
///     .flatten_alpha()
///     .to_jpeg_bytes(80)?;
/// ```
pub struct ImageProcessor {
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Decode an item and apply its EXIF orientation, so the raster is the
    /// way the image is displayed.
    #[instrument(skip_all, fields(name = item.name(), bytes_len = item.byte_len()))]
    pub fn from_item(item: &ImageItem) -> Result<Self> {
        let mut decoder = open_decoder(item)?;
        let orientation = decoder
            .orientation()
            .map_err(|err| BildwerkError::decode(item.name(), err))?;
        let mut img = DynamicImage::from_decoder(decoder)
            .map_err(|err| BildwerkError::decode(item.name(), err))?;
        img.apply_orientation(orientation);
        debug!(width = img.width(), height = img.height(), ?orientation, "Image decoded");
        Ok(Self { image: img })
    }

    /// Displayed `(width, height)` of an item, read from its header only.
    pub fn oriented_dimensions(item: &ImageItem) -> Result<(u32, u32)> {
        let mut decoder = open_decoder(item)?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder
            .orientation()
            .map_err(|err| BildwerkError::decode(item.name(), err))?;
        Ok(if swaps_axes(orientation) {
            (height, width)
        } else {
            (width, height)
        })
    }

    /// Raster format of an item judged by its content. Payloads without a
    /// recognisable signature keep their declared type; recognised formats
    /// outside the accepted set (GIF, ...) are rejected.
    pub fn detect_media_type(item: &ImageItem) -> Result<MediaType> {
        match image::guess_format(item.bytes()) {
            Ok(format) => media_type_of(format).ok_or_else(|| {
                BildwerkError::UnsupportedMedia(format!("{} ({format:?} data)", item.name()))
            }),
            Err(_) => Ok(item.media_type()),
        }
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations -------------------------------------------------------

    /// Scale down proportionally so the longest edge is at most `max_edge`.
    /// Images already within bounds are returned untouched (never upscaled).
    pub fn limit_long_edge(self, max_edge: u32) -> Self {
        let (w, h) = (self.image.width(), self.image.height());
        if w.max(h) <= max_edge {
            return self;
        }
        let resized = self
            .image
            .resize(max_edge, max_edge, image::imageops::FilterType::Lanczos3);
        debug!(
            from_w = w,
            from_h = h,
            to_w = resized.width(),
            to_h = resized.height(),
            "Long edge limited"
        );
        Self { image: resized }
    }

    /// Composite any alpha channel onto a white background.
    pub fn flatten_alpha(self) -> Self {
        if !self.image.color().has_alpha() {
            return self;
        }
        let rgba = self.image.to_rgba8();
        let [br, bg, bb] = FLATTEN_BACKGROUND.map(u32::from);
        let flat = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let image::Rgba([r, g, b, a]) = *rgba.get_pixel(x, y);
            let a = u32::from(a);
            let blend = |c: u8, bgc: u32| ((u32::from(c) * a + bgc * (255 - a) + 127) / 255) as u8;
            Rgb([blend(r, br), blend(g, bg), blend(b, bb)])
        });
        Self {
            image: DynamicImage::ImageRgb8(flat),
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode as `target` with a quality fraction (ignored for PNG).
    /// Targets without alpha get transparent pixels flattened first.
    pub fn encode(self, target: TargetFormat, quality: f32) -> Result<Vec<u8>> {
        let processor = if target.has_alpha() {
            self
        } else {
            self.flatten_alpha()
        };
        match target {
            TargetFormat::Jpeg => processor.to_jpeg_bytes(quality_percent(quality)),
            TargetFormat::Png => processor.to_png_bytes(),
        }
    }

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        self.ensure_area()?;
        let mut buffer = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|err| BildwerkError::EncodeFailure(format!("PNG encoding failed: {err}")))?;
        Ok(buffer)
    }

    /// Encode the current image as JPEG bytes with the given quality (1-100).
    pub fn to_jpeg_bytes(&self, quality: u8) -> Result<Vec<u8>> {
        self.ensure_area()?;
        let mut buffer = Vec::new();
        let rgb = self.image.to_rgb8();
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
        rgb.write_with_encoder(encoder)
            .map_err(|err| BildwerkError::EncodeFailure(format!("JPEG encoding failed: {err}")))?;
        Ok(buffer)
    }

    fn ensure_area(&self) -> Result<()> {
        if self.image.width() == 0 || self.image.height() == 0 {
            return Err(BildwerkError::EncodeFailure(format!(
                "cannot encode a {}x{} raster",
                self.image.width(),
                self.image.height()
            )));
        }
        Ok(())
    }
}

fn open_decoder(item: &ImageItem) -> Result<impl ImageDecoder + '_> {
    let format = image_format(ImageProcessor::detect_media_type(item)?);
    ImageReader::with_format(Cursor::new(item.bytes()), format)
        .into_decoder()
        .map_err(|err| BildwerkError::decode(item.name(), err))
}

fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

/// Accepted media type for a detected container format.
pub fn media_type_of(format: ImageFormat) -> Option<MediaType> {
    match format {
        ImageFormat::Jpeg => Some(MediaType::Jpeg),
        ImageFormat::Png => Some(MediaType::Png),
        ImageFormat::WebP => Some(MediaType::Webp),
        ImageFormat::Bmp => Some(MediaType::Bmp),
        ImageFormat::Tiff => Some(MediaType::Tiff),
        _ => None,
    }
}

fn image_format(media_type: MediaType) -> ImageFormat {
    match media_type {
        MediaType::Jpeg => ImageFormat::Jpeg,
        MediaType::Png => ImageFormat::Png,
        MediaType::Webp => ImageFormat::WebP,
        MediaType::Bmp => ImageFormat::Bmp,
        MediaType::Tiff => ImageFormat::Tiff,
    }
}

/// Map a `0.0..=1.0` quality fraction onto the JPEG encoder's `1..=100` scale.
pub fn quality_percent(quality: f32) -> u8 {
    (quality.clamp(0.0, 1.0) * 100.0).round().clamp(1.0, 100.0) as u8
}
