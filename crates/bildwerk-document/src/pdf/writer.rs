// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembly — one page per image, each image fitted and centred on a
// fixed-size page, rendered through `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. Images are stored DCT (JPEG) compressed.

use bildwerk_core::PipelineConfig;
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::types::ImageItem;
use image::DynamicImage;
use printpdf::{
    ImageCompression, ImageOptimizationOptions, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions,
    PdfWarnMsg, RawImage, RawImageData, RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::geometry::{PageGeometry, PageLayout};
use crate::image::ImageProcessor;

/// At 72 DPI one image pixel maps to one PDF point, which keeps the
/// scale factors below a plain ratio.
const PLACEMENT_DPI: f32 = 72.0;

/// JPEG quality for embedded images when none is configured.
const DEFAULT_IMAGE_QUALITY: f32 = 0.85;

/// The page-emitting side of document assembly.
///
/// A backend starts with one open page. The assembler places the first image
/// on it and calls [`PageBackend::new_page`] before every further image.
pub trait PageBackend {
    /// Close the current page and open a new one of the given size (mm).
    fn new_page(&mut self, width_mm: f32, height_mm: f32);

    /// Draw `image` into the rectangle described by `layout` on the current page.
    fn place_image(&mut self, image: DynamicImage, layout: &PageLayout) -> Result<()>;
}

// -- printpdf backend ---------------------------------------------------------

/// [`PageBackend`] that produces a PDF with `printpdf`.
pub struct PrintPdfBackend {
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    current_ops: Vec<Op>,
    current_size: (Mm, Mm),
    image_quality: f32,
}

impl PrintPdfBackend {
    /// Open a document whose first page has the given size (mm).
    pub fn new(title: &str, width_mm: f32, height_mm: f32) -> Self {
        Self {
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            current_ops: Vec::new(),
            current_size: (Mm(width_mm), Mm(height_mm)),
            image_quality: DEFAULT_IMAGE_QUALITY,
        }
    }

    /// JPEG quality (`0.0..=1.0`) used when images are written out.
    pub fn with_image_quality(mut self, quality: f32) -> Self {
        self.image_quality = quality;
        self
    }

    /// Close the last page and serialise the document.
    pub fn finish(mut self) -> Vec<u8> {
        let (w, h) = self.current_size;
        self.pages.push(PdfPage::new(w, h, self.current_ops));
        self.doc.with_pages(self.pages);

        // Keep full resolution: printpdf would otherwise shrink images past 2 MB.
        let options = PdfSaveOptions {
            image_optimization: Some(ImageOptimizationOptions {
                quality: Some(self.image_quality),
                max_image_size: None,
                format: Some(ImageCompression::Jpeg),
                ..ImageOptimizationOptions::default()
            }),
            ..PdfSaveOptions::default()
        };

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&options, &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings while saving");
        }
        output
    }
}

impl PageBackend for PrintPdfBackend {
    fn new_page(&mut self, width_mm: f32, height_mm: f32) {
        let (w, h) = self.current_size;
        let ops = std::mem::take(&mut self.current_ops);
        self.pages.push(PdfPage::new(w, h, ops));
        self.current_size = (Mm(width_mm), Mm(height_mm));
    }

    fn place_image(&mut self, image: DynamicImage, layout: &PageLayout) -> Result<()> {
        let (px_w, px_h) = (image.width(), image.height());
        if px_w == 0 || px_h == 0 {
            return Err(BildwerkError::PdfError("cannot place an empty raster".into()));
        }

        // printpdf takes raw pixels; alpha is flattened onto white first.
        let rgb = ImageProcessor::from_dynamic(image)
            .flatten_alpha()
            .into_dynamic()
            .into_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: px_w as usize,
            height: px_h as usize,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.doc.add_image(&raw);

        let scale_x = Mm(layout.width).into_pt().0 / px_w as f32;
        let scale_y = Mm(layout.height).into_pt().0 / px_h as f32;

        self.current_ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Mm(layout.x).into_pt()),
                translate_y: Some(Mm(layout.y_from_bottom()).into_pt()),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                dpi: Some(PLACEMENT_DPI),
                rotate: None,
            },
        });

        debug!(
            x_mm = layout.x,
            width_mm = layout.width,
            scale_x,
            scale_y,
            "Image placed on page"
        );
        Ok(())
    }
}

// -- Assembler ----------------------------------------------------------------

/// Builds one page per image on a fixed page size.
pub struct DocumentAssembler {
    geometry: PageGeometry,
    title: String,
    image_quality: f32,
}

impl DocumentAssembler {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            title: "Bildwerk Images".into(),
            image_quality: DEFAULT_IMAGE_QUALITY,
        }
    }

    /// A4 with a 10 mm margin.
    pub fn a4() -> Self {
        Self::new(PageGeometry::A4)
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(PageGeometry::from_config(config))
            .with_title(config.pdf_title.clone())
            .with_image_quality(config.pdf_image_quality)
    }

    /// Set a title for the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// JPEG quality for images embedded in the PDF.
    pub fn with_image_quality(mut self, quality: f32) -> Self {
        self.image_quality = quality;
        self
    }

    /// Assemble `items`, in order, into a PDF.
    #[instrument(skip(self, items), fields(items = items.len()))]
    pub fn assemble(&self, items: &[ImageItem]) -> Result<Vec<u8>> {
        let mut backend =
            PrintPdfBackend::new(&self.title, self.geometry.width, self.geometry.height)
                .with_image_quality(self.image_quality);
        let pages = self.assemble_into(items, &mut backend)?;
        let output = backend.finish();
        info!(pages, bytes = output.len(), "PDF assembled");
        Ok(output)
    }

    /// Drive any [`PageBackend`]. Returns the number of pages emitted.
    ///
    /// Every item's header is read and fitted before the first page is
    /// touched, so an unreadable item leaves the backend as it was passed in.
    /// Pixel data is then decoded one page at a time.
    pub fn assemble_into<B: PageBackend>(&self, items: &[ImageItem], backend: &mut B) -> Result<usize> {
        let layouts = self.plan(items)?;

        for (index, (item, layout)) in items.iter().zip(&layouts).enumerate() {
            let image = ImageProcessor::from_item(item)?.into_dynamic();
            if index > 0 {
                backend.new_page(self.geometry.width, self.geometry.height);
            }
            backend.place_image(image, layout)?;
        }
        Ok(layouts.len())
    }

    /// Fit every item from its header dimensions, failing on the first bad one.
    fn plan(&self, items: &[ImageItem]) -> Result<Vec<PageLayout>> {
        if items.is_empty() {
            return Err(BildwerkError::EmptyBatch);
        }

        items
            .iter()
            .map(|item| {
                let (width, height) = ImageProcessor::oriented_dimensions(item)?;
                self.geometry
                    .fit(width, height)
                    .map_err(|err| BildwerkError::decode(item.name(), err))
            })
            .collect()
    }
}

/// Assemble `items` onto pages of `page_width` x `page_height` mm with a
/// uniform `margin`.
pub fn assemble(
    items: &[ImageItem],
    page_width: f32,
    page_height: f32,
    margin: f32,
) -> Result<Vec<u8>> {
    DocumentAssembler::new(PageGeometry {
        width: page_width,
        height: page_height,
        margin,
    })
    .assemble(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::processor::fixtures::exif_oriented_jpeg;
    use crate::pdf::reader::PdfReader;
    use bildwerk_core::types::MediaType;
    use image::{Rgb, RgbImage};

    /// Records calls instead of drawing.
    #[derive(Default)]
    struct RecordingBackend {
        /// One entry per page: the pixel sizes placed on it.
        pages: Vec<Vec<(u32, u32)>>,
        layouts: Vec<PageLayout>,
    }

    impl PageBackend for RecordingBackend {
        fn new_page(&mut self, _width_mm: f32, _height_mm: f32) {
            self.pages.push(Vec::new());
        }

        fn place_image(&mut self, image: DynamicImage, layout: &PageLayout) -> Result<()> {
            if self.pages.is_empty() {
                self.pages.push(Vec::new());
            }
            if let Some(page) = self.pages.last_mut() {
                page.push((image.width(), image.height()));
            }
            self.layouts.push(*layout);
            Ok(())
        }
    }

    fn png(name: &str, width: u32, height: u32) -> ImageItem {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 60, 200]));
        let bytes = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img))
            .to_png_bytes()
            .unwrap();
        ImageItem::new(name, MediaType::Png, bytes)
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = DocumentAssembler::a4().assemble(&[]).unwrap_err();
        assert!(matches!(err, BildwerkError::EmptyBatch));
    }

    #[test]
    fn single_image_produces_one_page() {
        let pdf = DocumentAssembler::a4().assemble(&[png("one.png", 40, 30)]).unwrap();
        let reader = PdfReader::from_bytes(&pdf).unwrap();
        assert_eq!(reader.page_count(), 1);
    }

    #[test]
    fn pages_are_a4_sized() {
        let pdf = assemble(&[png("a.png", 8, 8), png("b.png", 8, 16)], 210.0, 297.0, 10.0).unwrap();
        let reader = PdfReader::from_bytes(&pdf).unwrap();
        assert_eq!(reader.page_count(), 2);
        let (w, h) = reader.page_size_pt(2).unwrap();
        assert!((w - Mm(210.0).into_pt().0).abs() < 1.0, "width {w}");
        assert!((h - Mm(297.0).into_pt().0).abs() < 1.0, "height {h}");
    }

    #[test]
    fn one_page_per_item_in_order() {
        let items = [png("a.png", 10, 10), png("b.png", 20, 10), png("c.png", 10, 30)];
        let mut backend = RecordingBackend::default();
        let pages = DocumentAssembler::a4().assemble_into(&items, &mut backend).unwrap();

        assert_eq!(pages, 3);
        assert_eq!(backend.pages, vec![vec![(10, 10)], vec![(20, 10)], vec![(10, 30)]]);
    }

    #[test]
    fn layouts_come_from_the_fitter() {
        let items = [png("wide.png", 400, 300)];
        let mut backend = RecordingBackend::default();
        DocumentAssembler::a4().assemble_into(&items, &mut backend).unwrap();

        let expected = PageGeometry::A4.fit(400, 300).unwrap();
        assert_eq!(backend.layouts, vec![expected]);
    }

    #[test]
    fn bad_item_aborts_without_emitting_pages() {
        let items = [
            png("good.png", 10, 10),
            ImageItem::new("corrupt.jpg", MediaType::Jpeg, vec![0xFFu8, 0xD8, 0x00]),
            png("later.png", 10, 10),
        ];
        let mut backend = RecordingBackend::default();
        let err = DocumentAssembler::a4()
            .assemble_into(&items, &mut backend)
            .unwrap_err();

        match err {
            BildwerkError::DecodeFailure { name, .. } => assert_eq!(name, "corrupt.jpg"),
            other => panic!("expected DecodeFailure, got {other:?}"),
        }
        assert!(backend.pages.is_empty());
    }

    #[test]
    fn exif_rotated_photo_is_fitted_upright() {
        let items = [ImageItem::new(
            "phone.jpg",
            MediaType::Jpeg,
            exif_oriented_jpeg(40, 20, 6),
        )];
        let mut backend = RecordingBackend::default();
        DocumentAssembler::a4().assemble_into(&items, &mut backend).unwrap();

        assert_eq!(backend.pages, vec![vec![(20, 40)]]);
        assert_eq!(backend.layouts, vec![PageGeometry::A4.fit(20, 40).unwrap()]);
    }

    #[test]
    fn embedded_photo_stays_close_to_its_jpeg_size() {
        let mut seed: u32 = 7;
        let img = RgbImage::from_fn(800, 600, |x, y| {
            seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let grain = (seed >> 30) as u8;
            Rgb([
                (x * 255 / 800) as u8 ^ grain,
                (y * 255 / 600) as u8,
                ((x + y) % 256) as u8 / 2,
            ])
        });
        let jpeg = ImageProcessor::from_dynamic(DynamicImage::ImageRgb8(img))
            .to_jpeg_bytes(90)
            .unwrap();
        let item = ImageItem::new("photo.jpg", MediaType::Jpeg, jpeg.clone());

        let pdf = DocumentAssembler::a4().assemble(&[item]).unwrap();
        assert!(
            pdf.len() < 2 * jpeg.len(),
            "pdf {} bytes for a {} byte jpeg",
            pdf.len(),
            jpeg.len()
        );
    }
}
