// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page geometry — fit an image onto a fixed-size page, centred, preserving
// its aspect ratio.

use bildwerk_core::PipelineConfig;
use bildwerk_core::error::{BildwerkError, Result};

/// Fixed page size and margin shared by every page of a document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageGeometry {
    /// A4 portrait with a 10 mm margin.
    pub const A4: Self = Self {
        width: 210.0,
        height: 297.0,
        margin: 10.0,
    };

    pub fn from_config(config: &PipelineConfig) -> Self {
        let (width, height) = config.page_size_mm();
        Self {
            width,
            height,
            margin: config.margin_mm,
        }
    }

    /// Fit an image of the given pixel size onto this page.
    pub fn fit(&self, image_width: u32, image_height: u32) -> Result<PageLayout> {
        fit(
            self.width,
            self.height,
            self.margin,
            image_width as f32,
            image_height as f32,
        )
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::A4
    }
}

/// Placement of one image on one page, in page units (millimetres).
///
/// `x`/`y` are measured from the top-left corner of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageLayout {
    /// Distance from the bottom page edge to the bottom of the image, for
    /// coordinate systems with a bottom-left origin such as PDF.
    pub fn y_from_bottom(&self) -> f32 {
        self.page_height - self.y - self.height
    }
}

/// Compute a centred, aspect-preserving placement rectangle.
///
/// The image is scaled uniformly (up or down) so it fills as much of the
/// page-minus-margins region as possible, then centred on the full page.
pub fn fit(
    page_width: f32,
    page_height: f32,
    margin: f32,
    image_width: f32,
    image_height: f32,
) -> Result<PageLayout> {
    let all_finite = [page_width, page_height, margin, image_width, image_height]
        .iter()
        .all(|v| v.is_finite());
    if !all_finite {
        return Err(BildwerkError::InvalidGeometry("non-finite dimension".into()));
    }
    if image_width <= 0.0 || image_height <= 0.0 {
        return Err(BildwerkError::InvalidGeometry(format!(
            "image size {image_width}x{image_height} has no area"
        )));
    }

    let content_width = page_width - 2.0 * margin;
    let content_height = page_height - 2.0 * margin;
    if margin < 0.0 || content_width <= 0.0 || content_height <= 0.0 {
        return Err(BildwerkError::InvalidGeometry(format!(
            "margin {margin} leaves no content area on a {page_width}x{page_height} page"
        )));
    }

    let scale = (content_width / image_width).min(content_height / image_height);
    let width = image_width * scale;
    let height = image_height * scale;

    Ok(PageLayout {
        page_width,
        page_height,
        margin,
        x: (page_width - width) / 2.0,
        y: (page_height - height) / 2.0,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn landscape_image_fills_content_width() {
        let layout = PageGeometry::A4.fit(4000, 3000).unwrap();
        assert!((layout.width - 190.0).abs() < EPS);
        assert!((layout.height - 142.5).abs() < EPS);
        assert!((layout.x - 10.0).abs() < EPS);
        assert!((layout.y - 77.25).abs() < EPS);
    }

    #[test]
    fn small_image_is_scaled_up() {
        let layout = PageGeometry::A4.fit(10, 20).unwrap();
        // Height-bound: 277 / 20 = 13.85
        assert!((layout.height - 277.0).abs() < EPS);
        assert!((layout.width - 138.5).abs() < EPS);
        assert!((layout.y - 10.0).abs() < EPS);
    }

    #[test]
    fn placement_stays_inside_margins_and_keeps_aspect() {
        let page = PageGeometry::A4;
        let sizes = [1u32, 2, 7, 33, 190, 277, 640, 1080, 1920, 4032, 12000];
        for &w in &sizes {
            for &h in &sizes {
                let l = page.fit(w, h).unwrap();
                assert!(l.x >= page.margin - EPS, "{w}x{h}: x = {}", l.x);
                assert!(l.y >= page.margin - EPS, "{w}x{h}: y = {}", l.y);
                assert!(l.x + l.width <= page.width - page.margin + EPS);
                assert!(l.y + l.height <= page.height - page.margin + EPS);

                let expected = w as f32 / h as f32;
                let actual = l.width / l.height;
                assert!(
                    (actual - expected).abs() / expected < 1e-4,
                    "{w}x{h}: aspect {actual} != {expected}"
                );
            }
        }
    }

    #[test]
    fn placement_is_centred() {
        let l = PageGeometry::A4.fit(300, 100).unwrap();
        assert!((l.x - (l.page_width - l.x - l.width)).abs() < EPS);
        assert!((l.y - l.y_from_bottom()).abs() < EPS);
    }

    #[test]
    fn zero_dimension_is_an_error() {
        assert!(matches!(
            PageGeometry::A4.fit(0, 100),
            Err(BildwerkError::InvalidGeometry(_))
        ));
        assert!(PageGeometry::A4.fit(100, 0).is_err());
    }

    #[test]
    fn margin_swallowing_the_page_is_an_error() {
        assert!(fit(210.0, 297.0, 105.0, 10.0, 10.0).is_err());
        assert!(fit(210.0, 297.0, f32::NAN, 10.0, 10.0).is_err());
    }
}
