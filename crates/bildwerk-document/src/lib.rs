// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// bildwerk-document — Document and image processing for Bildwerk.
//
// Provides page geometry (fit an image onto a page), PDF assembly and
// inspection, the pixel decode/encode primitive, and the re-encode pipeline
// (compression and format conversion).

pub mod geometry;
pub mod image;
pub mod pdf;
pub mod reencode;

// Re-export the primary structs so callers can use `bildwerk_document::DocumentAssembler` etc.
pub use geometry::{PageGeometry, PageLayout, fit};
pub use self::image::processor::ImageProcessor;
pub use pdf::reader::PdfReader;
pub use pdf::writer::{DocumentAssembler, PageBackend, PrintPdfBackend};
pub use reencode::{JpegRecompressor, Recompressor, ReencodeOutput, ReencodePipeline};
