// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — inspect assembled documents using the `lopdf` crate.

use bildwerk_core::error::{BildwerkError, Result};
use lopdf::{Document, Object};
use tracing::{debug, instrument};

/// Read-only view of a PDF, used to verify assembled output.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    /// Load a PDF from raw bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            BildwerkError::PdfError(format!("failed to load PDF from memory: {}", err))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// `(width, height)` of a page (1-indexed) in PDF points, from its
    /// `/MediaBox`.
    pub fn page_size_pt(&self, page_number: u32) -> Result<(f32, f32)> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page_number).ok_or_else(|| {
            BildwerkError::PdfError(format!(
                "page {} not found (document has {} pages)",
                page_number,
                pages.len()
            ))
        })?;

        let media_box = match self.document.get_object(page_id) {
            Ok(Object::Dictionary(dict)) => dict.get(b"MediaBox").ok().cloned(),
            _ => None,
        }
        .ok_or_else(|| BildwerkError::PdfError(format!("page {page_number} has no MediaBox")))?;

        let coords: Vec<f32> = match media_box {
            Object::Array(values) => values.iter().filter_map(number).collect(),
            _ => Vec::new(),
        };
        match coords.as_slice() {
            [x0, y0, x1, y1] => Ok(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => Err(BildwerkError::PdfError(format!(
                "page {page_number} has a malformed MediaBox"
            ))),
        }
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}
