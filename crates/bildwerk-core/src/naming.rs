// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output file naming. A user-supplied name replaces the default stem, but the
// extension always comes from the workflow.

use crate::types::{ImageItem, TargetFormat};

/// Default stem of an assembled document.
pub const DEFAULT_DOCUMENT_STEM: &str = "converted_images";

/// `converted_images.pdf`, or `<custom>.pdf`.
pub fn document_file_name(custom: Option<&str>) -> String {
    finish(custom, DEFAULT_DOCUMENT_STEM, "pdf")
}

/// `<stem>_compressed.jpg`, or `<custom>.jpg`.
pub fn compressed_file_name(source: &ImageItem, custom: Option<&str>) -> String {
    finish(custom, &format!("{}_compressed", source.stem()), "jpg")
}

/// `<stem>_converted.<jpg|png>`, or `<custom>.<jpg|png>`.
pub fn converted_file_name(source: &ImageItem, custom: Option<&str>, target: TargetFormat) -> String {
    finish(
        custom,
        &format!("{}_converted", source.stem()),
        target.extension(),
    )
}

fn finish(custom: Option<&str>, default_stem: &str, ext: &str) -> String {
    let stem = custom
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| strip_extension(s, ext))
        .filter(|s| !s.is_empty())
        .unwrap_or(default_stem);
    let stem: String = stem
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("{stem}.{ext}")
}

/// Drop a trailing `.ext` the user typed themselves (case-insensitive).
fn strip_extension<'a>(name: &'a str, ext: &str) -> &'a str {
    let suffix_len = ext.len() + 1;
    if name.len() >= suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (head, tail) = name.split_at(name.len() - suffix_len);
        if tail.starts_with('.') && tail[1..].eq_ignore_ascii_case(ext) {
            return head;
        }
    }
    name
}
