// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how the presentation layer shows it.

use crate::error::BildwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something outside the user's file went wrong; trying again may work.
    Transient,
    /// User must do something (pick a file, remove images).
    ActionRequired,
    /// The input itself cannot be processed.
    Permanent,
    /// A bug in Bildwerk; should never surface in normal use.
    Internal,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `BildwerkError` into a `HumanError`.
pub fn humanize_error(err: &BildwerkError) -> HumanError {
    match err {
        // -- Batch --
        BildwerkError::CapacityExceeded { capacity, current, .. } => HumanError {
            message: format!("You can only add up to {capacity} images."),
            suggestion: format!(
                "{current} image(s) are already queued. Remove some or add fewer at once."
            ),
            severity: Severity::ActionRequired,
        },

        BildwerkError::IndexOutOfRange { .. } => HumanError {
            message: "Something went wrong with the image list.".into(),
            suggestion: "Clear the list and add your images again.".into(),
            severity: Severity::Internal,
        },

        BildwerkError::EmptyBatch => HumanError {
            message: "No images have been added yet.".into(),
            suggestion: "Please add images before converting.".into(),
            severity: Severity::ActionRequired,
        },

        BildwerkError::NoImageSelected => HumanError {
            message: "No image selected.".into(),
            suggestion: "Please choose an image first.".into(),
            severity: Severity::ActionRequired,
        },

        BildwerkError::UnsupportedMedia(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Use a JPEG, PNG, WebP, BMP or TIFF image. (File type: {detail})"),
            severity: Severity::Permanent,
        },

        // -- Image --
        BildwerkError::DecodeFailure { name, .. } => HumanError {
            message: format!("\"{name}\" couldn't be read as an image."),
            suggestion: "The file may be damaged. Remove it or save it again as a JPEG or PNG.".into(),
            severity: Severity::Permanent,
        },

        BildwerkError::EncodeFailure(_) => HumanError {
            message: "Conversion failed.".into(),
            suggestion: "The image could not be written in the chosen format. Try the other format.".into(),
            severity: Severity::Permanent,
        },

        BildwerkError::CompressionFailure(_) => HumanError {
            message: "An error occurred during compression.".into(),
            suggestion: "The image may be damaged. Try a different file.".into(),
            severity: Severity::Permanent,
        },

        BildwerkError::InvalidGeometry(_) => HumanError {
            message: "An image has no usable size.".into(),
            suggestion: "Images must be at least one pixel wide and tall.".into(),
            severity: Severity::Permanent,
        },

        BildwerkError::InvalidQuality(quality) => HumanError {
            message: "That quality setting isn't valid.".into(),
            suggestion: format!("Pick a quality between 0 and 1 (got {quality})."),
            severity: Severity::ActionRequired,
        },

        // -- Document --
        BildwerkError::PdfError(_) => HumanError {
            message: "An error occurred during PDF conversion.".into(),
            suggestion: "Try again. If this keeps happening, try with fewer images.".into(),
            severity: Severity::Transient,
        },

        // -- Configuration / persistence --
        BildwerkError::InvalidConfig(detail) => HumanError {
            message: "The settings file has a problem.".into(),
            suggestion: format!("Fix or delete the config file. ({detail})"),
            severity: Severity::ActionRequired,
        },

        BildwerkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Bildwerk doesn't have permission to use that file.".into(),
                suggestion: "Check the file permissions or pick a different folder.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                severity: Severity::Transient,
            },
        },

        BildwerkError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Make sure it is valid JSON, or delete it to use the defaults.".into(),
            severity: Severity::ActionRequired,
        },
    }
}
