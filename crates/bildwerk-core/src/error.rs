// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bildwerk.

use thiserror::Error;

/// Top-level error type for all Bildwerk operations.
#[derive(Debug, Error)]
pub enum BildwerkError {
    // -- Batch errors --
    #[error("batch capacity exceeded: {current} queued + {incoming} new > {capacity}")]
    CapacityExceeded {
        current: usize,
        incoming: usize,
        capacity: usize,
    },

    #[error("index {index} out of range for batch of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("batch is empty")]
    EmptyBatch,

    #[error("no image selected")]
    NoImageSelected,

    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),

    // -- Image errors --
    #[error("failed to decode {name}: {detail}")]
    DecodeFailure { name: String, detail: String },

    #[error("image encoding failed: {0}")]
    EncodeFailure(String),

    #[error("compression failed: {0}")]
    CompressionFailure(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("quality {0} is outside 0.0..=1.0")]
    InvalidQuality(f32),

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BildwerkError {
    /// Shorthand for a [`BildwerkError::DecodeFailure`] naming the offending file.
    pub fn decode(name: impl Into<String>, detail: impl std::fmt::Display) -> Self {
        Self::DecodeFailure {
            name: name.into(),
            detail: detail.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BildwerkError>;
