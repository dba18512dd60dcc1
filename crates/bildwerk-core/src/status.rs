// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Terminal status messages. Every user action ends in exactly one of these.

use crate::error::BildwerkError;
use crate::human_errors::{HumanError, humanize_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// One user-visible outcome line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    /// Plain-language message for a failed operation.
    pub fn from_error(err: &BildwerkError) -> Self {
        Self::from_human(&humanize_error(err))
    }

    /// Status line for an already humanised error.
    pub fn from_human(human: &HumanError) -> Self {
        Self::error(format!("{} {}", human.message, human.suggestion))
    }

    pub fn is_success(&self) -> bool {
        self.kind == StatusKind::Success
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Render a byte count as `Bytes`/`KB`/`MB`/`GB` (base 1024), with at most two
/// decimals and no trailing zeros: `1536` → `"1.5 KB"`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let fixed = format!("{value:.2}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}
