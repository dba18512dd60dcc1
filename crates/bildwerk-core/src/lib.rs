// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bildwerk — Core types, batch model, and error definitions shared across all crates.

pub mod batch;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod naming;
pub mod status;
pub mod types;

pub use batch::BatchCollection;
pub use config::PipelineConfig;
pub use error::BildwerkError;
pub use status::{StatusKind, StatusMessage};
pub use types::*;
