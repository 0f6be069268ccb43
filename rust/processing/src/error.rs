// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of the generation pipeline.
///
/// Geometry trouble never shows up here; it degrades the mesh and is
/// reported through diagnostics instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Model '{id}' not found. Available: {}", .available.join(", "))]
    UnknownModel { id: String, available: Vec<String> },

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
