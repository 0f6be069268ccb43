// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur inside geometry construction.
///
/// None of these cross the pipeline boundary: builders turn them into
/// fallbacks and diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Empty mesh: {0}")]
    EmptyMesh(String),

    #[error("Boolean kernel {kernel} failed: {reason}")]
    Kernel { kernel: &'static str, reason: String },

    #[error("Font error: {0}")]
    Font(String),
}

impl Error {
    pub(crate) fn kernel(kernel: &'static str, reason: impl Into<String>) -> Self {
        Self::Kernel {
            kernel,
            reason: reason.into(),
        }
    }
}
