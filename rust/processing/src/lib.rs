// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # PartForge Processing
//!
//! Turns a model id plus loosely typed parameters into a repaired,
//! printable triangle mesh.
//!
//! ## Overview
//!
//! - **Registry**: immutable catalogue of part builders with declared defaults
//! - **Parameters**: lenient merging of request values over those defaults
//! - **Pipeline**: build, drill, relief, repair; failures degrade, never abort
//! - **Worker pool**: rayon pool for batch generation
//!
//! ## Example
//!
//! ```rust,no_run
//! use partforge_processing::{generate, ParamSet, ParamValue};
//!
//! let mut params = ParamSet::new();
//! params.insert("width".into(), ParamValue::Number(180.0));
//! params.insert("thickness".into(), ParamValue::Number(6.0));
//!
//! let part = generate("vesa_adapter", &params, &[], &[])?;
//! println!("{} triangles, {} notes", part.mesh.triangle_count(), part.diagnostics.len());
//! # Ok::<(), partforge_processing::Error>(())
//! ```

pub mod cache_key;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod params;
pub mod pipeline;
pub mod pool;
pub mod registry;
pub mod request;

pub use cache_key::request_key;
pub use config::Config;
pub use error::{Error, Result};
pub use params::{ParamKind, ParamSet, ParamSpec, ParamValue, ResolvedParams};
pub use pipeline::{generate, BuildContext, Diagnostic, Generated, Generator};
pub use pool::WorkerPool;
pub use registry::{normalize_id, Builder, ModelEntry, ModelRegistry};
pub use request::{GenerateRequest, HoleRequest, TextRequest};
