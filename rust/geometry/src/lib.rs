// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PartForge Geometry
//!
//! Solid-modeling building blocks for parametric printable parts: mesh
//! primitives, booleans over an ordered list of kernels with graceful
//! fallbacks, hole drilling, edge rounding, text relief and mesh repair.
//!
//! Operations that can degrade return [`Outcome`]: `Ok` with the requested
//! mesh, or [`Degraded`] carrying a usable fallback mesh and a report.
//!
//! ```
//! use partforge_geometry::{box_mesh, BooleanEngine, GeometrySettings, HoleSpec, Axis, drill_holes};
//!
//! let settings = GeometrySettings::default();
//! let engine = BooleanEngine::new(&settings);
//! let plate = box_mesh(80.0, 40.0, 4.0);
//! let holes = [HoleSpec::new(5.0, Axis::Z)];
//! let drilled = drill_holes(&engine, &plate, &holes, &settings).unwrap_or_else(|d| d.mesh);
//! assert!(drilled.signed_volume() < plate.signed_volume());
//! ```

pub mod bool2d;
pub mod boolean;
pub mod csg;
pub mod diagnostics;
pub mod error;
pub mod extrusion;
pub mod holes;
pub mod hull;
pub mod mesh;
pub mod primitives;
pub mod profile;
pub mod repair;
pub mod rounding;
pub mod settings;
pub mod text;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use boolean::{BooleanEngine, BooleanKernel, BooleanOp, ClippingKernel, CsgrsKernel};
pub use diagnostics::{Degraded, DegradedGeometry, Diagnostics, Outcome, Stage};
pub use error::{Error, Result};
pub use extrusion::extrude_profile;
pub use holes::{cut_box, drill_holes, HoleSpec};
pub use hull::convex_hull;
pub use mesh::{BoundingBox, Mesh};
pub use primitives::{
    box_between, box_mesh, cylinder, cylinder_along, extrude_polygon, prism_along, rounded_plate, Axis,
    MIN_DIMENSION,
};
pub use profile::Profile2D;
pub use repair::{close_small_gaps, connected_components, is_watertight, open_edge_count, repair, weld_vertices};
pub use rounding::{clamp_radius, round_top_edges, rounded_box, rounded_shell};
pub use settings::GeometrySettings;
pub use text::{apply_text_op, apply_text_ops, Anchor, FontProvider, ReliefMode, SystemFontProvider, TextOp};
pub use triangulation::triangulate_polygon;
