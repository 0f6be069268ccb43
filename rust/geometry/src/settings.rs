// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Numeric tolerances and resolution knobs shared by the geometry stages

use std::path::PathBuf;

/// Geometry settings
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySettings {
    /// Polygon sections used for cylinders and arcs
    pub cylinder_sections: usize,
    /// Vertex weld distance (mm)
    pub weld_epsilon: f64,
    /// Largest boundary loop (in edges) that gap closing will patch
    pub max_gap_edges: usize,
    /// Replace meshes that stay open after repair by their convex hull
    pub hull_fallback: bool,
    /// Combined polygon count above which the BSP kernel is skipped
    pub max_csg_polygons: usize,
    /// Extra overlap applied to text solids to avoid coplanar faces (mm)
    pub text_clearance: f64,
    /// Font used when a text operation names none
    pub default_font: Option<PathBuf>,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            cylinder_sections: 48,
            weld_epsilon: 1e-6,
            max_gap_edges: 48,
            hull_fallback: false,
            max_csg_polygons: 60_000,
            text_clearance: 0.05,
            default_font: None,
        }
    }
}
