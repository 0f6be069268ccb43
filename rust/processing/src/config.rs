// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration loaded from environment variables.

use partforge_geometry::GeometrySettings;
use std::path::PathBuf;
use std::str::FromStr;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Number of worker threads for batch generation.
    pub worker_threads: usize,
    /// Polygon sections for cylinders and arcs.
    pub cylinder_sections: usize,
    /// Vertex weld distance in mm.
    pub weld_epsilon: f64,
    /// Largest boundary loop closed during repair.
    pub max_gap_edges: usize,
    /// Replace meshes that stay open by their convex hull.
    pub hull_fallback: bool,
    /// Polygon budget for the BSP boolean kernel.
    pub max_csg_polygons: usize,
    /// Default font file for text reliefs.
    pub font: Option<PathBuf>,
    /// Overlap applied to text solids in mm.
    pub text_clearance: f64,
    /// Emit logs as JSON lines.
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = GeometrySettings::default();
        Self {
            worker_threads: parsed(&lookup, "PARTFORGE_WORKER_THREADS", num_cpus::get()).max(1),
            cylinder_sections: parsed(&lookup, "PARTFORGE_CYLINDER_SECTIONS", defaults.cylinder_sections).max(8),
            weld_epsilon: positive(parsed(&lookup, "PARTFORGE_WELD_EPSILON", defaults.weld_epsilon), defaults.weld_epsilon),
            max_gap_edges: parsed(&lookup, "PARTFORGE_MAX_GAP_EDGES", defaults.max_gap_edges),
            hull_fallback: lookup("PARTFORGE_HULL_FALLBACK")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.hull_fallback),
            max_csg_polygons: parsed(&lookup, "PARTFORGE_MAX_CSG_POLYGONS", defaults.max_csg_polygons),
            font: lookup("PARTFORGE_FONT")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            text_clearance: parsed(&lookup, "PARTFORGE_TEXT_CLEARANCE", defaults.text_clearance).max(0.0),
            log_json: lookup("PARTFORGE_LOG_JSON")
                .and_then(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Geometry settings derived from this configuration.
    pub fn geometry_settings(&self) -> GeometrySettings {
        GeometrySettings {
            cylinder_sections: self.cylinder_sections,
            weld_epsilon: self.weld_epsilon,
            max_gap_edges: self.max_gap_edges,
            hull_fallback: self.hull_fallback,
            max_csg_polygons: self.max_csg_polygons,
            text_clearance: self.text_clearance,
            default_font: self.font.clone(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn positive(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

/// Parse the usual spellings of a boolean switch
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
