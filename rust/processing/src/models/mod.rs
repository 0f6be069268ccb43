// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model catalogue
//!
//! All parts are built Z-up with the print bed at z = 0 unless a plate is
//! symmetric, in which case it stays centered on the origin. Lengths are
//! millimetres.

mod enclosures;
mod mounts;
mod plates;
mod stands;

use crate::registry::ModelEntry;
use partforge_geometry::{box_between, prism_along, Axis, Mesh, Point2, Point3, Profile2D, Vector3};

/// Every built-in model
pub fn catalogue() -> Vec<ModelEntry> {
    let mut entries = Vec::with_capacity(21);
    entries.extend(plates::entries());
    entries.extend(enclosures::entries());
    entries.extend(stands::entries());
    entries.extend(mounts::entries());
    entries
}

/// Axis-aligned block between two corners, in any order
pub(crate) fn block(a: [f64; 3], b: [f64; 3]) -> Mesh {
    box_between(
        Point3::new(a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])),
        Point3::new(a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])),
    )
}

/// Polygon in a side plane extruded along `axis` over [start, start + length]
///
/// Points are given in the cyclic profile plane of `axis`: (y, z) for X and
/// (z, x) for Y.
pub(crate) fn side_prism(points: &[[f64; 2]], axis: Axis, start: f64, length: f64) -> Mesh {
    let outline = points.iter().map(|p| Point2::new(p[0], p[1])).collect();
    prism_along(&Profile2D::new(outline), axis, start, length)
}

/// Translate a mesh so it rests on z = 0
pub(crate) fn on_bed(mesh: Mesh) -> Mesh {
    if mesh.is_empty() {
        return mesh;
    }
    let lift = -mesh.bounds().min.z;
    mesh.translated(Vector3::new(0.0, 0.0, lift))
}
