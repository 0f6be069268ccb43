// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Anchor faces and placement of relief solids

use super::{Anchor, ReliefMode};
use crate::mesh::{BoundingBox, Mesh};
use nalgebra::{Matrix4, Point3, Vector3};

/// Right-handed frame on a bounding-box face: `u` reads left to right,
/// `v` bottom to top, `normal` points out of the part
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceFrame {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl FaceFrame {
    /// Frame of `anchor` on `bounds`, origin at the face center
    pub fn on(bounds: &BoundingBox, anchor: Anchor) -> Self {
        let c = bounds.center();
        let (x, y, z) = (Vector3::x(), Vector3::y(), Vector3::z());
        let (origin, u, v, normal) = match anchor {
            Anchor::Top => (Point3::new(c.x, c.y, bounds.max.z), x, y, z),
            Anchor::Bottom => (Point3::new(c.x, c.y, bounds.min.z), x, -y, -z),
            Anchor::Front => (Point3::new(c.x, bounds.min.y, c.z), x, z, -y),
            Anchor::Back => (Point3::new(c.x, bounds.max.y, c.z), -x, z, y),
            Anchor::Left => (Point3::new(bounds.min.x, c.y, c.z), -y, z, -x),
            Anchor::Right => (Point3::new(bounds.max.x, c.y, c.z), y, z, x),
        };
        Self { origin, u, v, normal }
    }

    /// Map local (x, y, z) to `origin + x u + y v + z normal`
    pub fn to_world(&self) -> Matrix4<f64> {
        let (u, v, n, o) = (self.u, self.v, self.normal, self.origin);
        Matrix4::new(
            u.x, v.x, n.x, o.x, //
            u.y, v.y, n.y, o.y, //
            u.z, v.z, n.z, o.z, //
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

/// Local height of the center of a relief solid above its face
///
/// Emboss sits outward and sinks `clearance` into the part; engrave sits
/// inward and pokes `clearance` out of it.
pub fn normal_offset(mode: ReliefMode, n: f64, depth: f64, clearance: f64) -> f64 {
    match mode {
        ReliefMode::Emboss => n + depth / 2.0 - clearance,
        ReliefMode::Engrave => n - depth / 2.0 + clearance,
    }
}

/// Move a relief solid, centered on the local origin with z in
/// [-depth/2, depth/2], onto its anchor face
pub fn place(solid: &Mesh, frame: &FaceFrame, offset: [f64; 3], mode: ReliefMode, depth: f64, clearance: f64) -> Mesh {
    let [du, dv, dn] = offset;
    let local = Matrix4::new_translation(&Vector3::new(du, dv, normal_offset(mode, dn, depth, clearance)));
    solid.transformed(&(frame.to_world() * local))
}
