// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive Factory
//!
//! Boxes, cylinders, rounded plates and polygon extrusions. Every
//! primitive is centered on the origin unless stated otherwise, and never
//! fails: dimensions that are negative, zero or not finite are clamped to
//! [`MIN_DIMENSION`].

use crate::extrusion::extrude_profile;
use crate::mesh::Mesh;
use crate::profile::{create_circle, create_rectangle, create_rounded_rectangle, quarter_arc_segments, Profile2D};
use nalgebra::{Matrix4, Point3, Rotation3, Vector3};
use std::f64::consts::FRAC_PI_2;

/// Smallest dimension a primitive is built with (mm)
pub const MIN_DIMENSION: f64 = 0.1;

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

impl Axis {
    /// Index into xyz triples
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along the axis
    #[inline]
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::x(),
            Axis::Y => Vector3::y(),
            Axis::Z => Vector3::z(),
        }
    }

    /// Rotation taking the local Z axis onto this axis
    pub fn rotation_from_z(self) -> Rotation3<f64> {
        match self {
            Axis::X => Rotation3::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
            Axis::Y => Rotation3::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2),
            Axis::Z => Rotation3::identity(),
        }
    }
}

/// Clamp a length to a finite value of at least [`MIN_DIMENSION`]
#[inline]
pub fn clamp_dimension(value: f64) -> f64 {
    if value.is_finite() {
        value.max(MIN_DIMENSION)
    } else {
        MIN_DIMENSION
    }
}

/// Clamp a corner radius to a quarter of the smaller planar dimension
#[inline]
pub fn clamp_corner_radius(length: f64, width: f64, radius: f64) -> f64 {
    if !radius.is_finite() || radius <= 0.0 {
        return 0.0;
    }
    radius.min(length.min(width) / 4.0)
}

/// Axis-aligned box centered at the origin
pub fn box_mesh(length: f64, width: f64, height: f64) -> Mesh {
    let (l, w, h) = (clamp_dimension(length), clamp_dimension(width), clamp_dimension(height));
    centered_extrusion(&create_rectangle(l, w), h).unwrap_or_else(|| raw_box(l, w, h))
}

/// Axis-aligned box spanning `min`..`max`
pub fn box_between(min: Point3<f64>, max: Point3<f64>) -> Mesh {
    let size = max - min;
    let center = nalgebra::center(&min, &max);
    box_mesh(size.x, size.y, size.z).translated(center.coords)
}

/// Cylinder centered at the origin with its axis along Z
pub fn cylinder(radius: f64, height: f64, sections: usize) -> Mesh {
    let (r, h) = (clamp_dimension(radius), clamp_dimension(height));
    centered_extrusion(&create_circle(r, None, sections.max(3)), h)
        .unwrap_or_else(|| raw_box(2.0 * r, 2.0 * r, h))
}

/// Cylinder centered at the origin with its axis along `axis`
pub fn cylinder_along(radius: f64, height: f64, sections: usize, axis: Axis) -> Mesh {
    let mesh = cylinder(radius, height, sections);
    match axis {
        Axis::Z => mesh,
        _ => mesh.rotated(&axis.rotation_from_z()),
    }
}

/// Plate of the given thickness (along Z) with rounded vertical corners
///
/// Falls back to a plain box when the radius is not positive or the
/// outline cannot be built.
pub fn rounded_plate(length: f64, width: f64, thickness: f64, corner_radius: f64, sections: usize) -> Mesh {
    let (l, w, t) = (clamp_dimension(length), clamp_dimension(width), clamp_dimension(thickness));
    let radius = clamp_corner_radius(l, w, corner_radius);
    if radius <= 1e-9 {
        return box_mesh(l, w, t);
    }

    let outline = create_rounded_rectangle(l, w, radius, quarter_arc_segments(sections));
    if !outline.is_valid() {
        return box_mesh(l, w, t);
    }
    centered_extrusion(&outline, t).unwrap_or_else(|| box_mesh(l, w, t))
}

/// Extrude a polygon profile along Z, z in [0, height]
///
/// Invalid profiles yield an empty mesh.
pub fn extrude_polygon(profile: &Profile2D, height: f64) -> Mesh {
    match extrude_profile(profile, clamp_dimension(height), None) {
        Ok(mesh) => mesh,
        Err(e) => {
            tracing::debug!(error = %e, "Polygon extrusion skipped");
            Mesh::new()
        }
    }
}

/// Extrude a profile along `axis`, covering [start, start + length] on it
///
/// Profile coordinates map cyclically: (y, z) for X, (z, x) for Y and
/// (x, y) for Z.
pub fn prism_along(profile: &Profile2D, axis: Axis, start: f64, length: f64) -> Mesh {
    let mesh = extrude_polygon(profile, length);
    let cyclic = match axis {
        Axis::X => Matrix4::new(
            0.0, 0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ),
        Axis::Y => Matrix4::new(
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ),
        Axis::Z => Matrix4::identity(),
    };
    mesh.transformed(&(Matrix4::new_translation(&(axis.unit() * start)) * cyclic))
}

fn centered_extrusion(profile: &Profile2D, height: f64) -> Option<Mesh> {
    let lift = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -height / 2.0));
    match extrude_profile(profile, height, Some(lift)) {
        Ok(mesh) => Some(mesh),
        Err(e) => {
            tracing::debug!(error = %e, "Extrusion failed, using box");
            None
        }
    }
}

/// Box built directly from its corners, used when triangulation fails
fn raw_box(length: f64, width: f64, height: f64) -> Mesh {
    let (hx, hy, hz) = (length / 2.0, width / 2.0, height / 2.0);
    let mut mesh = Mesh::with_capacity(8, 36);
    for z in [-hz, hz] {
        for (x, y) in [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)] {
            mesh.add_vertex(Point3::new(x, y, z));
        }
    }
    const FACES: [[u32; 3]; 12] = [
        [0, 2, 1], [0, 3, 2], // bottom
        [4, 5, 6], [4, 6, 7], // top
        [0, 1, 5], [0, 5, 4], // front
        [1, 2, 6], [1, 6, 5], // right
        [2, 3, 7], [2, 7, 6], // back
        [3, 0, 4], [3, 4, 7], // left
    ];
    for [a, b, c] in FACES {
        mesh.add_triangle(a, b, c);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repair::is_watertight;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_box_is_centered_and_closed() {
        let mesh = box_mesh(10.0, 20.0, 30.0);
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min.x, -5.0);
        assert_relative_eq!(bounds.max.y, 10.0);
        assert_relative_eq!(bounds.max.z, 15.0);
        assert_relative_eq!(mesh.signed_volume(), 6000.0, epsilon = 1e-6);
        assert!(is_watertight(&mesh));
    }

    #[test]
    fn test_raw_box_matches_extruded_box() {
        let raw = raw_box(2.0, 3.0, 4.0);
        assert_relative_eq!(raw.signed_volume(), 24.0, epsilon = 1e-9);
        assert!(is_watertight(&raw));
    }

    #[test]
    fn test_negative_dimensions_are_clamped() {
        let mesh = box_mesh(-5.0, f64::NAN, 0.0);
        let size = mesh.bounds().size();
        assert_relative_eq!(size.x, MIN_DIMENSION);
        assert_relative_eq!(size.y, MIN_DIMENSION);
        assert_relative_eq!(size.z, MIN_DIMENSION);
    }

    #[test]
    fn test_cylinder_sections_control_resolution() {
        let coarse = cylinder(5.0, 10.0, 8);
        let fine = cylinder(5.0, 10.0, 64);
        assert!(fine.triangle_count() > coarse.triangle_count());
        assert!(is_watertight(&fine));
        assert_relative_eq!(fine.bounds().max.z, 5.0);
        assert!(fine.signed_volume() < PI * 25.0 * 10.0);
        assert!(fine.signed_volume() > coarse.signed_volume());
    }

    #[test]
    fn test_cylinder_along_x() {
        let mesh = cylinder_along(1.0, 10.0, 16, Axis::X);
        let size = mesh.bounds().size();
        assert_relative_eq!(size.x, 10.0, epsilon = 1e-9);
        assert!(size.y <= 2.0 + 1e-9);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_rounded_plate_keeps_bounding_box() {
        let plate = rounded_plate(100.0, 60.0, 5.0, 8.0, 48);
        let size = plate.bounds().size();
        assert_relative_eq!(size.x, 100.0, epsilon = 1e-9);
        assert_relative_eq!(size.y, 60.0, epsilon = 1e-9);
        assert_relative_eq!(size.z, 5.0, epsilon = 1e-9);
        assert!(plate.signed_volume() < 100.0 * 60.0 * 5.0);
        assert!(is_watertight(&plate));
    }

    #[test]
    fn test_rounded_plate_oversized_radius_is_clamped() {
        let plate = rounded_plate(40.0, 20.0, 3.0, 500.0, 32);
        let size = plate.bounds().size();
        assert_relative_eq!(size.x, 40.0, epsilon = 1e-9);
        assert_relative_eq!(size.y, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rounded_plate_zero_radius_is_box() {
        let plate = rounded_plate(40.0, 20.0, 3.0, 0.0, 32);
        assert_eq!(plate.triangle_count(), 12);
    }

    #[test]
    fn test_prism_along_x_maps_profile_to_yz() {
        let profile = create_rectangle(2.0, 4.0);
        let prism = prism_along(&profile, Axis::X, -5.0, 10.0);
        let bounds = prism.bounds();
        assert_relative_eq!(bounds.min.x, -5.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.max.x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.size().y, 2.0, epsilon = 1e-9);
        assert_relative_eq!(bounds.size().z, 4.0, epsilon = 1e-9);
        assert!(prism.signed_volume() > 0.0);
    }
}
