// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to 3D meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use crate::triangulation::triangle_area_2d;
use nalgebra::{Matrix4, Point3};

/// Extrude a 2D profile along the Z axis, z in [0, depth]
///
/// Cap and wall vertices are shared, so a valid profile yields a closed,
/// outward-wound mesh.
#[inline]
pub fn extrude_profile(
    profile: &Profile2D,
    depth: f64,
    transform: Option<Matrix4<f64>>,
) -> Result<Mesh> {
    if !(depth > 0.0) || !depth.is_finite() {
        return Err(Error::InvalidExtrusion(format!(
            "Depth must be positive, got {}",
            depth
        )));
    }
    if !profile.is_valid() {
        return Err(Error::InvalidProfile(
            "Outer boundary encloses no area".to_string(),
        ));
    }

    let profile = profile.normalized();
    let triangulation = profile.triangulate()?;
    let ring_len = triangulation.points.len() as u32;

    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2,
        triangulation.indices.len() * 2 + triangulation.points.len() * 6,
    );

    // Bottom ring [0, n), top ring [n, 2n), same order as the triangulation
    for p in &triangulation.points {
        mesh.add_vertex(Point3::new(p.x, p.y, 0.0));
    }
    for p in &triangulation.points {
        mesh.add_vertex(Point3::new(p.x, p.y, depth));
    }

    create_caps(&triangulation, ring_len, &mut mesh);

    // Walls for the outer boundary and every hole, in triangulation order
    let mut start = 0u32;
    for contour_len in std::iter::once(profile.outer.len()).chain(profile.holes.iter().map(|h| h.len())) {
        create_side_walls(start, contour_len as u32, ring_len, &mut mesh);
        start += contour_len as u32;
    }

    Ok(match transform {
        Some(mat) => mesh.transformed(&mat),
        None => mesh,
    })
}

/// Add bottom (facing -Z) and top (facing +Z) caps
fn create_caps(triangulation: &Triangulation, ring_len: u32, mesh: &mut Mesh) {
    for tri in triangulation.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0], tri[1], tri[2]);
        let area = triangle_area_2d(
            &triangulation.points[a],
            &triangulation.points[b],
            &triangulation.points[c],
        );
        if area.abs() < 1e-14 {
            continue;
        }
        // Counter-clockwise in the XY plane faces +Z
        let (a, b, c) = if area > 0.0 { (a, b, c) } else { (a, c, b) };
        let (a, b, c) = (a as u32, b as u32, c as u32);

        mesh.add_triangle(a, c, b);
        mesh.add_triangle(a + ring_len, b + ring_len, c + ring_len);
    }
}

/// Add wall quads along one contour occupying ring indices
/// [start, start + len)
///
/// Outer contours are counter-clockwise and holes clockwise, so the same
/// winding faces outward from the solid in both cases.
fn create_side_walls(start: u32, len: u32, ring_len: u32, mesh: &mut Mesh) {
    for i in 0..len {
        let b0 = start + i;
        let b1 = start + (i + 1) % len;
        let t0 = b0 + ring_len;
        let t1 = b1 + ring_len;

        mesh.add_triangle(b0, b1, t1);
        mesh.add_triangle(b0, t1, t0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{create_circle, create_rectangle};
    use crate::repair::is_watertight;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    #[test]
    fn test_extrude_rectangle() {
        let mesh = extrude_profile(&create_rectangle(10.0, 5.0), 20.0, None).unwrap();

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.signed_volume(), 1000.0, epsilon = 1e-9);

        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min.z, 0.0);
        assert_relative_eq!(bounds.max.z, 20.0);
        assert!(is_watertight(&mesh));
    }

    #[test]
    fn test_extrude_clockwise_input_is_normalized() {
        let mut profile = create_rectangle(2.0, 2.0);
        profile.outer.reverse();
        let mesh = extrude_profile(&profile, 1.0, None).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_extrude_with_hole() {
        let profile = create_circle(10.0, Some(5.0), 32);
        let mesh = extrude_profile(&profile, 2.0, None).unwrap();
        assert!(is_watertight(&mesh));

        // Polygonal annulus area times depth
        let ring = |r: f64| 0.5 * 32.0 * r * r * (2.0 * std::f64::consts::PI / 32.0).sin();
        assert_relative_eq!(mesh.signed_volume(), 2.0 * (ring(10.0) - ring(5.0)), epsilon = 1e-6);
    }

    #[test]
    fn test_extrude_with_transform() {
        let transform = Matrix4::new_translation(&Vector3::new(0.0, 0.0, -1.0));
        let mesh = extrude_profile(&create_rectangle(1.0, 1.0), 2.0, Some(transform)).unwrap();
        assert_relative_eq!(mesh.bounds().min.z, -1.0);
        assert_relative_eq!(mesh.bounds().max.z, 1.0);
    }

    #[test]
    fn test_extrude_rejects_zero_depth() {
        assert!(extrude_profile(&create_rectangle(1.0, 1.0), 0.0, None).is_err());
    }
}
