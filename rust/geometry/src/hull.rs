// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 3D convex hull (QuickHull)
//!
//! 1. Weld duplicate points and pick an initial tetrahedron from the extremes
//! 2. Assign every remaining point to one face it lies outside of
//! 3. Repeatedly take the farthest outside point of some face, remove the
//!    faces it sees and cone the horizon to it
//! 4. Stop when no face has outside points

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::repair::VertexWelder;
use nalgebra::{Point3, Vector3};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
struct HullFace {
    vertices: [usize; 3],
    normal: Vector3<f64>,
    offset: f64,
    outside: Vec<usize>,
}

impl HullFace {
    fn new(v0: usize, v1: usize, v2: usize, points: &[Point3<f64>]) -> Self {
        let normal = (points[v1] - points[v0])
            .cross(&(points[v2] - points[v0]))
            .try_normalize(1e-18)
            .unwrap_or_else(Vector3::zeros);
        Self {
            vertices: [v0, v1, v2],
            offset: normal.dot(&points[v0].coords),
            normal,
            outside: Vec::new(),
        }
    }

    #[inline]
    fn distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn farthest(&self, points: &[Point3<f64>]) -> Option<usize> {
        self.outside.iter().copied().max_by(|&a, &b| {
            self.distance(&points[a])
                .partial_cmp(&self.distance(&points[b]))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Convex hull of a point cloud as a closed, outward-wound mesh
///
/// Fails when fewer than four distinct, non-coplanar points are given.
pub fn convex_hull(points: &[Point3<f64>]) -> Result<Mesh> {
    let mut extent = 0.0f64;
    for p in points {
        if !p.coords.iter().all(|c| c.is_finite()) {
            return Err(Error::kernel("hull", "non-finite input point"));
        }
        extent = extent.max(p.coords.amax());
    }
    let eps = 1e-9 * extent.max(1.0);

    let mut welder = VertexWelder::new(eps);
    for p in points {
        welder.insert(*p);
    }
    let unique: Vec<Point3<f64>> = (0..welder.len() as u32).map(|i| welder.position(i)).collect();
    if unique.len() < 4 {
        return Err(Error::kernel("hull", "needs at least 4 distinct points"));
    }

    let mut faces = initial_simplex(&unique, eps)?;
    iterate(&mut faces, &unique, eps);
    Ok(faces_to_mesh(&faces, &unique))
}

fn initial_simplex(points: &[Point3<f64>], eps: f64) -> Result<Vec<HullFace>> {
    let mut extremes = [0usize; 6];
    for (i, p) in points.iter().enumerate() {
        for axis in 0..3 {
            if p[axis] < points[extremes[2 * axis]][axis] {
                extremes[2 * axis] = i;
            }
            if p[axis] > points[extremes[2 * axis + 1]][axis] {
                extremes[2 * axis + 1] = i;
            }
        }
    }

    let mut best = (extremes[0], extremes[1], 0.0);
    for (i, &a) in extremes.iter().enumerate() {
        for &b in &extremes[i + 1..] {
            let d = (points[a] - points[b]).norm_squared();
            if d > best.2 {
                best = (a, b, d);
            }
        }
    }
    let (p0, p1, _) = best;

    let dir = (points[p1] - points[p0])
        .try_normalize(1e-18)
        .ok_or_else(|| Error::kernel("hull", "all points coincide"))?;
    let p2 = farthest_by(points, &[p0, p1], |p| {
        let v = p - points[p0];
        (v - dir * v.dot(&dir)).norm()
    })
    .filter(|&(_, d)| d > eps)
    .map(|(i, _)| i)
    .ok_or_else(|| Error::kernel("hull", "all points are collinear"))?;

    let normal = (points[p1] - points[p0])
        .cross(&(points[p2] - points[p0]))
        .normalize();
    let p3 = farthest_by(points, &[p0, p1, p2], |p| normal.dot(&(p - points[p0])).abs())
        .filter(|&(_, d)| d > eps)
        .map(|(i, _)| i)
        .ok_or_else(|| Error::kernel("hull", "all points are coplanar"))?;

    // Orient so p3 is behind the base face
    let (p1, p2) = if normal.dot(&(points[p3] - points[p0])) > 0.0 {
        (p2, p1)
    } else {
        (p1, p2)
    };

    let mut faces = vec![
        HullFace::new(p0, p1, p2, points),
        HullFace::new(p0, p3, p1, points),
        HullFace::new(p1, p3, p2, points),
        HullFace::new(p2, p3, p0, points),
    ];

    let used = [p0, p1, p2, p3];
    let rest: Vec<usize> = (0..points.len()).filter(|i| !used.contains(i)).collect();
    assign(&mut faces, 0, &rest, points, eps);
    Ok(faces)
}

fn farthest_by(
    points: &[Point3<f64>],
    skip: &[usize],
    metric: impl Fn(&Point3<f64>) -> f64,
) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| !skip.contains(i))
        .map(|(i, p)| (i, metric(p)))
        .fold(None, |best, (i, d)| match best {
            Some((_, bd)) if bd >= d => best,
            _ => Some((i, d)),
        })
}

/// Give each point to the first face (from `first_face` on) it lies outside
fn assign(faces: &mut [HullFace], first_face: usize, candidates: &[usize], points: &[Point3<f64>], eps: f64) {
    for &idx in candidates {
        let p = &points[idx];
        if let Some(face) = faces[first_face..].iter_mut().find(|f| f.distance(p) > eps) {
            face.outside.push(idx);
        }
    }
}

fn iterate(faces: &mut Vec<HullFace>, points: &[Point3<f64>], eps: f64) {
    // Each round turns one point into a hull vertex
    for _ in 0..points.len() {
        let Some(apex) = faces
            .iter()
            .find(|f| !f.outside.is_empty())
            .and_then(|f| f.farthest(points))
        else {
            break;
        };
        let apex_point = points[apex];

        let (visible, kept): (Vec<HullFace>, Vec<HullFace>) = std::mem::take(faces)
            .into_iter()
            .partition(|f| f.distance(&apex_point) > eps);
        *faces = kept;

        // Horizon: directed edges of visible faces whose twin is not visible
        let mut edges: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        for face in &visible {
            let [a, b, c] = face.vertices;
            for edge in [(a, b), (b, c), (c, a)] {
                *edges.entry(edge).or_insert(0) += 1;
            }
        }
        let mut orphans = Vec::new();
        let first_new = faces.len();
        for face in &visible {
            let [a, b, c] = face.vertices;
            for (u, v) in [(a, b), (b, c), (c, a)] {
                if !edges.contains_key(&(v, u)) {
                    faces.push(HullFace::new(u, v, apex, points));
                }
            }
            orphans.extend(face.outside.iter().copied().filter(|&i| i != apex));
        }

        assign(faces, first_new, &orphans, points, eps);
    }
}

fn faces_to_mesh(faces: &[HullFace], points: &[Point3<f64>]) -> Mesh {
    let mut remap: FxHashMap<usize, u32> = FxHashMap::default();
    let mut mesh = Mesh::with_capacity(faces.len() / 2 + 2, faces.len() * 3);
    for face in faces {
        let mut tri = [0u32; 3];
        for (k, &v) in face.vertices.iter().enumerate() {
            tri[k] = *remap.entry(v).or_insert_with(|| mesh.add_vertex(points[v]));
        }
        mesh.add_triangle(tri[0], tri[1], tri[2]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cylinder;
    use crate::repair::is_watertight;
    use approx::assert_relative_eq;

    fn cube_points() -> Vec<Point3<f64>> {
        let mut points = Vec::new();
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    points.push(Point3::new(x, y, z));
                }
            }
        }
        points
    }

    #[test]
    fn test_hull_tetrahedron() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let mesh = convex_hull(&points).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 4);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_hull_cube_ignores_interior_points() {
        let mut points = cube_points();
        points.push(Point3::new(0.5, 0.5, 0.5));
        points.push(Point3::new(0.25, 0.75, 0.5));

        let mesh = convex_hull(&points).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(is_watertight(&mesh));
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_hull_of_cylinder_is_closed() {
        let rod = cylinder(3.0, 4.0, 16);
        let points: Vec<Point3<f64>> = rod.vertices().collect();
        let hull = convex_hull(&points).unwrap();
        assert!(is_watertight(&hull));
        assert_relative_eq!(hull.signed_volume(), rod.signed_volume(), epsilon = 1e-6);
    }

    #[test]
    fn test_hull_rejects_degenerate_input() {
        let flat = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(convex_hull(&flat).is_err());
        assert!(convex_hull(&flat[..3]).is_err());
    }
}
