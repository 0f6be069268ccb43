// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CSG (Constructive Solid Geometry) Operations
//!
//! Triangle clipping against convex solids, planar cross-sections, and the
//! conversions to and from csgrs meshes.

use crate::bool2d::{overlay_profiles, profile_to_contours, FillRule, OverlayRule};
use crate::boolean::BooleanOp;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::Profile2D;
use crate::repair::{weld_vertices, VertexWelder};
use crate::triangulation::{
    calculate_polygon_normal, lift_to_3d, plane_basis, project_to_2d, project_to_2d_with_basis,
    triangle_area_2d, triangulate_polygon,
};
use nalgebra::{Point2, Point3, Vector3};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Plane definition for clipping
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// Point on the plane
    pub point: Point3<f64>,
    /// Normal vector (must be normalized)
    pub normal: Vector3<f64>,
}

impl Plane {
    /// Create a new plane
    pub fn new(point: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            point,
            normal: normal.normalize(),
        }
    }

    /// Calculate signed distance from point to plane
    /// Positive = in front, Negative = behind
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        (point - self.point).dot(&self.normal)
    }
}

/// Triangle definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        Self { v0, v1, v2 }
    }

    /// Un-normalized normal, twice the area in length
    #[inline]
    pub fn cross(&self) -> Vector3<f64> {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0))
    }

    /// Calculate triangle normal
    pub fn normal(&self) -> Vector3<f64> {
        self.cross().try_normalize(1e-18).unwrap_or_else(Vector3::zeros)
    }

    /// Calculate triangle area
    pub fn area(&self) -> f64 {
        self.cross().norm() * 0.5
    }

    #[inline]
    pub fn vertices(&self) -> [Point3<f64>; 3] {
        [self.v0, self.v1, self.v2]
    }

    pub fn flipped(&self) -> Triangle {
        Triangle::new(self.v0, self.v2, self.v1)
    }
}

/// One planar face of a convex solid
#[derive(Debug, Clone)]
pub struct ConvexFace {
    /// Outward plane of the face
    pub plane: Plane,
    /// Outward-wound triangles lying on the plane
    pub triangles: Vec<Triangle>,
}

/// Closed convex mesh as a set of outward face planes
#[derive(Debug, Clone)]
pub struct ConvexSolid {
    pub faces: Vec<ConvexFace>,
}

impl ConvexSolid {
    /// Recognize a closed convex mesh
    ///
    /// Triangles on the same plane are grouped into one face. Returns `None`
    /// when any vertex lies in front of any face plane, or the mesh encloses
    /// no volume. Inside-out meshes are read with flipped orientation.
    pub fn from_mesh(mesh: &Mesh, epsilon: f64) -> Option<Self> {
        if mesh.triangle_count() < 4 {
            return None;
        }
        let volume = mesh.signed_volume();
        if !volume.is_finite() || volume.abs() <= epsilon {
            return None;
        }
        let outward = volume > 0.0;
        let tolerance = epsilon * mesh.bounds().diagonal().max(1.0);

        let mut faces: Vec<ConvexFace> = Vec::new();
        for [a, b, c] in mesh.triangles() {
            let triangle = if outward {
                Triangle::new(a, b, c)
            } else {
                Triangle::new(a, c, b)
            };
            let Some(normal) = triangle.cross().try_normalize(1e-12) else {
                continue;
            };

            match faces.iter_mut().find(|f| {
                f.plane.normal.dot(&normal) > 1.0 - 1e-9
                    && f.plane.signed_distance(&a).abs() <= tolerance
            }) {
                Some(face) => face.triangles.push(triangle),
                None => faces.push(ConvexFace {
                    plane: Plane::new(a, normal),
                    triangles: vec![triangle],
                }),
            }
        }

        let convex = faces.len() >= 4
            && faces
                .iter()
                .all(|f| mesh.vertices().all(|p| f.plane.signed_distance(&p) <= tolerance));
        convex.then_some(ConvexSolid { faces })
    }
}

/// Pieces of a triangle classified against a convex solid
#[derive(Debug, Default)]
pub struct Classified {
    /// Outside the solid
    pub outside: Vec<Triangle>,
    /// Strictly inside the solid
    pub inside: Vec<Triangle>,
    /// On the solid's boundary, facing the same way as the face it lies on
    pub on_same: Vec<Triangle>,
    /// On the solid's boundary, facing against the face it lies on
    pub on_opposite: Vec<Triangle>,
}

/// CSG Clipping Processor
pub struct ClippingProcessor {
    /// Epsilon for floating point comparisons
    pub epsilon: f64,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
    On,
}

impl ClippingProcessor {
    /// Create a new clipping processor
    pub fn new() -> Self {
        Self { epsilon: 1e-6 }
    }

    #[inline]
    fn side(&self, distance: f64) -> Side {
        if distance > self.epsilon {
            Side::Front
        } else if distance < -self.epsilon {
            Side::Back
        } else {
            Side::On
        }
    }

    /// Keep the part of a convex polygon on or behind a plane
    ///
    /// Vertex order, and so winding, is preserved.
    pub fn clip_behind(&self, polygon: &[Point3<f64>], plane: &Plane) -> SmallVec<[Point3<f64>; 8]> {
        let distances: SmallVec<[f64; 8]> = polygon.iter().map(|p| plane.signed_distance(p)).collect();
        let mut kept = SmallVec::new();
        for i in 0..polygon.len() {
            let j = (i + 1) % polygon.len();
            let (si, sj) = (self.side(distances[i]), self.side(distances[j]));
            if si != Side::Front {
                kept.push(polygon[i]);
            }
            if matches!((si, sj), (Side::Front, Side::Back) | (Side::Back, Side::Front)) {
                kept.push(edge_crossing(polygon[i], distances[i], polygon[j], distances[j]));
            }
        }
        kept
    }

    /// Classify a triangle against a convex solid, appending its pieces
    ///
    /// The part inside the solid is the triangle clipped by every face
    /// plane; it is tagged as boundary when the triangle lies on one of the
    /// planes. The rest of the triangle is cut around that part in 2D, so
    /// new vertices only appear where the solid actually meets the
    /// triangle and neighbours sharing an edge get the same ones.
    pub fn classify(&self, triangle: &Triangle, solid: &ConvexSolid, out: &mut Classified) {
        let mut coplanar = None;
        for face in &solid.faces {
            let sides = triangle.vertices().map(|p| self.side(face.plane.signed_distance(&p)));
            if sides.iter().all(|s| *s == Side::On) {
                coplanar = Some(triangle.cross().dot(&face.plane.normal) > 0.0);
            } else if sides.iter().all(|s| *s != Side::Back) {
                out.outside.push(*triangle);
                return;
            }
        }

        let mut polygon: SmallVec<[Point3<f64>; 8]> = SmallVec::from_slice(&triangle.vertices());
        for face in &solid.faces {
            polygon = self.clip_behind(&polygon, &face.plane);
            if polygon.len() < 3 {
                out.outside.push(*triangle);
                return;
            }
        }

        let sliver = self.epsilon * self.epsilon;
        let inside = fan(&polygon);
        let inside_area: f64 = inside.iter().map(Triangle::area).sum();
        if inside_area <= sliver {
            out.outside.push(*triangle);
            return;
        }
        match coplanar {
            None => out.inside.extend(inside),
            Some(true) => out.on_same.extend(inside),
            Some(false) => out.on_opposite.extend(inside),
        }

        if triangle.area() - inside_area > sliver {
            self.cut_around(triangle, &polygon, &mut out.outside);
        }
    }

    /// Triangulate the part of `triangle` outside a convex polygon lying in
    /// its plane
    ///
    /// Output points within epsilon of an input point are snapped back onto
    /// it, so the 2D round trip does not move shared vertices.
    fn cut_around(&self, triangle: &Triangle, hole: &[Point3<f64>], out: &mut Vec<Triangle>) {
        let normal = triangle.normal();
        let origin = triangle.v0;
        let (u, v) = plane_basis(&normal);
        let outline = project_to_2d_with_basis(&triangle.vertices(), &u, &v, &origin);
        let cut = project_to_2d_with_basis(hole, &u, &v, &origin);

        let known: SmallVec<[Point3<f64>; 12]> = triangle.vertices().iter().chain(hole).copied().collect();
        let snap = |p: Point3<f64>| {
            known
                .iter()
                .copied()
                .find(|k| (k - p).norm() <= self.epsilon)
                .unwrap_or(p)
        };

        for piece in overlay_profiles(&[outline], &[cut], OverlayRule::Difference, FillRule::NonZero) {
            let triangulation = match piece.triangulate() {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping untriangulable outside piece");
                    continue;
                }
            };
            for tri in triangulation.indices.chunks_exact(3) {
                let [p, q, r] = [tri[0], tri[1], tri[2]]
                    .map(|i| snap(lift_to_3d(&triangulation.points[i], &u, &v, &origin)));
                let mut part = Triangle::new(p, q, r);
                if part.area() <= 1e-14 {
                    continue;
                }
                if part.cross().dot(&normal) < 0.0 {
                    part = part.flipped();
                }
                out.push(part);
            }
        }
    }

    /// Cross-section of a closed mesh by a plane, as contours in the
    /// plane's (u, v) coordinates relative to `origin`
    ///
    /// Vertices within epsilon of the plane count as above it when
    /// `touching_above` is set and as below otherwise, which gives the
    /// section just below or just above the plane. Contours wind
    /// counter-clockwise around the plane normal for material and clockwise
    /// for cavities. Chains that do not close are dropped.
    pub fn section(
        &self,
        mesh: &Mesh,
        plane: &Plane,
        touching_above: bool,
        basis: (&Vector3<f64>, &Vector3<f64>),
        origin: &Point3<f64>,
    ) -> Vec<Vec<Point2<f64>>> {
        let above = |d: f64| d > self.epsilon || (touching_above && d >= -self.epsilon);
        let mut welder = VertexWelder::new(self.epsilon);
        let mut edges: Vec<(u32, u32)> = Vec::new();

        for [a, b, c] in mesh.triangles() {
            let points = [a, b, c];
            let distances = points.map(|p| plane.signed_distance(&p));
            let sides = distances.map(|d| above(d));
            if sides.iter().all(|s| *s) || sides.iter().all(|s| !*s) {
                continue;
            }

            let mut entry = None;
            let mut exit = None;
            for i in 0..3 {
                let j = (i + 1) % 3;
                if sides[i] == sides[j] {
                    continue;
                }
                let x = snapped_crossing(points[i], distances[i], points[j], distances[j], self.epsilon);
                if sides[j] {
                    entry = Some(x);
                } else {
                    exit = Some(x);
                }
            }

            // Leaving the upper side then entering it runs along the
            // section boundary with material on the left
            if let (Some(from), Some(to)) = (exit, entry) {
                let from = welder.insert(from);
                let to = welder.insert(to);
                if from != to {
                    edges.push((from, to));
                }
            }
        }

        chain_loops(&edges)
            .into_iter()
            .map(|ring| {
                let points: Vec<Point3<f64>> = ring.iter().map(|&id| welder.position(id)).collect();
                project_to_2d_with_basis(&points, basis.0, basis.1, origin)
            })
            .collect()
    }

    /// Boolean of a closed mesh with a convex solid
    ///
    /// Pieces of `a` are kept by their classification; faces of `b` are
    /// trimmed against cross-sections of `a` taken on each face plane.
    pub fn boolean_convex(&self, a: &Mesh, b: &ConvexSolid, op: BooleanOp) -> Result<Mesh> {
        let mut classified = Classified::default();
        for [p0, p1, p2] in a.triangles() {
            let triangle = Triangle::new(p0, p1, p2);
            if triangle.area() <= self.epsilon * self.epsilon {
                continue;
            }
            self.classify(&triangle, b, &mut classified);
        }

        let mut result = Mesh::new();
        let kept: [&[Triangle]; 2] = match op {
            BooleanOp::Difference => [classified.outside.as_slice(), classified.on_opposite.as_slice()],
            BooleanOp::Union => [classified.outside.as_slice(), classified.on_same.as_slice()],
            BooleanOp::Intersection => [classified.inside.as_slice(), classified.on_same.as_slice()],
        };
        for triangle in kept.into_iter().flatten() {
            result.push_triangle(triangle.v0, triangle.v1, triangle.v2);
        }

        for face in &b.faces {
            self.trim_face(a, face, op, &mut result)?;
        }

        if result.is_empty() {
            return Err(Error::kernel("clipping", "result is empty"));
        }
        Ok(weld_vertices(&result, self.epsilon))
    }

    /// Emit the part of a convex face that the operation keeps
    fn trim_face(&self, a: &Mesh, face: &ConvexFace, op: BooleanOp, out: &mut Mesh) -> Result<()> {
        let normal = face.plane.normal;
        let origin = face.plane.point;
        let (u, v) = plane_basis(&normal);

        let polygon: Vec<Vec<Point2<f64>>> = face
            .triangles
            .iter()
            .map(|t| {
                let mut projected = project_to_2d_with_basis(&t.vertices(), &u, &v, &origin);
                if triangle_area_2d(&projected[0], &projected[1], &projected[2]) < 0.0 {
                    projected.reverse();
                }
                projected
            })
            .collect();

        let below = self.section(a, &face.plane, true, (&u, &v), &origin);
        let above = self.section(a, &face.plane, false, (&u, &v), &origin);

        let pieces = match op {
            BooleanOp::Union => {
                let material = contours_of(&overlay_profiles(&below, &above, OverlayRule::Union, FillRule::NonZero));
                overlay_profiles(&polygon, &material, OverlayRule::Difference, FillRule::NonZero)
            }
            BooleanOp::Difference | BooleanOp::Intersection => {
                let core = contours_of(&overlay_profiles(&below, &above, OverlayRule::Intersect, FillRule::NonZero));
                if core.is_empty() {
                    return Ok(());
                }
                overlay_profiles(&polygon, &core, OverlayRule::Intersect, FillRule::NonZero)
            }
        };

        let reversed = op == BooleanOp::Difference;
        for piece in pieces {
            let triangulation = match piece.triangulate() {
                Ok(t) => t,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping untriangulable face piece");
                    continue;
                }
            };
            for tri in triangulation.indices.chunks_exact(3) {
                let [p, q, r] = [tri[0], tri[1], tri[2]].map(|i| triangulation.points[i]);
                let area = triangle_area_2d(&p, &q, &r);
                if area.abs() < 1e-14 {
                    continue;
                }
                let (q, r) = if (area > 0.0) != reversed { (q, r) } else { (r, q) };
                out.push_triangle(
                    lift_to_3d(&p, &u, &v, &origin),
                    lift_to_3d(&q, &u, &v, &origin),
                    lift_to_3d(&r, &u, &v, &origin),
                );
            }
        }
        Ok(())
    }
}

impl Default for ClippingProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Point where edge p-q crosses the plane, computed from the endpoint that
/// sorts first so both triangles sharing the edge get the same point
fn edge_crossing(p: Point3<f64>, dp: f64, q: Point3<f64>, dq: f64) -> Point3<f64> {
    let (p, dp, q, dq) = if lexicographic_less(&q, &p) {
        (q, dq, p, dp)
    } else {
        (p, dp, q, dq)
    };
    let t = (dp / (dp - dq)).clamp(0.0, 1.0);
    p + (q - p) * t
}

/// Like [`edge_crossing`], but endpoints on the plane are used as-is
fn snapped_crossing(p: Point3<f64>, dp: f64, q: Point3<f64>, dq: f64, epsilon: f64) -> Point3<f64> {
    if dp.abs() <= epsilon {
        p
    } else if dq.abs() <= epsilon {
        q
    } else {
        edge_crossing(p, dp, q, dq)
    }
}

#[inline]
fn lexicographic_less(a: &Point3<f64>, b: &Point3<f64>) -> bool {
    (a.x, a.y, a.z) < (b.x, b.y, b.z)
}

/// Fan-triangulate a convex polygon, dropping slivers
fn fan(polygon: &[Point3<f64>]) -> Vec<Triangle> {
    let mut triangles = Vec::new();
    for i in 1..polygon.len().saturating_sub(1) {
        let t = Triangle::new(polygon[0], polygon[i], polygon[i + 1]);
        if t.area() > 1e-14 {
            triangles.push(t);
        }
    }
    triangles
}

fn contours_of(profiles: &[Profile2D]) -> Vec<Vec<Point2<f64>>> {
    profiles.iter().flat_map(profile_to_contours).collect()
}

/// Chain directed edges into closed loops of vertex ids
fn chain_loops(edges: &[(u32, u32)]) -> Vec<Vec<u32>> {
    let mut outgoing: FxHashMap<u32, SmallVec<[usize; 2]>> = FxHashMap::default();
    for (i, &(from, _)) in edges.iter().enumerate() {
        outgoing.entry(from).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();
    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        let start = edges[first].0;
        let mut ring = vec![start];
        let mut current = first;
        loop {
            used[current] = true;
            let to = edges[current].1;
            if to == start {
                if ring.len() >= 3 {
                    loops.push(ring);
                }
                break;
            }
            ring.push(to);
            let next = outgoing
                .get(&to)
                .and_then(|c| c.iter().copied().find(|&k| !used[k]));
            match next {
                Some(k) => current = k,
                None => break,
            }
        }
    }
    loops
}

/// Convert our Mesh format to csgrs Mesh format
pub(crate) fn mesh_to_csgrs(mesh: &Mesh) -> csgrs::mesh::Mesh<()> {
    use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};

    let mut polygons = Vec::with_capacity(mesh.triangle_count());
    for [v0, v1, v2] in mesh.triangles() {
        // Skip degenerate triangles to avoid NaN propagation
        let Some(face_normal) = (v1 - v0).cross(&(v2 - v0)).try_normalize(1e-10) else {
            continue;
        };
        let vertices = vec![
            Vertex::new(v0, face_normal),
            Vertex::new(v1, face_normal),
            Vertex::new(v2, face_normal),
        ];
        polygons.push(Polygon::new(vertices, None));
    }

    CSGMesh::from_polygons(&polygons, None)
}

/// Convert csgrs Mesh format back to our Mesh format
pub(crate) fn csgrs_to_mesh(csg_mesh: &csgrs::mesh::Mesh<()>) -> Mesh {
    let mut mesh = Mesh::new();

    for polygon in &csg_mesh.polygons {
        let vertices = &polygon.vertices;
        if vertices.len() < 3 {
            continue;
        }

        let points_3d: Vec<Point3<f64>> = vertices
            .iter()
            .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
            .collect();

        let raw_normal = Vector3::new(vertices[0].normal[0], vertices[0].normal[1], vertices[0].normal[2]);
        let csg_normal = match raw_normal.try_normalize(1e-10) {
            Some(n) if n.iter().all(|c| c.is_finite()) => n,
            _ => match calculate_polygon_normal(&points_3d).try_normalize(1e-10) {
                Some(n) => n,
                None => continue,
            },
        };

        if points_3d.len() == 3 {
            mesh.push_triangle(points_3d[0], points_3d[1], points_3d[2]);
            continue;
        }

        // Project with the polygon's normal so counter-clockwise in 2D
        // means facing along it
        let (points_2d, _, _, _) = project_to_2d(&points_3d, &csg_normal);
        let Ok(indices) = triangulate_polygon(&points_2d) else {
            continue;
        };

        for tri in indices.chunks_exact(3) {
            let (a, mut b, mut c) = (tri[0], tri[1], tri[2]);
            if triangle_area_2d(&points_2d[a], &points_2d[b], &points_2d[c]) < 0.0 {
                std::mem::swap(&mut b, &mut c);
            }
            mesh.push_triangle(points_3d[a], points_3d[b], points_3d[c]);
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{box_mesh, cylinder};
    use approx::assert_relative_eq;

    fn xy_plane() -> Plane {
        Plane::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0))
    }

    #[test]
    fn test_plane_signed_distance() {
        let plane = xy_plane();
        assert_eq!(plane.signed_distance(&Point3::new(0.0, 0.0, 5.0)), 5.0);
        assert_eq!(plane.signed_distance(&Point3::new(0.0, 0.0, -5.0)), -5.0);
        assert_eq!(plane.signed_distance(&Point3::new(5.0, 5.0, 0.0)), 0.0);
    }

    #[test]
    fn test_clip_behind_keeps_back_part() {
        let processor = ClippingProcessor::new();
        let triangle = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.5, 1.0, -1.0),
        ];
        let kept = processor.clip_behind(&triangle, &xy_plane());
        assert_eq!(kept.len(), 4);
        assert!(kept.iter().all(|p| p.z <= 1e-12));

        let normal = calculate_polygon_normal(&kept);
        let original = Triangle::new(triangle[0], triangle[1], triangle[2]).cross();
        assert!(normal.dot(&original) > 0.0);
    }

    #[test]
    fn test_clip_behind_through_vertex() {
        let processor = ClippingProcessor::new();
        let triangle = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, -1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        assert_eq!(processor.clip_behind(&triangle, &xy_plane()).len(), 3);

        let above = [
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.5, 1.0, 1.0),
        ];
        assert!(processor.clip_behind(&above, &xy_plane()).is_empty());
    }

    #[test]
    fn test_triangle_normal_and_area() {
        let triangle = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert!((triangle.normal().z - 1.0).abs() < 1e-12);
        assert!((triangle.area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_convex_solid_detection() {
        let solid = ConvexSolid::from_mesh(&box_mesh(2.0, 2.0, 2.0), 1e-6).unwrap();
        assert_eq!(solid.faces.len(), 6);
        assert!(ConvexSolid::from_mesh(&cylinder(1.0, 2.0, 16), 1e-6).is_some());

        let two_boxes = Mesh::concatenate(&[
            box_mesh(1.0, 1.0, 1.0),
            box_mesh(1.0, 1.0, 1.0).translated(Vector3::new(3.0, 0.0, 0.0)),
        ]);
        assert!(ConvexSolid::from_mesh(&two_boxes, 1e-6).is_none());
    }

    #[test]
    fn test_classify_against_box() {
        let processor = ClippingProcessor::new();
        let solid = ConvexSolid::from_mesh(&box_mesh(2.0, 2.0, 2.0), 1e-6).unwrap();

        // Spans x in [-3, 3] at z = 0, so a third lies inside the box
        let triangle = Triangle::new(
            Point3::new(-3.0, -0.5, 0.0),
            Point3::new(3.0, -0.5, 0.0),
            Point3::new(3.0, 0.5, 0.0),
        );
        let mut classified = Classified::default();
        processor.classify(&triangle, &solid, &mut classified);

        let inside: f64 = classified.inside.iter().map(|t| t.area()).sum();
        let outside: f64 = classified.outside.iter().map(|t| t.area()).sum();
        assert_relative_eq!(inside, 1.0, epsilon = 1e-9);
        assert_relative_eq!(inside + outside, triangle.area(), epsilon = 1e-6);
        assert!(outside > inside);

        // Pieces outside only add vertices where the box meets the triangle
        for piece in &classified.outside {
            for p in piece.vertices() {
                let on_corner = triangle.vertices().iter().any(|c| (c - p).norm() < 1e-9);
                let on_box = (p.x.abs() - 1.0).abs() < 1e-9;
                assert!(on_corner || on_box, "unexpected vertex {:?}", p);
            }
        }

        // Lying on the top face, facing up
        let on_top = Triangle::new(
            Point3::new(-0.5, -0.5, 1.0),
            Point3::new(0.5, -0.5, 1.0),
            Point3::new(0.0, 0.5, 1.0),
        );
        let mut classified = Classified::default();
        processor.classify(&on_top, &solid, &mut classified);
        assert_eq!(classified.on_same.len(), 1);
        processor.classify(&on_top.flipped(), &solid, &mut classified);
        assert_eq!(classified.on_opposite.len(), 1);
    }

    #[test]
    fn test_section_of_box() {
        let processor = ClippingProcessor::new();
        let mesh = box_mesh(4.0, 2.0, 2.0);
        let plane = xy_plane();
        let (u, v) = plane_basis(&plane.normal);
        let contours = processor.section(&mesh, &plane, true, (&u, &v), &plane.point);

        assert_eq!(contours.len(), 1);
        assert_relative_eq!(crate::bool2d::compute_signed_area(&contours[0]), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_section_on_top_face_depends_on_side() {
        let processor = ClippingProcessor::new();
        let mesh = box_mesh(2.0, 2.0, 2.0);
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vector3::z());
        let (u, v) = plane_basis(&plane.normal);

        let below = processor.section(&mesh, &plane, true, (&u, &v), &plane.point);
        let above = processor.section(&mesh, &plane, false, (&u, &v), &plane.point);
        assert_eq!(below.len(), 1);
        assert_relative_eq!(crate::bool2d::compute_signed_area(&below[0]), 4.0, epsilon = 1e-9);
        assert!(above.is_empty());
    }

    #[test]
    fn test_boolean_convex_difference_volume() {
        let processor = ClippingProcessor::new();
        let a = box_mesh(10.0, 10.0, 2.0);
        let cutter = box_mesh(2.0, 2.0, 4.0);
        let solid = ConvexSolid::from_mesh(&cutter, 1e-6).unwrap();

        let result = processor.boolean_convex(&a, &solid, BooleanOp::Difference).unwrap();
        assert_relative_eq!(result.signed_volume(), 200.0 - 8.0, epsilon = 1e-6);
        assert_relative_eq!(result.bounds().size().x, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_boolean_convex_union_and_intersection_volume() {
        let processor = ClippingProcessor::new();
        let a = box_mesh(4.0, 4.0, 4.0);
        let b = box_mesh(4.0, 4.0, 4.0).translated(Vector3::new(2.0, 0.0, 0.0));
        let solid = ConvexSolid::from_mesh(&b, 1e-6).unwrap();

        let union = processor.boolean_convex(&a, &solid, BooleanOp::Union).unwrap();
        assert_relative_eq!(union.signed_volume(), 96.0, epsilon = 1e-6);

        let common = processor.boolean_convex(&a, &solid, BooleanOp::Intersection).unwrap();
        assert_relative_eq!(common.signed_volume(), 32.0, epsilon = 1e-6);
    }

    #[test]
    fn test_csgrs_round_trip_keeps_volume() {
        let mesh = box_mesh(3.0, 2.0, 1.0);
        let back = csgrs_to_mesh(&mesh_to_csgrs(&mesh));
        assert_relative_eq!(back.signed_volume(), 6.0, epsilon = 1e-9);
    }
}
