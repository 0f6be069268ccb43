// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh Repair
//!
//! Vertex welding, small-gap closing and an optional convex-hull backstop,
//! applied to every generated part before it leaves the pipeline.

use crate::diagnostics::{Degraded, Outcome, Stage};
use crate::hull::convex_hull;
use crate::mesh::Mesh;
use crate::settings::GeometrySettings;
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Spatial hash that merges points closer than a tolerance
///
/// Cells are one tolerance wide, so any match lives in the 27 cells
/// around the query. The first point inserted in a cluster represents it.
pub struct VertexWelder {
    tolerance: f64,
    inv_cell: f64,
    cells: FxHashMap<(i64, i64, i64), SmallVec<[u32; 4]>>,
    positions: Vec<Point3<f64>>,
}

impl VertexWelder {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance
        } else {
            1e-9
        };
        Self {
            tolerance,
            inv_cell: 1.0 / tolerance,
            cells: FxHashMap::default(),
            positions: Vec::new(),
        }
    }

    #[inline]
    fn cell(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x * self.inv_cell).floor() as i64,
            (p.y * self.inv_cell).floor() as i64,
            (p.z * self.inv_cell).floor() as i64,
        )
    }

    /// Index of the representative for `p`, inserting it if none is close
    pub fn insert(&mut self, p: Point3<f64>) -> u32 {
        let (cx, cy, cz) = self.cell(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &id in bucket {
                            if (self.positions[id as usize] - p).norm() <= self.tolerance {
                                return id;
                            }
                        }
                    }
                }
            }
        }

        let id = self.positions.len() as u32;
        self.positions.push(p);
        self.cells.entry((cx, cy, cz)).or_default().push(id);
        id
    }

    pub fn position(&self, id: u32) -> Point3<f64> {
        self.positions[id as usize]
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Consume the welder into a mesh holding only its vertices
    pub fn into_mesh(self) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.positions.len(), 0);
        for p in self.positions {
            mesh.add_vertex(p);
        }
        mesh
    }
}

/// Merge vertices closer than `epsilon` and drop triangles that collapse
pub fn weld_vertices(mesh: &Mesh, epsilon: f64) -> Mesh {
    let mut welder = VertexWelder::new(epsilon);
    let remap: Vec<u32> = mesh.vertices().map(|p| welder.insert(p)).collect();

    let mut indices = Vec::with_capacity(mesh.indices.len());
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (
            remap[tri[0] as usize],
            remap[tri[1] as usize],
            remap[tri[2] as usize],
        );
        if a == b || b == c || a == c {
            continue;
        }
        indices.extend_from_slice(&[a, b, c]);
    }

    let mut welded = welder.into_mesh();
    welded.indices = indices;
    welded
}

fn directed_edge_counts(mesh: &Mesh) -> FxHashMap<(u32, u32), u32> {
    let mut counts: FxHashMap<(u32, u32), u32> = FxHashMap::default();
    for tri in mesh.indices.chunks_exact(3) {
        for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            *counts.entry((a, b)).or_insert(0) += 1;
        }
    }
    counts
}

/// Directed edges without an opposite twin, sorted
fn boundary_edges(mesh: &Mesh) -> Vec<(u32, u32)> {
    let counts = directed_edge_counts(mesh);
    let mut open = Vec::new();
    for (&(a, b), &n) in &counts {
        let twins = counts.get(&(b, a)).copied().unwrap_or(0);
        for _ in twins..n {
            open.push((a, b));
        }
    }
    open.sort_unstable();
    open
}

/// Check that every edge is shared by exactly two triangles with opposite
/// orientation
pub fn is_watertight(mesh: &Mesh) -> bool {
    if mesh.is_empty() {
        return false;
    }
    let counts = directed_edge_counts(mesh);
    counts
        .iter()
        .all(|(&(a, b), &n)| n == 1 && counts.get(&(b, a)) == Some(&1))
}

/// Number of directed edges without a matching opposite edge
pub fn open_edge_count(mesh: &Mesh) -> usize {
    boundary_edges(mesh).len()
}

/// Chain boundary edges into closed loops of vertex indices
///
/// Chains that dead-end are discarded.
fn boundary_loops(mesh: &Mesh) -> Vec<Vec<u32>> {
    let edges = boundary_edges(mesh);
    let mut outgoing: FxHashMap<u32, SmallVec<[usize; 2]>> = FxHashMap::default();
    for (i, &(a, _)) in edges.iter().enumerate() {
        outgoing.entry(a).or_default().push(i);
    }

    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        let start = edges[first].0;
        let mut chain = vec![start];
        let mut current = first;

        loop {
            used[current] = true;
            let to = edges[current].1;
            if to == start {
                loops.push(chain);
                break;
            }
            chain.push(to);
            let next = outgoing
                .get(&to)
                .and_then(|candidates| candidates.iter().copied().find(|&k| !used[k]));
            match next {
                Some(k) if chain.len() <= edges.len() => current = k,
                _ => break,
            }
        }
    }

    loops
}

/// Fill boundary loops of at most `max_edges` edges with triangle fans
pub fn close_small_gaps(mesh: &Mesh, max_edges: usize) -> Mesh {
    let mut closed = mesh.clone();
    for ring in boundary_loops(mesh) {
        if ring.len() < 3 || ring.len() > max_edges {
            continue;
        }
        // Boundary runs opposite to the missing faces, so fan backwards
        for i in 1..ring.len() - 1 {
            closed.add_triangle(ring[0], ring[i + 1], ring[i]);
        }
    }
    closed
}

/// Split triangles whose open edges pass through other open vertices
///
/// Booleans leave T-junctions where one side of a seam was cut at points
/// the other side never saw. Each pass splits at most one edge per
/// triangle; a few passes settle every seam.
pub fn split_t_junctions(mesh: &Mesh, tolerance: f64) -> Mesh {
    let mut mesh = mesh.clone();

    for _ in 0..4 {
        let open = boundary_edges(&mesh);
        if open.is_empty() {
            break;
        }

        let mut candidates: Vec<u32> = open.iter().flat_map(|&(a, b)| [a, b]).collect();
        candidates.sort_unstable();
        candidates.dedup();
        let mut by_x: Vec<(f64, u32)> = candidates.iter().map(|&v| (mesh.vertex(v).x, v)).collect();
        by_x.sort_by(|p, q| p.0.total_cmp(&q.0).then(p.1.cmp(&q.1)));

        let mut splits: FxHashMap<(u32, u32), Vec<(f64, u32)>> = FxHashMap::default();
        for &(a, b) in &open {
            let (pa, pb) = (mesh.vertex(a), mesh.vertex(b));
            let ab = pb - pa;
            let length_sq = ab.norm_squared();
            if length_sq <= tolerance * tolerance {
                continue;
            }

            let lo = pa.x.min(pb.x) - tolerance;
            let hi = pa.x.max(pb.x) + tolerance;
            let start = by_x.partition_point(|&(x, _)| x < lo);
            for &(x, v) in &by_x[start..] {
                if x > hi {
                    break;
                }
                if v == a || v == b {
                    continue;
                }
                let p = mesh.vertex(v);
                let t = (p - pa).dot(&ab) / length_sq;
                if t <= 1e-9 || t >= 1.0 - 1e-9 {
                    continue;
                }
                if (p - (pa + ab * t)).norm() <= tolerance {
                    splits.entry((a, b)).or_default().push((t, v));
                }
            }
        }
        if splits.is_empty() {
            break;
        }

        let mut indices = Vec::with_capacity(mesh.indices.len() + splits.len() * 6);
        for tri in mesh.indices.chunks_exact(3) {
            let rotations = [(tri[0], tri[1], tri[2]), (tri[1], tri[2], tri[0]), (tri[2], tri[0], tri[1])];
            let split = rotations
                .iter()
                .find_map(|&(a, b, c)| splits.get(&(a, b)).map(|points| (a, b, c, points)));
            match split {
                Some((a, b, c, points)) => {
                    let mut points = points.clone();
                    points.sort_by(|p, q| p.0.total_cmp(&q.0));
                    let mut chain = Vec::with_capacity(points.len() + 2);
                    chain.push(a);
                    chain.extend(points.iter().map(|&(_, v)| v));
                    chain.push(b);
                    chain.dedup();
                    for pair in chain.windows(2) {
                        indices.extend_from_slice(&[pair[0], pair[1], c]);
                    }
                }
                None => indices.extend_from_slice(tri),
            }
        }
        mesh.indices = indices;
    }

    mesh
}

/// Split a mesh into vertex-connected pieces, in order of first appearance
pub fn connected_components(mesh: &Mesh) -> Vec<Mesh> {
    let vertex_count = mesh.vertex_count();
    let mut parent: Vec<u32> = (0..vertex_count as u32).collect();

    fn find(parent: &mut [u32], mut x: u32) -> u32 {
        while parent[x as usize] != x {
            let grand = parent[parent[x as usize] as usize];
            parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    for tri in mesh.indices.chunks_exact(3) {
        let root = find(&mut parent, tri[0]);
        for &v in &tri[1..] {
            let other = find(&mut parent, v);
            if other != root {
                parent[other as usize] = root;
            }
        }
    }

    let mut component_of: FxHashMap<u32, usize> = FxHashMap::default();
    let mut remaps: Vec<FxHashMap<u32, u32>> = Vec::new();
    let mut components: Vec<Mesh> = Vec::new();

    for tri in mesh.indices.chunks_exact(3) {
        let root = find(&mut parent, tri[0]);
        let slot = *component_of.entry(root).or_insert_with(|| {
            components.push(Mesh::new());
            remaps.push(FxHashMap::default());
            components.len() - 1
        });

        let target = &mut components[slot];
        let remap = &mut remaps[slot];
        let mut local = [0u32; 3];
        for (k, &v) in tri.iter().enumerate() {
            local[k] = *remap
                .entry(v)
                .or_insert_with(|| target.add_vertex(mesh.vertex(v)));
        }
        target.add_triangle(local[0], local[1], local[2]);
    }

    components
}

/// Weld, stitch T-junctions, close small gaps and optionally fall back to
/// the convex hull
///
/// A mesh that is still open after gap closing, or that was replaced by its
/// hull, comes back as [`Degraded`].
pub fn repair(mesh: &Mesh, settings: &GeometrySettings) -> Outcome {
    let welded = weld_vertices(mesh, settings.weld_epsilon);
    if is_watertight(&welded) {
        return Ok(welded);
    }

    let stitched = split_t_junctions(&welded, settings.weld_epsilon * 100.0);
    if is_watertight(&stitched) {
        return Ok(stitched);
    }

    let closed = close_small_gaps(&stitched, settings.max_gap_edges);
    if is_watertight(&closed) {
        tracing::debug!(
            open_edges = open_edge_count(&stitched),
            "Closed small gaps"
        );
        return Ok(closed);
    }

    let open = open_edge_count(&closed);
    if settings.hull_fallback {
        let points: Vec<Point3<f64>> = closed.vertices().collect();
        match convex_hull(&points) {
            Ok(hull) => {
                tracing::warn!(open_edges = open, "Replacing open mesh with its convex hull");
                return Err(Degraded::new(
                    hull,
                    Stage::Repair,
                    format!("replaced by convex hull ({} open edges)", open),
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Convex hull fallback failed");
            }
        }
    }

    Err(Degraded::new(
        closed,
        Stage::Repair,
        format!("mesh not watertight ({} open edges)", open),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{box_mesh, cylinder};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    /// Box as a triangle soup with no shared vertices
    fn soup(mesh: &Mesh) -> Mesh {
        let mut out = Mesh::new();
        for [a, b, c] in mesh.triangles() {
            out.push_triangle(a, b, c);
        }
        out
    }

    #[test]
    fn test_weld_restores_shared_vertices() {
        let cube = soup(&box_mesh(2.0, 2.0, 2.0));
        assert!(!is_watertight(&cube));

        let welded = weld_vertices(&cube, 1e-6);
        assert_eq!(welded.vertex_count(), 8);
        assert_eq!(welded.triangle_count(), 12);
        assert!(is_watertight(&welded));
    }

    #[test]
    fn test_weld_drops_collapsed_triangles() {
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1e-9, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(weld_vertices(&mesh, 1e-6).triangle_count(), 0);
    }

    #[test]
    fn test_weld_merges_across_cell_boundaries() {
        let mut welder = VertexWelder::new(1e-3);
        let a = welder.insert(Point3::new(0.9999, 0.0, 0.0));
        let b = welder.insert(Point3::new(1.0001, 0.0, 0.0));
        let c = welder.insert(Point3::new(1.01, 0.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(welder.len(), 2);
    }

    #[test]
    fn test_close_small_gaps_patches_missing_face() {
        let mut cube = box_mesh(2.0, 2.0, 2.0);
        // Drop the last two triangles, which form one wall
        cube.indices.truncate(cube.indices.len() - 6);
        assert!(!is_watertight(&cube));
        assert_eq!(open_edge_count(&cube), 4);

        let closed = close_small_gaps(&cube, 48);
        assert!(is_watertight(&closed));
        assert_relative_eq!(closed.signed_volume(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_close_small_gaps_respects_limit() {
        let mut tube = cylinder(5.0, 10.0, 32);
        // Remove the top cap entirely; its rim has 32 edges
        let keep: Vec<u32> = tube
            .indices
            .chunks_exact(3)
            .filter(|t| t.iter().any(|&i| tube.vertex(i).z < 4.9))
            .flatten()
            .copied()
            .collect();
        tube.indices = keep;

        assert!(!is_watertight(&close_small_gaps(&tube, 16)));
        assert!(is_watertight(&close_small_gaps(&tube, 48)));
    }

    #[test]
    fn test_split_t_junctions_stitches_seam() {
        // Unit square split into one triangle on the left and two on the
        // right, meeting at a midpoint only the right side knows about
        let mut mesh = Mesh::new();
        let p = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.5, 0.5, 0.0),
        ];
        for point in p {
            mesh.add_vertex(point);
        }
        mesh.add_triangle(0, 2, 3);
        mesh.add_triangle(0, 1, 4);
        mesh.add_triangle(4, 1, 2);
        assert_eq!(open_edge_count(&mesh), 7);

        let stitched = split_t_junctions(&mesh, 1e-6);
        assert_eq!(stitched.triangle_count(), 4);
        assert_eq!(open_edge_count(&stitched), 4);
        let area: f64 = stitched.triangles().map(|[a, b, c]| (b - a).cross(&(c - a)).norm() * 0.5).sum();
        assert_relative_eq!(area, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_connected_components() {
        let a = box_mesh(1.0, 1.0, 1.0);
        let b = box_mesh(1.0, 1.0, 1.0).translated(Vector3::new(5.0, 0.0, 0.0));
        let parts = connected_components(&Mesh::concatenate(&[a, b]));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].vertex_count(), 8);
        assert!(parts[1].bounds().min.x > 4.0);
    }

    #[test]
    fn test_repair_closed_mesh_is_clean() {
        let settings = GeometrySettings::default();
        let repaired = repair(&soup(&box_mesh(3.0, 3.0, 3.0)), &settings).unwrap();
        assert!(is_watertight(&repaired));
    }

    #[test]
    fn test_repair_reports_open_mesh() {
        let mut settings = GeometrySettings::default();
        let mut open = box_mesh(2.0, 2.0, 2.0);
        open.indices.truncate(open.indices.len() - 6);
        settings.max_gap_edges = 3;

        let degraded = repair(&open, &settings).unwrap_err();
        assert_eq!(degraded.report.stage, Stage::Repair);
        assert!(!degraded.mesh.is_empty());

        settings.hull_fallback = true;
        let hulled = repair(&open, &settings).unwrap_err();
        assert!(is_watertight(&hulled.mesh));
        assert_relative_eq!(hulled.mesh.signed_volume(), 8.0, epsilon = 1e-6);
    }
}
