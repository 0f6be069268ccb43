// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures
//!
//! Positions are stored in f64: parts are built in millimetres and the weld
//! and boolean tolerances (1e-6) sit below f32 resolution at typical part
//! sizes.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Create a bounding box from corners
    #[inline]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Extent along each axis
    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center point
    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Length of the diagonal
    #[inline]
    pub fn diagonal(&self) -> f64 {
        self.size().norm()
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        )
    }

    /// Overlap of both boxes, `None` when they are disjoint
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min = Point3::new(
            self.min.x.max(other.min.x),
            self.min.y.max(other.min.y),
            self.min.z.max(other.min.z),
        );
        let max = Point3::new(
            self.max.x.min(other.max.x),
            self.max.y.min(other.max.y),
            self.max.z.min(other.max.z),
        );
        if min.x > max.x || min.y > max.y || min.z > max.z {
            None
        } else {
            Some(BoundingBox::new(min, max))
        }
    }

    /// Check whether `other` lies inside this box, grown by `tolerance`
    pub fn contains_box(&self, other: &BoundingBox, tolerance: f64) -> bool {
        other.min.x >= self.min.x - tolerance
            && other.min.y >= self.min.y - tolerance
            && other.min.z >= self.min.z - tolerance
            && other.max.x <= self.max.x + tolerance
            && other.max.y <= self.max.y + tolerance
            && other.max.z <= self.max.z + tolerance
    }

    /// Check whether the boxes overlap with positive volume
    pub fn overlaps(&self, other: &BoundingBox, tolerance: f64) -> bool {
        self.min.x < other.max.x - tolerance
            && other.min.x < self.max.x - tolerance
            && self.min.y < other.max.y - tolerance
            && other.min.y < self.max.y - tolerance
            && self.min.z < other.max.z - tolerance
            && other.min.z < self.max.z - tolerance
    }
}

/// Triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f64>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex, returning its index
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        let index = self.vertex_count() as u32;
        self.positions.push(position.x);
        self.positions.push(position.y);
        self.positions.push(position.z);
        index
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add a free-standing triangle with its own three vertices
    #[inline]
    pub fn push_triangle(&mut self, v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) {
        let i0 = self.add_vertex(v0);
        let i1 = self.add_vertex(v1);
        let i2 = self.add_vertex(v2);
        self.add_triangle(i0, i1, i2);
    }

    /// Position of vertex `index`
    #[inline]
    pub fn vertex(&self, index: u32) -> Point3<f64> {
        let i = index as usize * 3;
        Point3::new(self.positions[i], self.positions[i + 1], self.positions[i + 2])
    }

    /// Iterate over all vertex positions
    pub fn vertices(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|c| Point3::new(c[0], c[1], c[2]))
    }

    /// Iterate over triangles as corner positions
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [self.vertex(t[0]), self.vertex(t[1]), self.vertex(t[2])])
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = self.vertex_count() as u32;

        self.positions.reserve(other.positions.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Batch merge multiple meshes at once
    #[inline]
    pub fn merge_all(&mut self, meshes: &[Mesh]) {
        let total_positions: usize = meshes.iter().map(|m| m.positions.len()).sum();
        let total_indices: usize = meshes.iter().map(|m| m.indices.len()).sum();

        self.positions.reserve(total_positions);
        self.indices.reserve(total_indices);

        for mesh in meshes {
            self.merge(mesh);
        }
    }

    /// Concatenate meshes without resolving overlaps
    pub fn concatenate(meshes: &[Mesh]) -> Mesh {
        let mut combined = Mesh::new();
        combined.merge_all(meshes);
        combined
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Check that every coordinate is finite
    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(|v| v.is_finite())
    }

    /// Calculate bounds
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        if self.positions.is_empty() {
            return BoundingBox::new(Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            min.x = min.x.min(chunk[0]);
            min.y = min.y.min(chunk[1]);
            min.z = min.z.min(chunk[2]);
            max.x = max.x.max(chunk[0]);
            max.y = max.y.max(chunk[1]);
            max.z = max.z.max(chunk[2]);
        });

        BoundingBox::new(min, max)
    }

    /// Signed enclosed volume (divergence theorem)
    ///
    /// Positive for outward-wound closed meshes.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)))
            .sum::<f64>()
            / 6.0
    }

    /// Volume-weighted centroid, falling back to the vertex mean when the
    /// mesh encloses no volume
    pub fn centroid(&self) -> Point3<f64> {
        if self.is_empty() {
            return Point3::origin();
        }

        let mut weighted = Vector3::zeros();
        let mut volume = 0.0;
        for [a, b, c] in self.triangles() {
            let v = a.coords.dot(&b.coords.cross(&c.coords)) / 6.0;
            volume += v;
            weighted += (a.coords + b.coords + c.coords) * (v / 4.0);
        }

        if volume.abs() > 1e-12 {
            Point3::from(weighted / volume)
        } else {
            self.vertex_mean()
        }
    }

    /// Average of all vertex positions
    pub fn vertex_mean(&self) -> Point3<f64> {
        let count = self.vertex_count();
        if count == 0 {
            return Point3::origin();
        }
        let sum = self
            .vertices()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / count as f64)
    }

    /// Copy with every vertex moved by `offset`
    pub fn translated(&self, offset: Vector3<f64>) -> Mesh {
        let mut positions = self.positions.clone();
        for chunk in positions.chunks_exact_mut(3) {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        }
        Mesh {
            positions,
            indices: self.indices.clone(),
        }
    }

    /// Copy rotated about the origin
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Mesh {
        self.transformed(&rotation.to_homogeneous())
    }

    /// Copy transformed by an affine matrix
    ///
    /// Mirroring matrices flip triangle winding back so the result stays
    /// outward-wound.
    pub fn transformed(&self, matrix: &Matrix4<f64>) -> Mesh {
        let mut positions = Vec::with_capacity(self.positions.len());
        for p in self.vertices() {
            let t = matrix.transform_point(&p);
            positions.extend_from_slice(&[t.x, t.y, t.z]);
        }

        let mut indices = self.indices.clone();
        if matrix.fixed_view::<3, 3>(0, 0).clone_owned().determinant() < 0.0 {
            for tri in indices.chunks_exact_mut(3) {
                tri.swap(1, 2);
            }
        }

        Mesh { positions, indices }
    }

    /// Copy with every triangle's winding reversed
    pub fn flipped(&self) -> Mesh {
        let mut indices = self.indices.clone();
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
        Mesh {
            positions: self.positions.clone(),
            indices,
        }
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.indices.clear();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tetrahedron() -> Mesh {
        let mut mesh = Mesh::new();
        let o = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let x = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let y = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let z = mesh.add_vertex(Point3::new(0.0, 0.0, 1.0));
        mesh.add_triangle(o, y, x);
        mesh.add_triangle(o, x, z);
        mesh.add_triangle(o, z, y);
        mesh.add_triangle(x, y, z);
        mesh
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_add_vertex_returns_index() {
        let mut mesh = Mesh::new();
        assert_eq!(mesh.add_vertex(Point3::new(1.0, 2.0, 3.0)), 0);
        assert_eq!(mesh.add_vertex(Point3::new(4.0, 5.0, 6.0)), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh1 = unit_tetrahedron();
        let mesh2 = unit_tetrahedron();
        mesh1.merge(&mesh2);
        assert_eq!(mesh1.vertex_count(), 8);
        assert_eq!(mesh1.triangle_count(), 8);
        assert_eq!(mesh1.indices[12], 4);
    }

    #[test]
    fn test_signed_volume_and_flip() {
        let mesh = unit_tetrahedron();
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.flipped().signed_volume(), -1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_centroid_is_volume_weighted() {
        let centroid = unit_tetrahedron().centroid();
        assert_relative_eq!(centroid.x, 0.25, epsilon = 1e-12);
        assert_relative_eq!(centroid.y, 0.25, epsilon = 1e-12);
        assert_relative_eq!(centroid.z, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_translated_leaves_input_untouched() {
        let mesh = unit_tetrahedron();
        let moved = mesh.translated(Vector3::new(10.0, 0.0, 0.0));
        assert_eq!(mesh.bounds().min.x, 0.0);
        assert_eq!(moved.bounds().min.x, 10.0);
    }

    #[test]
    fn test_mirror_transform_keeps_orientation() {
        let mesh = unit_tetrahedron();
        let mirror = Matrix4::new_nonuniform_scaling(&Vector3::new(-1.0, 1.0, 1.0));
        let mirrored = mesh.transformed(&mirror);
        assert!(mirrored.signed_volume() > 0.0);
    }

    #[test]
    fn test_bounding_box_ops() {
        let a = BoundingBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 2.0, 2.0));
        let b = BoundingBox::new(Point3::new(1.0, 1.0, 1.0), Point3::new(3.0, 3.0, 3.0));
        assert!(a.overlaps(&b, 0.0));
        assert_eq!(a.union(&b).max, Point3::new(3.0, 3.0, 3.0));
        assert_eq!(a.intersection(&b).map(|i| i.min), Some(Point3::new(1.0, 1.0, 1.0)));
        assert!(a.union(&b).contains_box(&a, 0.0));
    }
}
