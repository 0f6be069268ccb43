// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Profile definitions and triangulation

use crate::bool2d::{ensure_ccw, ensure_cw, is_valid_contour};
use crate::error::{Error, Result};
use nalgebra::Point2;
use std::f64::consts::{FRAC_PI_2, PI};

/// 2D Profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a new profile
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Copy with canonical winding: outer counter-clockwise, holes clockwise,
    /// degenerate holes removed
    pub fn normalized(&self) -> Profile2D {
        Profile2D {
            outer: ensure_ccw(&self.outer),
            holes: self
                .holes
                .iter()
                .filter(|h| is_valid_contour(h))
                .map(|h| ensure_cw(h))
                .collect(),
        }
    }

    /// Check the outer boundary encloses area
    pub fn is_valid(&self) -> bool {
        is_valid_contour(&self.outer)
    }

    /// Map every point through `f` (outer and holes)
    pub fn map_points(&self, f: impl Fn(Point2<f64>) -> Point2<f64>) -> Profile2D {
        Profile2D {
            outer: self.outer.iter().map(|p| f(*p)).collect(),
            holes: self
                .holes
                .iter()
                .map(|h| h.iter().map(|p| f(*p)).collect())
                .collect(),
        }
    }

    /// Triangulate the profile using earcutr
    /// Returns triangle indices into the flattened vertex array
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 vertices".to_string(),
            ));
        }

        let mut vertices = Vec::with_capacity(
            (self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()) * 2,
        );

        for p in &self.outer {
            vertices.push(p.x);
            vertices.push(p.y);
        }

        let mut hole_indices = Vec::with_capacity(self.holes.len());
        for hole in &self.holes {
            hole_indices.push(vertices.len() / 2);
            for p in hole {
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }

        let indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

        if indices.is_empty() {
            return Err(Error::TriangulationError(
                "Profile produced no triangles".to_string(),
            ));
        }

        let points = vertices
            .chunks_exact(2)
            .map(|c| Point2::new(c[0], c[1]))
            .collect();

        Ok(Triangulation { points, indices })
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer + holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
}

/// Create a rectangular profile
#[inline]
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    Profile2D::new(vec![
        Point2::new(-half_w, -half_h),
        Point2::new(half_w, -half_h),
        Point2::new(half_w, half_h),
        Point2::new(-half_w, half_h),
    ])
}

/// Create a circular profile (with optional hole)
pub fn create_circle(radius: f64, hole_radius: Option<f64>, segments: usize) -> Profile2D {
    let segments = segments.max(3);
    let mut profile = Profile2D::new(circle_points(radius, segments));

    if let Some(hole_r) = hole_radius.filter(|r| *r > 0.0 && *r < radius) {
        let mut hole = circle_points(hole_r, segments);
        hole.reverse(); // Make clockwise
        profile.add_hole(hole);
    }

    profile
}

fn circle_points(radius: f64, segments: usize) -> Vec<Point2<f64>> {
    (0..segments)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (segments as f64);
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Create a rectangle with circular corner arcs, centered on the origin
///
/// `arc_segments` is the number of segments per quarter arc. The caller is
/// responsible for keeping `radius` below half the smaller side.
pub fn create_rounded_rectangle(
    width: f64,
    height: f64,
    radius: f64,
    arc_segments: usize,
) -> Profile2D {
    if radius <= 0.0 {
        return create_rectangle(width, height);
    }

    let half_w = width / 2.0;
    let half_h = height / 2.0;
    let arc_segments = arc_segments.max(1);

    // Corner centers, counter-clockwise starting bottom-right
    let corners = [
        (half_w - radius, -half_h + radius, -FRAC_PI_2),
        (half_w - radius, half_h - radius, 0.0),
        (-half_w + radius, half_h - radius, FRAC_PI_2),
        (-half_w + radius, -half_h + radius, PI),
    ];

    let mut outer = Vec::with_capacity(4 * (arc_segments + 1));
    for (cx, cy, start) in corners {
        for i in 0..=arc_segments {
            let angle = start + FRAC_PI_2 * (i as f64) / (arc_segments as f64);
            outer.push(Point2::new(cx + radius * angle.cos(), cy + radius * angle.sin()));
        }
    }

    Profile2D::new(outer)
}

/// Calculate segments per quarter arc from a full-circle section count
#[inline]
pub fn quarter_arc_segments(sections: usize) -> usize {
    (sections / 4).max(2)
}
