// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Edge Rounding Approximator
//!
//! Rounded boxes are unions of corner-trimmed cores and corner cylinders.
//! Top edges are rounded by subtracting fillet cutters: along each edge the
//! part of a square outside an inscribed quarter disc, at each corner the
//! part of a cube outside an inscribed sphere. Each cutter is one closed
//! solid and is subtracted on its own. Radii are clamped so the bounding
//! box never changes.

use crate::boolean::BooleanEngine;
use crate::diagnostics::{Degraded, Outcome, Stage};
use crate::mesh::{BoundingBox, Mesh};
use crate::primitives::{box_mesh, clamp_corner_radius, clamp_dimension, cylinder, prism_along, rounded_plate, Axis};
use crate::profile::{quarter_arc_segments, Profile2D};
use crate::repair::weld_vertices;
use crate::settings::GeometrySettings;
use nalgebra::{Point2, Point3, Vector3};
use std::f64::consts::FRAC_PI_2;

/// Distance cutters reach past the part surface (mm)
const CUTTER_MARGIN: f64 = 0.5;

/// Smallest wall a shell is built with (mm)
pub const MIN_WALL: f64 = 0.6;

/// Clamp a rounding radius to [0, min(length, width) / 4]
#[inline]
pub fn clamp_radius(length: f64, width: f64, radius: f64) -> f64 {
    clamp_corner_radius(length, width, radius)
}

/// Box centered at the origin with rounded vertical edges
///
/// Built as the union of two cores (each trimmed by 2r along one axis) and
/// four corner cylinders.
pub fn rounded_box(engine: &BooleanEngine, length: f64, width: f64, height: f64, radius: f64, settings: &GeometrySettings) -> Outcome {
    let (l, w, h) = (clamp_dimension(length), clamp_dimension(width), clamp_dimension(height));
    let r = clamp_radius(l, w, radius);
    if r <= 1e-9 {
        return Ok(box_mesh(l, w, h));
    }

    let mut parts = vec![box_mesh(l - 2.0 * r, w, h), box_mesh(l, w - 2.0 * r, h)];
    for (sx, sy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        let post = cylinder(r, h, settings.cylinder_sections);
        parts.push(post.translated(Vector3::new(sx * (l / 2.0 - r), sy * (w / 2.0 - r), 0.0)));
    }

    engine.union(&parts).map_err(|d| d.within(Stage::Rounding))
}

/// Round the four top edges and corners of a part's bounding box
///
/// The radius is clamped to a quarter of the smaller planar extent and to
/// the height, so the bounding box is unchanged. Cutters are subtracted one
/// at a time: the four edge fillets first, then the four corners.
pub fn round_top_edges(engine: &BooleanEngine, mesh: &Mesh, radius: f64, settings: &GeometrySettings) -> Outcome {
    if mesh.is_empty() {
        return Ok(mesh.clone());
    }
    let bounds = mesh.bounds();
    let size = bounds.size();
    let r = clamp_radius(size.x, size.y, radius).min(size.z);
    if r <= 1e-9 {
        return Ok(mesh.clone());
    }

    let segments = quarter_arc_segments(settings.cylinder_sections);
    let mut cutters = edge_cutters(&bounds, r, segments);
    cutters.extend(corner_cutters(&bounds, r, segments));

    let total = cutters.len();
    let mut failed = 0usize;
    let mut current = mesh.clone();
    for cutter in &cutters {
        current = match engine.difference(&current, cutter) {
            Ok(cut) => cut,
            Err(degraded) => {
                failed += 1;
                degraded.mesh
            }
        };
    }

    if failed > 0 {
        tracing::warn!(failed, total, "Some fillet cutters could not be subtracted");
        return Err(Degraded::new(
            current,
            Stage::Rounding,
            format!("{} of {} fillet cutters not subtracted", failed, total),
        ));
    }
    Ok(current)
}

/// Open-top hollow box with rounded vertical edges, centered at the origin
///
/// The floor and walls are `wall` thick; the inner corner radius follows
/// the outer one.
pub fn rounded_shell(
    engine: &BooleanEngine,
    length: f64,
    width: f64,
    height: f64,
    wall: f64,
    radius: f64,
    settings: &GeometrySettings,
) -> Outcome {
    let (l, w, h) = (clamp_dimension(length), clamp_dimension(width), clamp_dimension(height));
    let max_wall = (l.min(w) / 2.0 - 0.1).max(MIN_WALL);
    let wall = clamp_dimension(wall).clamp(MIN_WALL, max_wall).min(h / 2.0);
    let r = clamp_radius(l, w, radius);
    let sections = settings.cylinder_sections;

    let outer = rounded_plate(l, w, h, r, sections);
    let (il, iw) = (l - 2.0 * wall, w - 2.0 * wall);
    if il <= 0.1 || iw <= 0.1 {
        return Err(Degraded::new(outer, Stage::Rounding, "walls leave no cavity"));
    }

    // Cavity pokes out of the top so the shell stays open
    let cavity = rounded_plate(il, iw, h, (r - wall).max(0.0), sections)
        .translated(Vector3::new(0.0, 0.0, wall));
    engine.difference(&outer, &cavity).map_err(|d| d.within(Stage::Rounding))
}

/// Square-minus-quarter-disc outline at an edge
///
/// Coordinates are (h, z): `h_edge` is the edge position across the edge
/// direction, `sign` points outward, `z_top` is the top of the part. The
/// arc runs from the side face up to the top face; the square reaches
/// `CUTTER_MARGIN` past both.
fn fillet_profile(h_edge: f64, sign: f64, z_top: f64, r: f64, segments: usize) -> Profile2D {
    let m = CUTTER_MARGIN;
    let center = Point2::new(h_edge - sign * r, z_top - r);
    let arc = |i: usize| {
        let angle = FRAC_PI_2 * i as f64 / segments as f64;
        Point2::new(center.x + sign * r * angle.cos(), center.y + r * angle.sin())
    };

    let mut outline = vec![
        arc(0),
        Point2::new(h_edge + sign * m, z_top - r),
        Point2::new(h_edge + sign * m, z_top + m),
        Point2::new(h_edge - sign * r, z_top + m),
    ];
    outline.extend((1..=segments).rev().map(arc));
    Profile2D::new(outline)
}

/// One fillet prism per top edge of `bounds`
fn edge_cutters(bounds: &BoundingBox, r: f64, segments: usize) -> Vec<Mesh> {
    let m = CUTTER_MARGIN;
    let (min, max) = (bounds.min, bounds.max);
    let mut cutters = Vec::with_capacity(8);

    // Edges running along X sit at y = min/max; profiles live in (y, z)
    for (h_edge, sign) in [(max.y, 1.0), (min.y, -1.0)] {
        let profile = fillet_profile(h_edge, sign, max.z, r, segments);
        cutters.push(prism_along(&profile, Axis::X, min.x - m, max.x - min.x + 2.0 * m));
    }

    // Edges running along Y sit at x = min/max; profiles live in (z, x)
    for (h_edge, sign) in [(max.x, 1.0), (min.x, -1.0)] {
        let profile = fillet_profile(h_edge, sign, max.z, r, segments).map_points(|p| Point2::new(p.y, p.x));
        cutters.push(prism_along(&profile, Axis::Y, min.y - m, max.y - min.y + 2.0 * m));
    }

    cutters
}

/// Cube-minus-sphere cutters at the four top corners of `bounds`
fn corner_cutters(bounds: &BoundingBox, r: f64, segments: usize) -> Vec<Mesh> {
    let (min, max) = (bounds.min, bounds.max);
    let mut cutters = Vec::with_capacity(4);
    for (x, sx) in [(max.x, 1.0), (min.x, -1.0)] {
        for (y, sy) in [(max.y, 1.0), (min.y, -1.0)] {
            let signs = Vector3::new(sx, sy, 1.0);
            let center = Point3::new(x, y, max.z) - signs * r;
            cutters.push(corner_cutter(&center, &signs, r, segments));
        }
    }
    cutters
}

/// Region of the octant cube at `center` that lies outside the sphere of
/// radius `r`, as one closed mesh
///
/// Every point of the cube is `center + t * d` for a direction `d` in the
/// octant, so the solid is swept along rays: from the sphere (t = r) out to
/// the cube surface. The cube reaches a full radius past the corner, so the
/// outer surface never comes near the part. Sphere vertices on the two
/// vertical walls match the edge fillet arcs.
fn corner_cutter(center: &Point3<f64>, signs: &Vector3<f64>, r: f64, segments: usize) -> Mesh {
    let n = segments.max(2);
    let reach = 2.0 * r + CUTTER_MARGIN;
    let point = |i: usize, j: usize, outer: bool| -> Point3<f64> {
        let polar = FRAC_PI_2 * i as f64 / n as f64;
        let azimuth = FRAC_PI_2 * j as f64 / n as f64;
        let d = Vector3::new(polar.sin() * azimuth.cos(), polar.sin() * azimuth.sin(), polar.cos());
        let t = if outer {
            d.iter()
                .filter(|c| **c > 1e-12)
                .map(|c| reach / c)
                .fold(f64::INFINITY, f64::min)
        } else {
            r
        };
        *center + signs.component_mul(&(d * t))
    };

    let mut mesh = Mesh::new();
    let mut quad = |a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, d: Point3<f64>| {
        for [p, q, s] in [[a, b, c], [a, c, d]] {
            if (q - p).cross(&(s - p)).norm() > 1e-12 {
                mesh.push_triangle(p, q, s);
            }
        }
    };

    for i in 0..n {
        for j in 0..n {
            // Sphere patch and outer cube surface
            quad(point(i, j, false), point(i, j + 1, false), point(i + 1, j + 1, false), point(i + 1, j, false));
            quad(point(i, j, true), point(i + 1, j, true), point(i + 1, j + 1, true), point(i, j + 1, true));
        }
    }
    for k in 0..n {
        // Walls at azimuth 0 and 90 degrees, then the equator floor
        quad(point(k, 0, false), point(k + 1, 0, false), point(k + 1, 0, true), point(k, 0, true));
        quad(point(k, n, false), point(k, n, true), point(k + 1, n, true), point(k + 1, n, false));
        quad(point(n, k, false), point(n, k + 1, false), point(n, k + 1, true), point(n, k, true));
    }

    let mesh = weld_vertices(&mesh, 1e-9);
    if mesh.signed_volume() < 0.0 {
        mesh.flipped()
    } else {
        mesh
    }
}
