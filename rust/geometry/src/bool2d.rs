// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations
//!
//! Polygon booleans on top of the i_overlay crate. They merge glyph
//! outlines and trim faces during convex clipping.

use crate::profile::Profile2D;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

pub use i_overlay::core::fill_rule::FillRule;
pub use i_overlay::core::overlay_rule::OverlayRule;

/// Minimum area threshold - polygons smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// Run a boolean between two contour sets and return every resulting shape
/// as a profile (outer boundary plus holes)
pub fn overlay_profiles(
    subject: &[Vec<Point2<f64>>],
    clip: &[Vec<Point2<f64>>],
    rule: OverlayRule,
    fill: FillRule,
) -> Vec<Profile2D> {
    let subject_paths: Vec<Vec<[f64; 2]>> = subject
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| contour_to_path(c))
        .collect();
    let clip_paths: Vec<Vec<[f64; 2]>> = clip
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| contour_to_path(c))
        .collect();

    if subject_paths.is_empty() && clip_paths.is_empty() {
        return Vec::new();
    }

    let shapes = subject_paths.overlay(&clip_paths, rule, fill);
    shapes_to_profiles(&shapes)
}

/// Union contours under the non-zero rule, resolving overlaps, letter
/// counters and fragments into clean shapes
pub fn merge_contours(contours: &[Vec<Point2<f64>>]) -> Vec<Profile2D> {
    overlay_profiles(contours, &[], OverlayRule::Union, FillRule::NonZero)
}

/// Pair outer contours with their holes by containment depth
///
/// A contour nested inside an odd number of other contours is a hole of
/// the smallest contour that contains it.
pub fn nest_contours(contours: &[Vec<Point2<f64>>]) -> Vec<Profile2D> {
    let contours: Vec<&Vec<Point2<f64>>> =
        contours.iter().filter(|c| is_valid_contour(c)).collect();

    let containers: Vec<Vec<usize>> = contours
        .iter()
        .enumerate()
        .map(|(i, inner)| {
            contours
                .iter()
                .enumerate()
                .filter(|(j, outer)| *j != i && contour_inside_contour(inner, outer))
                .map(|(j, _)| j)
                .collect()
        })
        .collect();

    let mut profiles: Vec<Profile2D> = Vec::new();
    let mut profile_of: Vec<Option<usize>> = vec![None; contours.len()];

    for (i, contour) in contours.iter().enumerate() {
        if containers[i].len() % 2 == 0 {
            profile_of[i] = Some(profiles.len());
            profiles.push(Profile2D::new(ensure_ccw(contour)));
        }
    }

    for (i, contour) in contours.iter().enumerate() {
        if containers[i].len() % 2 == 1 {
            // Direct parent: the container with the deepest nesting itself
            let parent = containers[i]
                .iter()
                .copied()
                .max_by_key(|&j| containers[j].len())
                .and_then(|j| profile_of[j]);
            if let Some(p) = parent {
                profiles[p].add_hole(ensure_cw(contour));
            }
        }
    }

    profiles
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }
    if contour.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return false;
    }

    compute_signed_area(contour).abs() > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if compute_signed_area(contour) > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Check if contour A is completely inside contour B
pub fn contour_inside_contour(inner: &[Point2<f64>], outer: &[Point2<f64>]) -> bool {
    inner.iter().all(|p| point_in_contour(p, outer))
}

/// Compute bounding box of a contour
pub fn contour_bounds(contour: &[Point2<f64>]) -> Option<(Point2<f64>, Point2<f64>)> {
    let first = contour.first()?;
    let mut min = *first;
    let mut max = *first;

    for p in contour.iter().skip(1) {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }

    Some((min, max))
}

/// Flatten a profile into its contours (outer first)
pub fn profile_to_contours(profile: &Profile2D) -> Vec<Vec<Point2<f64>>> {
    let mut contours = Vec::with_capacity(1 + profile.holes.len());
    contours.push(ensure_ccw(&profile.outer));
    for hole in &profile.holes {
        contours.push(ensure_cw(hole));
    }
    contours
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

/// Convert i_overlay result shapes to profiles
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>>: shapes, each a list of
/// contours where the first is the outer boundary.
fn shapes_to_profiles(shapes: &[Vec<Vec<[f64; 2]>>]) -> Vec<Profile2D> {
    let mut profiles = Vec::with_capacity(shapes.len());

    for shape in shapes {
        let mut contours = shape
            .iter()
            .map(|c| c.iter().map(|p| Point2::new(p[0], p[1])).collect::<Vec<_>>());

        let Some(outer) = contours.next() else {
            continue;
        };
        if !is_valid_contour(&outer) {
            continue;
        }

        let mut profile = Profile2D::new(ensure_ccw(&outer));
        for hole in contours {
            if is_valid_contour(&hole) {
                profile.add_hole(ensure_cw(&hole));
            }
        }
        profiles.push(profile);
    }

    profiles
}
