// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hole Driller
//!
//! Turns hole specs into cylindrical cutters and subtracts them from a part
//! in a single difference.

use crate::boolean::BooleanEngine;
use crate::diagnostics::{Outcome, Stage};
use crate::mesh::{BoundingBox, Mesh};
use crate::primitives::{box_mesh, cylinder_along, Axis, MIN_DIMENSION};
use crate::settings::GeometrySettings;
use nalgebra::{Point3, Vector3};

/// Extra cutter length beyond four times the part extent (mm)
const CUTTER_MARGIN: f64 = 6.0;

/// A through-hole request
///
/// Missing coordinates take the part's centroid on that axis.
#[derive(Debug, Clone, PartialEq)]
pub struct HoleSpec {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub diameter: f64,
    pub axis: Axis,
}

impl HoleSpec {
    pub fn new(diameter: f64, axis: Axis) -> Self {
        Self {
            x: None,
            y: None,
            z: None,
            diameter,
            axis,
        }
    }

    pub fn at(mut self, x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    /// Holes with a non-positive or non-finite diameter are skipped
    pub fn is_drillable(&self) -> bool {
        self.diameter.is_finite() && self.diameter > 0.0
    }

    fn center(&self, fallback: &Point3<f64>) -> Point3<f64> {
        let pick = |v: Option<f64>, f: f64| v.filter(|c| c.is_finite()).unwrap_or(f);
        Point3::new(
            pick(self.x, fallback.x),
            pick(self.y, fallback.y),
            pick(self.z, fallback.z),
        )
    }
}

/// One positioned cutter with its footprint across the drilling axis
struct Cutter {
    axis: Axis,
    footprint: (f64, f64),
    radius: f64,
    bounds: BoundingBox,
    mesh: Mesh,
}

impl Cutter {
    /// Parallel cutters compare footprints; crossing ones compare boxes,
    /// which for axis-aligned cylinders only errs on the side of grouping
    fn overlaps(&self, other: &Cutter) -> bool {
        if self.axis == other.axis {
            let du = self.footprint.0 - other.footprint.0;
            let dv = self.footprint.1 - other.footprint.1;
            (du * du + dv * dv).sqrt() < self.radius + other.radius
        } else {
            self.bounds.overlaps(&other.bounds, 0.0)
        }
    }
}

fn make_cutter(hole: &HoleSpec, mesh: &Mesh, centroid: &Point3<f64>, sections: usize) -> Cutter {
    let extent = mesh.bounds().size()[hole.axis.index()];
    let length = 4.0 * extent.max(1.0) + CUTTER_MARGIN;
    let radius = (hole.diameter / 2.0).max(MIN_DIMENSION);
    let center = hole.center(centroid);

    let footprint = match hole.axis {
        Axis::X => (center.y, center.z),
        Axis::Y => (center.z, center.x),
        Axis::Z => (center.x, center.y),
    };

    let mesh = cylinder_along(radius, length, sections, hole.axis).translated(center.coords);
    Cutter {
        axis: hole.axis,
        footprint,
        radius,
        bounds: mesh.bounds(),
        mesh,
    }
}

/// Group cutters that overlap, directly or through a chain of others
fn group_cutters(cutters: &[Cutter]) -> Vec<Vec<usize>> {
    let mut group_of: Vec<usize> = (0..cutters.len()).collect();
    for i in 0..cutters.len() {
        for j in 0..i {
            if cutters[i].overlaps(&cutters[j]) {
                let (keep, drop) = (group_of[j].min(group_of[i]), group_of[j].max(group_of[i]));
                for g in group_of.iter_mut() {
                    if *g == drop {
                        *g = keep;
                    }
                }
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut slot: Vec<Option<usize>> = vec![None; cutters.len()];
    for (i, &g) in group_of.iter().enumerate() {
        match slot[g] {
            Some(s) => groups[s].push(i),
            None => {
                slot[g] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}

/// Drill every drillable hole through `mesh`
///
/// Overlapping cutters, parallel or crossing, are unioned into one,
/// disjoint ones concatenated,
/// and the result subtracted in one difference. When the difference
/// cannot be computed the part comes back undrilled as [`Degraded`](crate::Degraded).
pub fn drill_holes(engine: &BooleanEngine, mesh: &Mesh, holes: &[HoleSpec], settings: &GeometrySettings) -> Outcome {
    let drillable: Vec<&HoleSpec> = holes.iter().filter(|h| h.is_drillable()).collect();
    if drillable.len() < holes.len() {
        tracing::debug!(skipped = holes.len() - drillable.len(), "Skipping holes without a positive diameter");
    }
    if drillable.is_empty() || mesh.is_empty() {
        return Ok(mesh.clone());
    }

    let centroid = mesh.centroid();
    let cutters: Vec<Cutter> = drillable
        .iter()
        .map(|hole| make_cutter(hole, mesh, &centroid, settings.cylinder_sections))
        .collect();

    let mut combined = Mesh::new();
    for group in group_cutters(&cutters) {
        if let [only] = group.as_slice() {
            combined.merge(&cutters[*only].mesh);
            continue;
        }
        let members: Vec<Mesh> = group.iter().map(|&i| cutters[i].mesh.clone()).collect();
        match engine.union(&members) {
            Ok(merged) => combined.merge(&merged),
            Err(degraded) => {
                tracing::debug!(detail = %degraded.report, "Overlapping cutters kept separate");
                combined.merge(&degraded.mesh);
            }
        }
    }

    tracing::debug!(holes = cutters.len(), "Drilling holes");
    engine
        .difference(mesh, &combined)
        .map_err(|degraded| degraded.within(Stage::Holes))
}

/// Cut a rectangular pocket or slot centered at `center`
pub fn cut_box(engine: &BooleanEngine, mesh: &Mesh, center: Point3<f64>, size: Vector3<f64>) -> Outcome {
    let cutter = box_mesh(size.x, size.y, size.z).translated(center.coords);
    engine
        .difference(mesh, &cutter)
        .map_err(|degraded| degraded.within(Stage::Holes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::box_mesh;
    use approx::assert_relative_eq;

    fn setup() -> (BooleanEngine, GeometrySettings) {
        let settings = GeometrySettings::default();
        (BooleanEngine::new(&settings), settings)
    }

    #[test]
    fn test_non_positive_diameter_is_skipped() {
        let (engine, settings) = setup();
        let plate = box_mesh(50.0, 50.0, 5.0);
        let holes = [
            HoleSpec::new(0.0, Axis::Z),
            HoleSpec::new(-3.0, Axis::X),
            HoleSpec::new(f64::NAN, Axis::Y),
        ];
        assert_eq!(drill_holes(&engine, &plate, &holes, &settings).unwrap(), plate);
    }

    #[test]
    fn test_hole_reduces_volume_and_keeps_bounds() {
        let (engine, settings) = setup();
        let plate = box_mesh(50.0, 50.0, 5.0);
        let holes = [HoleSpec::new(6.0, Axis::Z).at(Some(10.0), None, None)];

        let drilled = drill_holes(&engine, &plate, &holes, &settings).unwrap();
        assert!(drilled.signed_volume() < plate.signed_volume());
        let size = drilled.bounds().size();
        assert_relative_eq!(size.x, 50.0, epsilon = 1e-6);
        assert_relative_eq!(size.z, 5.0, epsilon = 1e-6);
    }

    #[test]
    fn test_side_hole_along_x() {
        let (engine, settings) = setup();
        let block = box_mesh(30.0, 30.0, 30.0);
        let holes = [HoleSpec::new(8.0, Axis::X)];

        let drilled = drill_holes(&engine, &block, &holes, &settings).unwrap();
        let removed = block.signed_volume() - drilled.signed_volume();
        // Roughly a 4 mm radius bore through 30 mm
        assert!(removed > 0.9 * std::f64::consts::PI * 16.0 * 30.0);
        assert!(removed < std::f64::consts::PI * 16.0 * 30.0 + 1e-6);
    }

    #[test]
    fn test_overlapping_cutters_are_grouped() {
        let plate = box_mesh(60.0, 60.0, 4.0);
        let centroid = plate.centroid();
        let specs = [
            HoleSpec::new(6.0, Axis::Z).at(Some(0.0), Some(0.0), None),
            HoleSpec::new(6.0, Axis::Z).at(Some(4.0), Some(0.0), None),
            HoleSpec::new(6.0, Axis::Z).at(Some(20.0), Some(0.0), None),
            HoleSpec::new(6.0, Axis::X).at(None, Some(20.0), Some(0.0)),
        ];
        let cutters: Vec<Cutter> = specs
            .iter()
            .map(|h| make_cutter(h, &plate, &centroid, 24))
            .collect();

        assert_eq!(group_cutters(&cutters), vec![vec![0, 1], vec![2], vec![3]]);
    }

    #[test]
    fn test_crossing_cutters_are_grouped() {
        let block = box_mesh(30.0, 30.0, 30.0);
        let centroid = block.centroid();
        let specs = [
            HoleSpec::new(8.0, Axis::Z),
            HoleSpec::new(8.0, Axis::X),
            HoleSpec::new(8.0, Axis::Y).at(Some(10.0), None, Some(10.0)),
        ];
        let cutters: Vec<Cutter> = specs
            .iter()
            .map(|h| make_cutter(h, &block, &centroid, 24))
            .collect();

        assert_eq!(group_cutters(&cutters), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn test_crossing_holes_remove_their_overlap_once() {
        let (engine, settings) = setup();
        let block = box_mesh(30.0, 30.0, 30.0);
        let holes = [HoleSpec::new(8.0, Axis::Z), HoleSpec::new(8.0, Axis::X)];

        let drilled = drill_holes(&engine, &block, &holes, &settings).unwrap();
        let bore = cylinder_along(4.0, 30.0, settings.cylinder_sections, Axis::Z).signed_volume();
        let removed = block.signed_volume() - drilled.signed_volume();

        // Two bores minus their Steinmetz overlap (16/3 r^3 ~ 341)
        let steinmetz = 16.0 / 3.0 * 64.0;
        assert!(removed < 2.0 * bore - 0.8 * steinmetz, "removed {}", removed);
        assert!(removed > 2.0 * bore - 1.2 * steinmetz, "removed {}", removed);
    }

    #[test]
    fn test_cutter_length_covers_part() {
        let plate = box_mesh(60.0, 60.0, 4.0);
        let cutter = make_cutter(&HoleSpec::new(5.0, Axis::Z), &plate, &plate.centroid(), 24);
        assert_relative_eq!(cutter.mesh.bounds().size().z, 4.0 * 4.0 + 6.0, epsilon = 1e-9);

        let tiny = box_mesh(0.5, 0.5, 0.5);
        let cutter = make_cutter(&HoleSpec::new(5.0, Axis::X), &tiny, &tiny.centroid(), 24);
        assert_relative_eq!(cutter.mesh.bounds().size().x, 4.0 + 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cut_box_pocket() {
        let (engine, _) = setup();
        let block = box_mesh(20.0, 20.0, 10.0);
        let pocket = cut_box(
            &engine,
            &block,
            Point3::new(0.0, 0.0, 5.0),
            Vector3::new(10.0, 10.0, 4.0),
        )
        .unwrap();
        assert_relative_eq!(pocket.signed_volume(), 4000.0 - 200.0, epsilon = 1e-3);
    }
}
