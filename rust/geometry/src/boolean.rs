// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boolean Engine
//!
//! Union, difference and intersection over an ordered list of kernels. The
//! first kernel whose result passes validation wins; when every kernel
//! fails the engine falls back to a safe mesh (concatenation for union,
//! the first operand otherwise) and reports it as degraded.

use crate::csg::{csgrs_to_mesh, mesh_to_csgrs, ClippingProcessor, ConvexSolid};
use crate::diagnostics::{Degraded, Outcome, Stage};
use crate::error::{Error, Result};
use crate::mesh::{BoundingBox, Mesh};
use crate::repair::{connected_components, weld_vertices};
use crate::settings::GeometrySettings;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Boolean operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Union,
    Difference,
    Intersection,
}

impl BooleanOp {
    pub fn stage(self) -> Stage {
        match self {
            BooleanOp::Union => Stage::Union,
            BooleanOp::Difference => Stage::Difference,
            BooleanOp::Intersection => Stage::Intersection,
        }
    }
}

/// One boolean strategy
///
/// Kernels may fail freely; the engine validates whatever they return.
pub trait BooleanKernel: Send + Sync {
    fn name(&self) -> &'static str;

    fn union(&self, a: &Mesh, b: &Mesh) -> Result<Mesh>;

    fn difference(&self, a: &Mesh, b: &Mesh) -> Result<Mesh>;

    fn intersection(&self, a: &Mesh, b: &Mesh) -> Result<Mesh>;

    fn apply(&self, op: BooleanOp, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        match op {
            BooleanOp::Union => self.union(a, b),
            BooleanOp::Difference => self.difference(a, b),
            BooleanOp::Intersection => self.intersection(a, b),
        }
    }
}

/// BSP-tree CSG from csgrs
///
/// Inputs and results above the polygon budget are refused, and panics
/// inside csgrs are caught and reported as kernel failures.
pub struct CsgrsKernel {
    max_polygons: usize,
    weld_epsilon: f64,
}

impl CsgrsKernel {
    pub fn new(max_polygons: usize, weld_epsilon: f64) -> Self {
        Self {
            max_polygons,
            weld_epsilon,
        }
    }

    fn run(&self, op: BooleanOp, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        use csgrs::traits::CSG;

        let polygons = a.triangle_count() + b.triangle_count();
        if polygons > self.max_polygons {
            return Err(Error::kernel(
                "csgrs",
                format!("{} polygons exceed budget of {}", polygons, self.max_polygons),
            ));
        }

        let result = catch_unwind(AssertUnwindSafe(|| {
            let a = mesh_to_csgrs(a);
            let b = mesh_to_csgrs(b);
            let combined = match op {
                BooleanOp::Union => a.union(&b),
                BooleanOp::Difference => a.difference(&b),
                BooleanOp::Intersection => a.intersection(&b),
            };
            csgrs_to_mesh(&combined)
        }))
        .map_err(|_| Error::kernel("csgrs", "panicked"))?;

        // An oversized result would blow the budget of every later step
        if result.triangle_count() > self.max_polygons {
            return Err(Error::kernel(
                "csgrs",
                format!("result of {} polygons exceeds budget of {}", result.triangle_count(), self.max_polygons),
            ));
        }

        Ok(weld_vertices(&result, self.weld_epsilon))
    }
}

impl BooleanKernel for CsgrsKernel {
    fn name(&self) -> &'static str {
        "csgrs"
    }

    fn union(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        self.run(BooleanOp::Union, a, b)
    }

    fn difference(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        self.run(BooleanOp::Difference, a, b)
    }

    fn intersection(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        self.run(BooleanOp::Intersection, a, b)
    }
}

/// Plane-clipping boolean against convex operands
///
/// The second operand (or either, for union and intersection) must split
/// into convex connected components. Components are applied one after the
/// other.
pub struct ClippingKernel {
    processor: ClippingProcessor,
}

impl ClippingKernel {
    pub fn new(epsilon: f64) -> Self {
        Self {
            processor: ClippingProcessor { epsilon },
        }
    }

    fn convex_pieces(&self, mesh: &Mesh) -> Option<Vec<ConvexSolid>> {
        connected_components(mesh)
            .iter()
            .map(|component| ConvexSolid::from_mesh(component, self.processor.epsilon))
            .collect()
    }

    /// Pick the non-convex subject and the convex pieces for a commutative op
    fn commutative_operands<'a>(&self, a: &'a Mesh, b: &'a Mesh) -> Result<(&'a Mesh, Vec<ConvexSolid>)> {
        if let Some(pieces) = self.convex_pieces(b) {
            return Ok((a, pieces));
        }
        if let Some(pieces) = self.convex_pieces(a) {
            return Ok((b, pieces));
        }
        Err(Error::kernel("clipping", "neither operand is a set of convex solids"))
    }
}

impl BooleanKernel for ClippingKernel {
    fn name(&self) -> &'static str {
        "clipping"
    }

    fn union(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        let (subject, pieces) = self.commutative_operands(a, b)?;
        let mut current = subject.clone();
        for piece in &pieces {
            current = self.processor.boolean_convex(&current, piece, BooleanOp::Union)?;
        }
        Ok(current)
    }

    fn difference(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        let pieces = self
            .convex_pieces(b)
            .ok_or_else(|| Error::kernel("clipping", "subtrahend is not a set of convex solids"))?;
        let mut current = a.clone();
        for piece in &pieces {
            current = self.processor.boolean_convex(&current, piece, BooleanOp::Difference)?;
        }
        Ok(current)
    }

    fn intersection(&self, a: &Mesh, b: &Mesh) -> Result<Mesh> {
        let (subject, pieces) = self.commutative_operands(a, b)?;
        match pieces.as_slice() {
            [piece] => self.processor.boolean_convex(subject, piece, BooleanOp::Intersection),
            _ => Err(Error::kernel("clipping", "intersection needs a single convex operand")),
        }
    }
}

/// Ordered boolean strategies with validation and fallbacks
pub struct BooleanEngine {
    kernels: Vec<Box<dyn BooleanKernel>>,
}

impl BooleanEngine {
    /// csgrs first, then plane clipping
    pub fn new(settings: &GeometrySettings) -> Self {
        Self::with_kernels(vec![
            Box::new(CsgrsKernel::new(settings.max_csg_polygons, settings.weld_epsilon)),
            Box::new(ClippingKernel::new(1e-6)),
        ])
    }

    pub fn with_kernels(kernels: Vec<Box<dyn BooleanKernel>>) -> Self {
        Self { kernels }
    }

    pub fn kernel_names(&self) -> Vec<&'static str> {
        self.kernels.iter().map(|k| k.name()).collect()
    }

    /// Union of all operands
    ///
    /// Operands are folded left to right; a step that no kernel can do
    /// concatenates instead, and the result is reported as degraded.
    pub fn union(&self, meshes: &[Mesh]) -> Outcome {
        let mut operands = meshes.iter().filter(|m| !m.is_empty());
        let Some(first) = operands.next() else {
            return Err(Degraded::new(Mesh::new(), Stage::Union, "no non-empty operands"));
        };

        let mut current = first.clone();
        let mut failed_steps = 0usize;
        for next in operands {
            current = match self.attempt(BooleanOp::Union, &current, next) {
                Some(mesh) => mesh,
                None => {
                    failed_steps += 1;
                    Mesh::concatenate(&[current, next.clone()])
                }
            };
        }

        if failed_steps > 0 {
            tracing::warn!(failed_steps, operands = meshes.len(), "Union strategies exhausted, concatenating");
            return Err(Degraded::new(
                current,
                Stage::Union,
                format!("{} union step(s) fell back to concatenation", failed_steps),
            ));
        }
        Ok(current)
    }

    /// `a` minus `b`; `a` itself when every kernel fails
    pub fn difference(&self, a: &Mesh, b: &Mesh) -> Outcome {
        if b.is_empty() {
            return Ok(a.clone());
        }
        if a.is_empty() {
            return Err(Degraded::new(Mesh::new(), Stage::Difference, "minuend is empty"));
        }
        // Disjoint operands leave a untouched
        if !a.bounds().overlaps(&b.bounds(), 0.0) {
            return Ok(a.clone());
        }

        match self.attempt(BooleanOp::Difference, a, b) {
            Some(mesh) => Ok(mesh),
            None => {
                tracing::warn!(kernels = ?self.kernel_names(), "Difference strategies exhausted, keeping minuend");
                Err(Degraded::new(a.clone(), Stage::Difference, "all kernels failed, minuend kept"))
            }
        }
    }

    /// Intersection of all operands; the first operand when it cannot be
    /// computed
    pub fn intersection(&self, meshes: &[Mesh]) -> Outcome {
        let operands: Vec<&Mesh> = meshes.iter().filter(|m| !m.is_empty()).collect();
        let first = meshes.first().cloned().unwrap_or_default();
        if operands.len() < 2 {
            return Err(Degraded::new(first, Stage::Intersection, "fewer than two non-empty operands"));
        }

        let mut current = operands[0].clone();
        for next in &operands[1..] {
            match self.attempt(BooleanOp::Intersection, &current, next) {
                Some(mesh) => current = mesh,
                None => {
                    tracing::warn!(kernels = ?self.kernel_names(), "Intersection strategies exhausted, keeping first operand");
                    return Err(Degraded::new(first, Stage::Intersection, "all kernels failed, first operand kept"));
                }
            }
        }
        Ok(current)
    }

    fn attempt(&self, op: BooleanOp, a: &Mesh, b: &Mesh) -> Option<Mesh> {
        for kernel in &self.kernels {
            match kernel.apply(op, a, b) {
                Ok(mesh) => match validate(op, a, b, &mesh) {
                    Ok(()) => {
                        tracing::debug!(kernel = kernel.name(), ?op, triangles = mesh.triangle_count(), "Boolean succeeded");
                        return Some(mesh);
                    }
                    Err(reason) => {
                        tracing::debug!(kernel = kernel.name(), ?op, reason, "Boolean result rejected");
                    }
                },
                Err(e) => {
                    tracing::debug!(kernel = kernel.name(), ?op, error = %e, "Boolean kernel failed");
                }
            }
        }
        None
    }
}

/// Check a kernel result against what the operation can produce
fn validate(op: BooleanOp, a: &Mesh, b: &Mesh, result: &Mesh) -> std::result::Result<(), &'static str> {
    if result.is_empty() {
        return Err("empty result");
    }
    if !result.is_finite() {
        return Err("non-finite coordinates");
    }

    let (box_a, box_b, box_r) = (a.bounds(), b.bounds(), result.bounds());
    let tolerance = 1e-6 * box_a.union(&box_b).diagonal().max(1.0);
    let envelope: Option<BoundingBox> = match op {
        BooleanOp::Difference => Some(box_a),
        BooleanOp::Union => Some(box_a.union(&box_b)),
        BooleanOp::Intersection => box_a.intersection(&box_b),
    };
    match envelope {
        Some(envelope) if envelope.contains_box(&box_r, tolerance) => {}
        _ => return Err("bounding box outside operand envelope"),
    }

    let (vol_a, vol_b, vol_r) = (a.signed_volume(), b.signed_volume(), result.signed_volume());
    let slack = |v: f64| 1e-6 * v.abs() + 1e-9;
    let consistent = match op {
        BooleanOp::Difference => vol_r <= vol_a + slack(vol_a),
        BooleanOp::Union => {
            let largest = vol_a.max(vol_b);
            vol_r >= largest - slack(largest)
        }
        BooleanOp::Intersection => {
            let smallest = vol_a.min(vol_b);
            vol_r <= smallest + slack(smallest)
        }
    };
    if !consistent || vol_r <= 0.0 {
        return Err("enclosed volume inconsistent with operation");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{box_mesh, cylinder};
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    struct FailingKernel;

    impl BooleanKernel for FailingKernel {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn union(&self, _: &Mesh, _: &Mesh) -> Result<Mesh> {
            Err(Error::kernel("failing", "always"))
        }
        fn difference(&self, _: &Mesh, _: &Mesh) -> Result<Mesh> {
            Err(Error::kernel("failing", "always"))
        }
        fn intersection(&self, _: &Mesh, _: &Mesh) -> Result<Mesh> {
            Err(Error::kernel("failing", "always"))
        }
    }

    /// Returns the first operand grown, which validation must reject
    struct BogusKernel;

    impl BooleanKernel for BogusKernel {
        fn name(&self) -> &'static str {
            "bogus"
        }
        fn union(&self, a: &Mesh, _: &Mesh) -> Result<Mesh> {
            Ok(a.clone())
        }
        fn difference(&self, a: &Mesh, _: &Mesh) -> Result<Mesh> {
            Ok(a.translated(Vector3::new(100.0, 0.0, 0.0)))
        }
        fn intersection(&self, a: &Mesh, _: &Mesh) -> Result<Mesh> {
            Ok(a.clone())
        }
    }

    fn clipping_only() -> BooleanEngine {
        BooleanEngine::with_kernels(vec![Box::new(ClippingKernel::new(1e-6))])
    }

    #[test]
    fn test_difference_with_empty_subtrahend_is_identity() {
        let engine = BooleanEngine::new(&GeometrySettings::default());
        let a = box_mesh(10.0, 10.0, 10.0);
        assert_eq!(engine.difference(&a, &Mesh::new()).unwrap(), a);
    }

    #[test]
    fn test_difference_falls_back_to_minuend() {
        let engine = BooleanEngine::with_kernels(vec![Box::new(FailingKernel), Box::new(BogusKernel)]);
        let a = box_mesh(10.0, 10.0, 10.0);
        let b = box_mesh(2.0, 2.0, 20.0);

        let degraded = engine.difference(&a, &b).unwrap_err();
        assert_eq!(degraded.mesh, a);
        assert_eq!(degraded.report.stage, Stage::Difference);
    }

    #[test]
    fn test_union_falls_back_to_concatenation() {
        let engine = BooleanEngine::with_kernels(vec![Box::new(FailingKernel)]);
        let a = box_mesh(1.0, 1.0, 1.0);
        let b = box_mesh(1.0, 1.0, 1.0).translated(Vector3::new(0.5, 0.0, 0.0));

        let degraded = engine.union(&[a.clone(), b.clone()]).unwrap_err();
        assert_eq!(degraded.mesh.triangle_count(), a.triangle_count() + b.triangle_count());
        assert_eq!(degraded.report.stage, Stage::Union);
    }

    #[test]
    fn test_union_of_one_operand_is_clean() {
        let engine = BooleanEngine::with_kernels(vec![Box::new(FailingKernel)]);
        let a = box_mesh(1.0, 2.0, 3.0);
        assert_eq!(engine.union(&[a.clone(), Mesh::new()]).unwrap(), a);
    }

    #[test]
    fn test_intersection_falls_back_to_first_operand() {
        let engine = BooleanEngine::with_kernels(vec![Box::new(FailingKernel)]);
        let a = box_mesh(1.0, 1.0, 1.0);
        let b = box_mesh(2.0, 2.0, 2.0);

        assert_eq!(engine.intersection(&[a.clone(), b]).unwrap_err().mesh, a);
        assert_eq!(engine.intersection(&[a.clone()]).unwrap_err().mesh, a);
    }

    #[test]
    fn test_clipping_kernel_drills_box() {
        let engine = clipping_only();
        let plate = box_mesh(40.0, 40.0, 4.0);
        let drill = cylinder(3.0, 20.0, 32);

        let drilled = engine.difference(&plate, &drill).unwrap();
        let removed = plate.signed_volume() - drilled.signed_volume();
        assert_relative_eq!(removed, drill.signed_volume() * 4.0 / 20.0, epsilon = 1e-6);
        assert_relative_eq!(drilled.bounds().size().x, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_clipping_kernel_union_with_convex_pieces() {
        let engine = clipping_only();
        let base = box_mesh(10.0, 10.0, 2.0);
        let posts = Mesh::concatenate(&[
            box_mesh(1.0, 1.0, 4.0).translated(Vector3::new(-3.0, 0.0, 2.0)),
            box_mesh(1.0, 1.0, 4.0).translated(Vector3::new(3.0, 0.0, 2.0)),
        ]);

        let merged = engine.union(&[base.clone(), posts]).unwrap();
        // Each post sinks 1 mm into the base
        assert_relative_eq!(merged.signed_volume(), 200.0 + 2.0 * 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_csgrs_refuses_results_over_budget() {
        let a = box_mesh(10.0, 10.0, 2.0);
        let b = cylinder(2.0, 10.0, 8);
        let budget = a.triangle_count() + b.triangle_count();

        let tight = CsgrsKernel::new(budget, 1e-6);
        assert!(matches!(tight.difference(&a, &b), Err(Error::Kernel { .. })));

        let roomy = CsgrsKernel::new(10_000, 1e-6);
        let drilled = roomy.difference(&a, &b).unwrap();
        assert!(drilled.triangle_count() > budget);
    }

    #[test]
    fn test_validation_rejects_grown_difference() {
        let a = box_mesh(2.0, 2.0, 2.0);
        let b = box_mesh(1.0, 1.0, 1.0);
        let bigger = box_mesh(3.0, 3.0, 3.0);
        assert!(validate(BooleanOp::Difference, &a, &b, &bigger).is_err());
        assert!(validate(BooleanOp::Difference, &a, &b, &Mesh::new()).is_err());
        assert!(validate(BooleanOp::Union, &a, &b, &a).is_ok());
    }
}
