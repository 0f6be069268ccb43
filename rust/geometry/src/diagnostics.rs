// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Degraded-geometry reporting
//!
//! Expected degradation (a hole that could not be cut, text left un-carved,
//! a hull-replaced mesh) is never an error. Internal steps return
//! `Result<Mesh, Degraded>`: the error side still carries a usable mesh and
//! the report explaining what was lost.

use crate::mesh::Mesh;
use std::fmt;

/// Pipeline stage that degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Union,
    Difference,
    Intersection,
    Holes,
    Rounding,
    Text,
    Repair,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Union => "union",
            Stage::Difference => "difference",
            Stage::Intersection => "intersection",
            Stage::Holes => "holes",
            Stage::Rounding => "rounding",
            Stage::Text => "text",
            Stage::Repair => "repair",
        };
        f.write_str(name)
    }
}

/// Quality report for an operation that completed with a fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedGeometry {
    pub stage: Stage,
    pub detail: String,
}

impl DegradedGeometry {
    pub fn new(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for DegradedGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.detail)
    }
}

/// A fallback mesh together with the reason it is a fallback
#[derive(Debug, Clone)]
pub struct Degraded {
    pub mesh: Mesh,
    pub report: DegradedGeometry,
}

impl Degraded {
    pub fn new(mesh: Mesh, stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            mesh,
            report: DegradedGeometry::new(stage, detail),
        }
    }

    /// Re-attribute the report to an outer stage, keeping the detail
    pub fn within(mut self, stage: Stage) -> Self {
        if self.report.stage != stage {
            self.report.detail = format!("{} ({})", self.report.detail, self.report.stage);
            self.report.stage = stage;
        }
        self
    }
}

/// Outcome of a mesh-producing step
pub type Outcome = std::result::Result<Mesh, Degraded>;

/// Collects degradation reports while a part is built
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    reports: Vec<DegradedGeometry>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unwrap an outcome, recording the report when it degraded
    pub fn absorb(&mut self, outcome: Outcome) -> Mesh {
        match outcome {
            Ok(mesh) => mesh,
            Err(degraded) => {
                tracing::debug!(stage = %degraded.report.stage, detail = %degraded.report.detail, "Geometry degraded");
                self.reports.push(degraded.report);
                degraded.mesh
            }
        }
    }

    pub fn push(&mut self, report: DegradedGeometry) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[DegradedGeometry] {
        &self.reports
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn into_reports(self) -> Vec<DegradedGeometry> {
        self.reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::box_mesh;

    #[test]
    fn test_absorb_keeps_fallback_mesh() {
        let mut diagnostics = Diagnostics::new();
        let fallback = box_mesh(1.0, 1.0, 1.0);
        let mesh = diagnostics.absorb(Err(Degraded::new(fallback.clone(), Stage::Difference, "kernels exhausted")));

        assert_eq!(mesh, fallback);
        assert_eq!(diagnostics.reports().len(), 1);
        assert_eq!(diagnostics.reports()[0].to_string(), "difference: kernels exhausted");
    }

    #[test]
    fn test_within_reattributes_stage() {
        let degraded = Degraded::new(Mesh::new(), Stage::Difference, "kernels exhausted").within(Stage::Holes);
        assert_eq!(degraded.report.stage, Stage::Holes);
        assert!(degraded.report.detail.contains("difference"));
    }
}
