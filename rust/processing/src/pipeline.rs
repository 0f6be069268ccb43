// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generation pipeline
//!
//! Resolve the model, merge parameters over its defaults, run the builder
//! and always finish with mesh repair. Geometry failures degrade the result
//! and are returned as diagnostics; the only error is an unknown model id.

use crate::config::Config;
use crate::error::Result;
use crate::params::{self, ParamSet};
use crate::registry::ModelRegistry;
use crate::request::GenerateRequest;
use partforge_geometry::text::apply_text_ops;
use partforge_geometry::{
    cut_box, drill_holes, repair, round_top_edges, rounded_box, rounded_shell, BooleanEngine, DegradedGeometry,
    Diagnostics, FontProvider, GeometrySettings, HoleSpec, Mesh, Outcome, Point3, SystemFontProvider, TextOp,
    Vector3,
};
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

/// Something a caller should know about a generated part
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A geometry stage fell back to a simpler result
    Degraded(DegradedGeometry),
    /// A request value was rejected and the default used instead
    InvalidParameter { name: String, reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Degraded(report) => write!(f, "degraded {}: {}", report.stage, report.detail),
            Self::InvalidParameter { name, reason } => write!(f, "invalid parameter '{}': {}", name, reason),
        }
    }
}

/// A finished part
#[derive(Debug, Clone)]
pub struct Generated {
    pub mesh: Mesh,
    pub diagnostics: Vec<Diagnostic>,
    /// Canonical id of the model that was built
    pub model_id: String,
}

impl Generated {
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.iter().any(|d| matches!(d, Diagnostic::Degraded(_)))
    }
}

/// Shared state handed to model builders
///
/// Every geometry helper absorbs its outcome, so builders always get a mesh
/// back and degradations accumulate here.
pub struct BuildContext<'a> {
    engine: &'a BooleanEngine,
    settings: &'a GeometrySettings,
    fonts: &'a dyn FontProvider,
    diagnostics: Diagnostics,
}

impl<'a> BuildContext<'a> {
    pub fn new(engine: &'a BooleanEngine, settings: &'a GeometrySettings, fonts: &'a dyn FontProvider) -> Self {
        Self {
            engine,
            settings,
            fonts,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn settings(&self) -> &GeometrySettings {
        self.settings
    }

    /// Polygon sections for round features
    pub fn sections(&self) -> usize {
        self.settings.cylinder_sections
    }

    fn absorb(&mut self, outcome: Outcome) -> Mesh {
        self.diagnostics.absorb(outcome)
    }

    pub fn union(&mut self, parts: &[Mesh]) -> Mesh {
        let outcome = self.engine.union(parts);
        self.absorb(outcome)
    }

    pub fn difference(&mut self, a: &Mesh, b: &Mesh) -> Mesh {
        let outcome = self.engine.difference(a, b);
        self.absorb(outcome)
    }

    pub fn drill(&mut self, mesh: &Mesh, holes: &[HoleSpec]) -> Mesh {
        if holes.iter().all(|h| !h.is_drillable()) {
            return mesh.clone();
        }
        let outcome = drill_holes(self.engine, mesh, holes, self.settings);
        self.absorb(outcome)
    }

    /// Cut an axis-aligned box pocket
    pub fn pocket(&mut self, mesh: &Mesh, center: Point3<f64>, size: Vector3<f64>) -> Mesh {
        let outcome = cut_box(self.engine, mesh, center, size);
        self.absorb(outcome)
    }

    pub fn round_top(&mut self, mesh: &Mesh, radius: f64) -> Mesh {
        let outcome = round_top_edges(self.engine, mesh, radius, self.settings);
        self.absorb(outcome)
    }

    pub fn rounded_box(&mut self, length: f64, width: f64, height: f64, radius: f64) -> Mesh {
        let outcome = rounded_box(self.engine, length, width, height, radius, self.settings);
        self.absorb(outcome)
    }

    /// Open-top shell, centered on the origin
    pub fn shell(&mut self, length: f64, width: f64, height: f64, wall: f64, radius: f64) -> Mesh {
        let outcome = rounded_shell(self.engine, length, width, height, wall, radius, self.settings);
        self.absorb(outcome)
    }

    pub fn relief(&mut self, mesh: &Mesh, ops: &[TextOp]) -> Mesh {
        apply_text_ops(self.engine, mesh, ops, self.settings, self.fonts, &mut self.diagnostics)
    }

    /// Drill the requested holes, then apply text reliefs
    pub fn finish(&mut self, body: &Mesh, holes: &[HoleSpec], text_ops: &[TextOp]) -> Mesh {
        let drilled = self.drill(body, holes);
        self.relief(&drilled, text_ops)
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }
}

/// Generation entry point holding the shared read-only state
pub struct Generator {
    registry: &'static ModelRegistry,
    settings: GeometrySettings,
    engine: BooleanEngine,
    fonts: Box<dyn FontProvider>,
}

impl Generator {
    /// Generator over the built-in catalogue with system fonts
    pub fn new(settings: GeometrySettings) -> Self {
        let fonts = SystemFontProvider::new(settings.default_font.clone());
        Self {
            registry: ModelRegistry::global(),
            engine: BooleanEngine::new(&settings),
            settings,
            fonts: Box::new(fonts),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.geometry_settings())
    }

    pub fn with_fonts(mut self, fonts: impl FontProvider + 'static) -> Self {
        self.fonts = Box::new(fonts);
        self
    }

    pub fn with_registry(mut self, registry: &'static ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_engine(mut self, engine: BooleanEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.registry
    }

    pub fn settings(&self) -> &GeometrySettings {
        &self.settings
    }

    /// Build one part
    pub fn generate(
        &self,
        model_id: &str,
        params: &ParamSet,
        holes: &[HoleSpec],
        text_ops: &[TextOp],
    ) -> Result<Generated> {
        let started = Instant::now();
        let entry = self.registry.lookup(model_id)?;

        let mut diagnostics = Vec::new();
        let resolved = params::resolve(entry.defaults, params, &mut diagnostics);

        let mut ctx = BuildContext::new(&self.engine, &self.settings, self.fonts.as_ref());
        let built = (entry.builder)(&mut ctx, &resolved, holes, text_ops);
        let outcome = repair(&built, &self.settings);
        let mesh = ctx.absorb(outcome);

        diagnostics.extend(ctx.into_diagnostics().into_reports().into_iter().map(Diagnostic::Degraded));

        tracing::info!(
            model = entry.id,
            triangles = mesh.triangle_count(),
            diagnostics = diagnostics.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated part"
        );

        Ok(Generated {
            mesh,
            diagnostics,
            model_id: entry.id.to_string(),
        })
    }

    /// Build the part a request describes
    pub fn generate_request(&self, request: &GenerateRequest) -> Result<Generated> {
        let (holes, text_ops) = (request.hole_specs(), request.text_ops());
        self.generate(&request.model, &request.params, &holes, &text_ops)
    }
}

impl Default for Generator {
    fn default() -> Self {
        Self::from_config(&Config::from_env())
    }
}

static DEFAULT_GENERATOR: OnceLock<Generator> = OnceLock::new();

/// Build one part with the environment-configured generator
pub fn generate(model_id: &str, params: &ParamSet, holes: &[HoleSpec], text_ops: &[TextOp]) -> Result<Generated> {
    DEFAULT_GENERATOR
        .get_or_init(Generator::default)
        .generate(model_id, params, holes, text_ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::params::ParamValue;
    use partforge_geometry::{is_watertight, Stage};

    fn generator() -> Generator {
        Generator::new(GeometrySettings::default()).with_fonts(SystemFontProvider::builtin_only())
    }

    #[test]
    fn unknown_model_is_the_only_error() {
        let err = generator()
            .generate("unknown_model_xyz", &ParamSet::new(), &[], &[])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownModel { ref id, .. } if id == "unknown_model_xyz"));
    }

    #[test]
    fn canonical_id_is_reported() {
        let generated = generator().generate("Camera-Plate", &ParamSet::new(), &[], &[]).unwrap();
        assert_eq!(generated.model_id, "camera_plate");
        assert!(is_watertight(&generated.mesh));
        assert!(generated.diagnostics.is_empty(), "{:?}", generated.diagnostics);
    }

    #[test]
    fn invalid_parameters_are_reported_not_fatal() {
        let mut params = ParamSet::new();
        params.insert("length".into(), ParamValue::Number(-5.0));
        params.insert("width".into(), ParamValue::Text("wide".into()));
        let generated = generator().generate("camera_plate", &params, &[], &[]).unwrap();

        let size = generated.mesh.bounds().size();
        assert!((size.x - 120.0).abs() < 1e-6);
        assert!((size.y - 60.0).abs() < 1e-6);
        let invalid = generated
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::InvalidParameter { .. }))
            .count();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn degraded_stages_surface_as_diagnostics() {
        let generator = generator().with_engine(BooleanEngine::with_kernels(Vec::new()));
        let holes = [HoleSpec::new(5.0, partforge_geometry::Axis::Z)];
        let generated = generator.generate("camera_plate", &ParamSet::new(), &holes, &[]).unwrap();

        assert!(generated.is_degraded());
        assert!(!generated.mesh.is_empty());
        assert!(generated
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::Degraded(r) if r.stage == Stage::Holes)));
    }

    #[test]
    fn diagnostics_render_readably() {
        let note = Diagnostic::InvalidParameter {
            name: "width".into(),
            reason: "-3 is negative".into(),
        };
        assert_eq!(note.to_string(), "invalid parameter 'width': -3 is negative");
    }
}
