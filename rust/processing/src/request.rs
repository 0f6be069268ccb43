// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request types for generation.

use crate::cache_key::request_key;
use crate::params::ParamSet;
use partforge_geometry::{Anchor, Axis, HoleSpec, ReliefMode, TextOp};
use serde::{Deserialize, Serialize};

/// A full generation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateRequest {
    /// Model id or alias.
    #[serde(alias = "model_id", alias = "modelId")]
    pub model: String,

    /// Dimension overrides.
    pub params: ParamSet,

    /// Extra through-holes.
    pub holes: Vec<HoleRequest>,

    /// Text reliefs.
    #[serde(alias = "text_ops", alias = "textOps")]
    pub text: Vec<TextRequest>,
}

/// A through-hole as sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoleRequest {
    #[serde(alias = "x_mm")]
    pub x: Option<f64>,
    #[serde(alias = "y_mm")]
    pub y: Option<f64>,
    #[serde(alias = "z_mm")]
    pub z: Option<f64>,
    #[serde(alias = "diameter_mm", alias = "diam_mm", alias = "d", alias = "d_mm")]
    pub diameter: f64,
    /// `x`, `y` or `z`; anything else drills along z.
    pub axis: Option<String>,
}

/// A text relief as sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRequest {
    pub text: String,
    #[serde(alias = "size_mm")]
    pub size: Option<f64>,
    #[serde(alias = "depth_mm")]
    pub depth: Option<f64>,
    pub mode: Option<String>,
    #[serde(alias = "face")]
    pub anchor: Option<String>,
    /// Offsets along the face tangents and the normal (mm).
    pub offset: Option<[f64; 3]>,
    pub font: Option<String>,
}

fn parse_axis(raw: &str) -> Option<Axis> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "x" => Some(Axis::X),
        "y" => Some(Axis::Y),
        "z" => Some(Axis::Z),
        _ => None,
    }
}

impl HoleRequest {
    pub fn to_spec(&self) -> HoleSpec {
        let axis = match self.axis.as_deref() {
            None => Axis::Z,
            Some(raw) => parse_axis(raw).unwrap_or_else(|| {
                tracing::debug!(axis = raw, "Unknown hole axis, drilling along z");
                Axis::Z
            }),
        };
        HoleSpec::new(self.diameter, axis).at(self.x, self.y, self.z)
    }
}

impl TextRequest {
    pub fn to_op(&self) -> TextOp {
        let mut op = TextOp::new(self.text.clone());
        if let Some(size) = self.size.filter(|s| s.is_finite()) {
            op.size = size;
        }
        if let Some(depth) = self.depth.filter(|d| d.is_finite() && *d > 0.0) {
            op.depth = depth;
        }
        if let Some(mode) = &self.mode {
            match mode.parse::<ReliefMode>() {
                Ok(m) => op.mode = m,
                Err(e) => tracing::debug!(error = %e, "Keeping default relief mode"),
            }
        }
        if let Some(anchor) = &self.anchor {
            match anchor.parse::<Anchor>() {
                Ok(a) => op.anchor = a,
                Err(e) => tracing::debug!(error = %e, "Keeping default anchor"),
            }
        }
        if let Some([u, v, n]) = self.offset {
            if [u, v, n].iter().all(|c| c.is_finite()) {
                op = op.with_offset(u, v, n);
            }
        }
        op.font = self.font.clone().filter(|f| !f.trim().is_empty());
        op
    }
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn hole_specs(&self) -> Vec<HoleSpec> {
        self.holes.iter().map(HoleRequest::to_spec).collect()
    }

    pub fn text_ops(&self) -> Vec<TextOp> {
        self.text.iter().map(TextRequest::to_op).collect()
    }

    /// Stable storage key for this request
    pub fn cache_key(&self) -> String {
        request_key(&self.model, &self.params, &self.hole_specs(), &self.text_ops())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    #[test]
    fn parses_wire_format_with_aliases() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{
                "model": "vesa-adapter",
                "params": {"width": 180, "thickness": "6"},
                "holes": [{"x_mm": 10, "diam_mm": 4.5, "axis": "Y"}, {"d": 3}],
                "text_ops": [{"text": "PF", "mode": "engrave", "face": "front", "offset": [1, 2, 0]}]
            }"#,
        )
        .unwrap();

        assert_eq!(request.model, "vesa-adapter");
        assert_eq!(request.params["width"], ParamValue::Number(180.0));

        let holes = request.hole_specs();
        assert_eq!(holes[0], HoleSpec::new(4.5, Axis::Y).at(Some(10.0), None, None));
        assert_eq!(holes[1], HoleSpec::new(3.0, Axis::Z));

        let ops = request.text_ops();
        assert_eq!(ops[0].mode, ReliefMode::Engrave);
        assert_eq!(ops[0].anchor, Anchor::Front);
        assert_eq!(ops[0].offset, [1.0, 2.0, 0.0]);
        assert_eq!(ops[0].size, 6.0);
    }

    #[test]
    fn unknown_names_keep_defaults() {
        let hole = HoleRequest {
            diameter: 5.0,
            axis: Some("diagonal".into()),
            ..HoleRequest::default()
        };
        assert_eq!(hole.to_spec().axis, Axis::Z);

        let text = TextRequest {
            text: "A".into(),
            mode: Some("melt".into()),
            anchor: Some("inside".into()),
            depth: Some(-1.0),
            ..TextRequest::default()
        };
        let op = text.to_op();
        assert_eq!(op.mode, ReliefMode::Engrave);
        assert_eq!(op.anchor, Anchor::Top);
        assert_eq!(op.depth, 1.2);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let request: GenerateRequest = serde_json::from_str(r#"{"model": "cable_clip"}"#).unwrap();
        assert!(request.params.is_empty());
        assert!(request.hole_specs().is_empty());
        assert!(request.text_ops().is_empty());
    }
}
