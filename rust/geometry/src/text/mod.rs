// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text Relief Engine
//!
//! Turns a string into a relief solid and engraves or embosses it on one
//! of the six bounding-box faces of a part:
//!
//! 1. Vectorize with the first usable font ([`font::vectorize`])
//! 2. Scale to the requested height and center on the local origin
//! 3. Drop invalid contours; merge large fragment sets with a polygon union
//! 4. Extrude to `depth`, centered on z = 0
//! 5. Place on the anchor face ([`placement`])
//! 6. Union (emboss) or subtract (engrave) through the boolean engine

pub mod block_font;
pub mod font;
pub mod placement;

pub use font::{FontProvider, SystemFontProvider};
pub use placement::FaceFrame;

use crate::bool2d::{contour_bounds, is_valid_contour, merge_contours, nest_contours};
use crate::boolean::BooleanEngine;
use crate::diagnostics::{Diagnostics, Outcome, Stage};
use crate::mesh::Mesh;
use crate::primitives::extrude_polygon;
use crate::settings::GeometrySettings;
use nalgebra::{Point2, Vector2, Vector3};
use std::fmt;
use std::str::FromStr;

/// Sizes at or below this skip scaling (mm)
const SIZE_EPSILON: f64 = 1e-6;

/// Above this many contours, outlines are merged with a polygon union
const MERGE_THRESHOLD: usize = 20;

/// Subtractive or additive relief
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReliefMode {
    #[default]
    Engrave,
    Emboss,
}

/// Bounding-box face a relief is placed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Anchor {
    #[default]
    Top,
    Bottom,
    Front,
    Back,
    Left,
    Right,
}

impl FromStr for ReliefMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "engrave" | "cut" | "deboss" => Ok(Self::Engrave),
            "emboss" | "raise" | "add" => Ok(Self::Emboss),
            other => Err(format!("unknown relief mode '{}'", other)),
        }
    }
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "+z" => Ok(Self::Top),
            "bottom" | "-z" => Ok(Self::Bottom),
            "front" | "-y" => Ok(Self::Front),
            "back" | "+y" => Ok(Self::Back),
            "left" | "-x" => Ok(Self::Left),
            "right" | "+x" => Ok(Self::Right),
            other => Err(format!("unknown anchor '{}'", other)),
        }
    }
}

impl fmt::Display for ReliefMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Engrave => "engrave",
            Self::Emboss => "emboss",
        })
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
        })
    }
}

/// One text relief request
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    /// Cap-to-descender height of the outlines (mm)
    pub size: f64,
    /// Extrusion depth (mm)
    pub depth: f64,
    pub mode: ReliefMode,
    pub anchor: Anchor,
    /// Offsets along the face tangents and normal (mm)
    pub offset: [f64; 3],
    /// Font file path or family name
    pub font: Option<String>,
}

impl TextOp {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: 6.0,
            depth: 1.2,
            mode: ReliefMode::default(),
            anchor: Anchor::default(),
            offset: [0.0; 3],
            font: None,
        }
    }

    pub fn with_mode(mut self, mode: ReliefMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn on(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_offset(mut self, u: f64, v: f64, n: f64) -> Self {
        self.offset = [u, v, n];
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Scale contours so their vertical extent equals `size` and center them
/// on the origin
fn normalize(contours: &[Vec<Point2<f64>>], size: f64) -> Vec<Vec<Point2<f64>>> {
    let all: Vec<Point2<f64>> = contours.iter().flatten().copied().collect();
    let Some((min, max)) = contour_bounds(&all) else {
        return Vec::new();
    };
    let height = max.y - min.y;
    let scale = if size.is_finite() && size > SIZE_EPSILON && height > 1e-12 {
        size / height
    } else {
        1.0
    };
    let center = Vector2::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0);

    contours
        .iter()
        .map(|c| c.iter().map(|p| Point2::from((p.coords - center) * scale)).collect())
        .collect()
}

/// Build the unplaced relief solid for `op`: centered on the origin with
/// z in [-depth/2, depth/2]
///
/// Returns `None` when no font produced outlines.
pub fn text_solid(op: &TextOp, fonts: &dyn FontProvider) -> Option<Mesh> {
    let text = op.text.trim();
    if text.is_empty() {
        return None;
    }

    let raw = font::vectorize(text, op.font.as_deref(), fonts);
    let contours: Vec<Vec<Point2<f64>>> = normalize(&raw, op.size)
        .into_iter()
        .filter(|c| is_valid_contour(c))
        .collect();
    if contours.is_empty() {
        return None;
    }

    let profiles = if contours.len() > MERGE_THRESHOLD {
        merge_contours(&contours)
    } else {
        nest_contours(&contours)
    };

    let depth = op.depth;
    let shapes: Vec<Mesh> = profiles
        .iter()
        .map(|profile| extrude_polygon(profile, depth))
        .filter(|mesh| !mesh.is_empty())
        .collect();
    if shapes.is_empty() {
        return None;
    }

    let solid = Mesh::concatenate(&shapes);
    let bounds = solid.bounds();
    Some(solid.translated(Vector3::new(0.0, 0.0, -(bounds.min.z + bounds.max.z) / 2.0)))
}

/// Apply one text operation to `base`
///
/// Blank text and text no font can render leave the base unchanged. A
/// failed emboss returns the relief glued on; a failed engrave returns the
/// base uncarved.
pub fn apply_text_op(
    engine: &BooleanEngine,
    base: &Mesh,
    op: &TextOp,
    settings: &GeometrySettings,
    fonts: &dyn FontProvider,
) -> Outcome {
    if op.is_blank() || base.is_empty() {
        return Ok(base.clone());
    }
    let Some(solid) = text_solid(op, fonts) else {
        tracing::debug!(text = %op.text, "No font could render text, skipping");
        return Ok(base.clone());
    };

    let depth = solid.bounds().size().z;
    let frame = FaceFrame::on(&base.bounds(), op.anchor);
    let placed = placement::place(&solid, &frame, op.offset, op.mode, depth, settings.text_clearance);

    tracing::debug!(
        text = %op.text,
        mode = %op.mode,
        anchor = %op.anchor,
        triangles = placed.triangle_count(),
        "Applying text relief"
    );

    let merged = match op.mode {
        ReliefMode::Emboss => engine.union(&[base.clone(), placed]),
        ReliefMode::Engrave => engine.difference(base, &placed),
    };
    merged.map_err(|degraded| degraded.within(Stage::Text))
}

/// Apply text operations in order, each on the previous result
pub fn apply_text_ops(
    engine: &BooleanEngine,
    base: &Mesh,
    ops: &[TextOp],
    settings: &GeometrySettings,
    fonts: &dyn FontProvider,
    diagnostics: &mut Diagnostics,
) -> Mesh {
    ops.iter().fold(base.clone(), |mesh, op| {
        diagnostics.absorb(apply_text_op(engine, &mesh, op, settings, fonts))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::box_mesh;
    use approx::assert_relative_eq;

    fn setup() -> (BooleanEngine, GeometrySettings, SystemFontProvider) {
        let settings = GeometrySettings::default();
        (BooleanEngine::new(&settings), settings, SystemFontProvider::builtin_only())
    }

    #[test]
    fn test_parse_mode_and_anchor() {
        assert_eq!("Engrave".parse::<ReliefMode>(), Ok(ReliefMode::Engrave));
        assert_eq!(" emboss ".parse::<ReliefMode>(), Ok(ReliefMode::Emboss));
        assert!("carve".parse::<ReliefMode>().is_err());
        assert_eq!("FRONT".parse::<Anchor>(), Ok(Anchor::Front));
        assert_eq!("+x".parse::<Anchor>(), Ok(Anchor::Right));
        assert!("middle".parse::<Anchor>().is_err());
    }

    #[test]
    fn test_defaults() {
        let op = TextOp::new("VESA");
        assert_relative_eq!(op.size, 6.0);
        assert_relative_eq!(op.depth, 1.2);
        assert_eq!(op.mode, ReliefMode::Engrave);
        assert_eq!(ReliefMode::default(), ReliefMode::Engrave);
        assert_eq!(op.anchor, Anchor::Top);
    }

    #[test]
    fn test_text_solid_is_normalized() {
        let (_, _, fonts) = setup();
        let mut op = TextOp::new("HI");
        op.size = 10.0;
        op.depth = 2.0;

        let solid = text_solid(&op, &fonts).unwrap();
        let b = solid.bounds();
        assert_relative_eq!(b.size().y, 10.0, epsilon = 1e-9);
        assert_relative_eq!(b.size().z, 2.0, epsilon = 1e-9);
        assert_relative_eq!(b.center().x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.center().y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.center().z, 0.0, epsilon = 1e-9);
        assert!(solid.signed_volume() > 0.0);
    }

    #[test]
    fn test_zero_size_skips_scaling() {
        let (_, _, fonts) = setup();
        let mut op = TextOp::new("I");
        op.size = 0.0;
        let solid = text_solid(&op, &fonts).unwrap();
        // Block font units: seven rows plus bleed
        let height = solid.bounds().size().y;
        assert!(height > 7.0 && height < 7.2);
    }

    #[test]
    fn test_blank_and_unrenderable_text_are_no_ops() {
        let (engine, settings, fonts) = setup();
        let block = box_mesh(40.0, 20.0, 10.0);
        for text in ["", "   ", "~~~"] {
            let op = TextOp::new(text);
            assert_eq!(apply_text_op(&engine, &block, &op, &settings, &fonts).unwrap(), block);
        }
    }

    #[test]
    fn test_emboss_adds_and_engrave_removes() {
        let (engine, settings, fonts) = setup();
        let block = box_mesh(60.0, 30.0, 10.0);
        let base_volume = block.signed_volume();

        let emboss = TextOp::new("AB").with_mode(ReliefMode::Emboss);
        let embossed = apply_text_op(&engine, &block, &emboss, &settings, &fonts).unwrap();
        assert!(embossed.signed_volume() > base_volume);
        assert!(embossed.bounds().max.z > block.bounds().max.z);

        let engrave = TextOp::new("AB").on(Anchor::Front);
        let engraved = apply_text_op(&engine, &block, &engrave, &settings, &fonts).unwrap();
        assert!(engraved.signed_volume() < base_volume);
        assert_relative_eq!(engraved.bounds().min.y, block.bounds().min.y, epsilon = 1e-6);
    }

    #[test]
    fn test_ops_apply_in_order() {
        let (engine, settings, fonts) = setup();
        let block = box_mesh(60.0, 30.0, 10.0);
        let ops = [TextOp::new("1").with_mode(ReliefMode::Emboss), TextOp::new("2").with_mode(ReliefMode::Emboss).on(Anchor::Bottom)];

        let mut diagnostics = Diagnostics::new();
        let mesh = apply_text_ops(&engine, &block, &ops, &settings, &fonts, &mut diagnostics);
        let b = mesh.bounds();
        assert!(b.max.z > 5.0 + 1.0);
        assert!(b.min.z < -5.0 - 1.0);
        assert!(diagnostics.is_empty());
    }
}
