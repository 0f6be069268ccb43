// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Font resolution and glyph outlining
//!
//! Candidates are tried in order: the requested font, the configured
//! default, well-known system fonts, then the built-in block font. The
//! first candidate that produces outlines wins.

use super::block_font;
use crate::error::{Error, Result};
use nalgebra::Point2;
use rusttype::{point, Font, OutlineBuilder, Scale};
use std::path::{Path, PathBuf};

/// Em size glyphs are laid out at before normalization
const OUTLINE_SCALE: f32 = 64.0;

/// Line segments per flattened curve
const CURVE_STEPS: usize = 8;

const FONT_EXTENSIONS: [&str; 2] = ["ttf", "otf"];

/// Well-known locations of a sans-serif font
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const SYSTEM_FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
    "C:\\Windows\\Fonts",
];

/// Resolves font requests to font files
///
/// Font files are read-only resources; implementations must be safe to
/// share between workers.
pub trait FontProvider: Send + Sync {
    /// Font files to try for `requested`, most preferred first
    fn candidates(&self, requested: Option<&str>) -> Vec<PathBuf>;

    /// Read a candidate's bytes
    fn load(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))
    }
}

/// Filesystem font provider
///
/// A request is either a path to a font file or a family name matched
/// against file stems in the search directories.
#[derive(Debug, Clone, Default)]
pub struct SystemFontProvider {
    default_font: Option<PathBuf>,
    search_dirs: Vec<PathBuf>,
    system_fonts: Vec<PathBuf>,
}

impl SystemFontProvider {
    /// Provider over the well-known system locations
    pub fn new(default_font: Option<PathBuf>) -> Self {
        Self {
            default_font,
            search_dirs: SYSTEM_FONT_DIRS.iter().map(PathBuf::from).collect(),
            system_fonts: SYSTEM_FONTS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Provider without any font files: every request uses the block font
    pub fn builtin_only() -> Self {
        Self::default()
    }

    fn find_family(&self, family: &str) -> Option<PathBuf> {
        let wanted = normalize_family(family);
        for dir in &self.search_dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            let mut matches: Vec<PathBuf> = entries
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| is_font_file(path))
                .filter(|path| {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|stem| normalize_family(stem) == wanted)
                })
                .collect();
            // read_dir order is platform dependent
            matches.sort();
            if let Some(found) = matches.into_iter().next() {
                return Some(found);
            }
        }
        None
    }
}

impl FontProvider for SystemFontProvider {
    fn candidates(&self, requested: Option<&str>) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = Vec::new();
        if let Some(name) = requested.map(str::trim).filter(|n| !n.is_empty()) {
            let path = PathBuf::from(name);
            if path.is_file() {
                out.push(path);
            } else if let Some(found) = self.find_family(name) {
                out.push(found);
            } else {
                tracing::debug!(font = name, "Requested font not found");
            }
        }
        out.extend(self.default_font.iter().filter(|p| p.is_file()).cloned());
        out.extend(self.system_fonts.iter().filter(|p| p.is_file()).cloned());

        let mut seen = Vec::with_capacity(out.len());
        out.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(p.clone());
                true
            }
        });
        out
    }
}

fn normalize_family(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Outline `text` with the first usable candidate font
///
/// Contours are in font units with y up. Falls back to the block font,
/// which may itself yield nothing for unsupported characters.
pub fn vectorize(text: &str, requested: Option<&str>, provider: &dyn FontProvider) -> Vec<Vec<Point2<f64>>> {
    for path in provider.candidates(requested) {
        match provider.load(&path).and_then(|bytes| outline_font_bytes(bytes, text)) {
            Ok(contours) if !contours.is_empty() => {
                tracing::debug!(font = %path.display(), contours = contours.len(), "Text vectorized");
                return contours;
            }
            Ok(_) => tracing::debug!(font = %path.display(), "Font produced no outlines"),
            Err(e) => tracing::debug!(error = %e, "Font candidate skipped"),
        }
    }
    block_font::outline(text)
}

fn outline_font_bytes(bytes: Vec<u8>, text: &str) -> Result<Vec<Vec<Point2<f64>>>> {
    let font = Font::try_from_vec(bytes).ok_or_else(|| Error::Font("unreadable font data".to_string()))?;
    Ok(outline_text(&font, text))
}

/// Lay out `text` on one line and collect its flattened glyph contours
pub fn outline_text(font: &Font<'_>, text: &str) -> Vec<Vec<Point2<f64>>> {
    let scale = Scale::uniform(OUTLINE_SCALE);
    let ascent = font.v_metrics(scale).ascent;

    let mut builder = ContourBuilder::default();
    for glyph in font.layout(text, scale, point(0.0, ascent)) {
        glyph.build_outline(&mut builder);
    }
    builder.finish()
}

/// Collects glyph outlines as closed polylines
///
/// rusttype reports y growing downwards, so y is negated on the way in.
#[derive(Default)]
struct ContourBuilder {
    contours: Vec<Vec<Point2<f64>>>,
    current: Vec<Point2<f64>>,
}

impl ContourBuilder {
    fn last(&self) -> Point2<f64> {
        self.current.last().copied().unwrap_or_else(Point2::origin)
    }

    fn push(&mut self, p: Point2<f64>) {
        if self.current.last().map_or(true, |q| (q - p).norm() > 1e-9) {
            self.current.push(p);
        }
    }

    fn flush(&mut self) {
        let mut contour = std::mem::take(&mut self.current);
        if contour.len() > 1 && (contour[0] - contour[contour.len() - 1]).norm() <= 1e-9 {
            contour.pop();
        }
        if contour.len() >= 3 {
            self.contours.push(contour);
        }
    }

    fn finish(mut self) -> Vec<Vec<Point2<f64>>> {
        self.flush();
        self.contours
    }
}

fn pt(x: f32, y: f32) -> Point2<f64> {
    Point2::new(x as f64, -(y as f64))
}

impl OutlineBuilder for ContourBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.flush();
        self.push(pt(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(pt(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (p0, c, p1) = (self.last(), pt(x1, y1), pt(x, y));
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let s = 1.0 - t;
            self.push(Point2::from(p0.coords * (s * s) + c.coords * (2.0 * s * t) + p1.coords * (t * t)));
        }
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (p0, c1, c2, p1) = (self.last(), pt(x1, y1), pt(x2, y2), pt(x, y));
        for i in 1..=CURVE_STEPS {
            let t = i as f64 / CURVE_STEPS as f64;
            let s = 1.0 - t;
            self.push(Point2::from(
                p0.coords * (s * s * s)
                    + c1.coords * (3.0 * s * s * t)
                    + c2.coords * (3.0 * s * t * t)
                    + p1.coords * (t * t * t),
            ));
        }
    }

    fn close(&mut self) {
        self.flush();
    }
}
