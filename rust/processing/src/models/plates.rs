// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Flat plates: adapters, quick-release and clips
//!
//! Plates are centered on the origin so the requested dimensions are exactly
//! the bounding box.

use crate::params::{ParamSpec, ResolvedParams};
use crate::pipeline::BuildContext;
use crate::registry::ModelEntry;
use partforge_geometry::{box_mesh, rounded_plate, Axis, HoleSpec, Mesh, TextOp};

const VESA_ADAPTER: &[ParamSpec] = &[
    ParamSpec::length("width", 120.0).aka(&["length", "length_mm"]),
    ParamSpec::length("height", 120.0).aka(&["height_mm", "plate_height"]),
    ParamSpec::length("thickness", 5.0).aka(&["thickness_mm"]),
    ParamSpec::length("vesa", 100.0).aka(&["vesa_mm", "pattern"]),
    ParamSpec::length("hole", 5.0).aka(&["hole_d", "hole_mm"]),
    ParamSpec::length("corner_radius", 0.0).aka(&["fillet_mm", "radius"]),
];

const QR_PLATE: &[ParamSpec] = &[
    ParamSpec::length("length", 90.0).aka(&["length_mm"]),
    ParamSpec::length("width", 38.0).aka(&["width_mm"]),
    ParamSpec::length("thickness", 8.0).aka(&["thickness_mm"]),
    ParamSpec::length("slot", 22.0).aka(&["slot_mm"]),
    ParamSpec::length("screw_d", 6.5).aka(&["screw_d_mm"]),
    ParamSpec::length("corner_radius", 3.0).aka(&["fillet_mm"]),
];

const CAMERA_PLATE: &[ParamSpec] = &[
    ParamSpec::length("length", 120.0).aka(&["length_mm"]),
    ParamSpec::length("width", 60.0).aka(&["width_mm"]),
    ParamSpec::length("thickness", 3.0).aka(&["thickness_mm"]),
    ParamSpec::length("corner_radius", 0.0).aka(&["fillet_mm"]),
    ParamSpec::length("screw_d", 0.0).aka(&["screw_d_mm", "tripod_d"]),
];

const ROUTER_MOUNT: &[ParamSpec] = &[
    ParamSpec::length("router_width", 120.0).aka(&["length", "length_mm"]),
    ParamSpec::length("router_depth", 80.0).aka(&["width", "width_mm"]),
    ParamSpec::length("thickness", 4.0).aka(&["thickness_mm"]),
    ParamSpec::length("corner_radius", 4.0).aka(&["fillet_mm"]),
    ParamSpec::length("hole_d", 4.5),
    ParamSpec::length("hole_inset", 8.0),
];

const CABLE_CLIP: &[ParamSpec] = &[
    ParamSpec::length("diameter", 8.0).aka(&["cable_d", "diameter_mm"]),
    ParamSpec::length("width", 12.0).aka(&["width_mm"]),
    ParamSpec::length("thickness", 2.4).aka(&["thickness_mm"]),
];

pub(super) fn entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "vesa_adapter",
            aliases: &["vesa_plate"],
            description: "Flat adapter plate with a square VESA hole pattern",
            defaults: VESA_ADAPTER,
            builder: vesa_adapter,
        },
        ModelEntry {
            id: "qr_plate",
            aliases: &["quick_release_plate"],
            description: "Quick-release plate with a row of three screw holes",
            defaults: QR_PLATE,
            builder: qr_plate,
        },
        ModelEntry {
            id: "camera_plate",
            aliases: &[],
            description: "Plain camera base plate with an optional tripod screw hole",
            defaults: CAMERA_PLATE,
            builder: camera_plate,
        },
        ModelEntry {
            id: "router_mount",
            aliases: &[],
            description: "Router mounting plate with corner screw holes",
            defaults: ROUTER_MOUNT,
            builder: router_mount,
        },
        ModelEntry {
            id: "cable_clip",
            aliases: &[],
            description: "Screw-down cable clip tab sized from the cable diameter",
            defaults: CABLE_CLIP,
            builder: cable_clip,
        },
    ]
}

/// Four holes on the corners of a centered square, when they fit the plate
fn square_pattern(length: f64, width: f64, spacing: f64, diameter: f64) -> Vec<HoleSpec> {
    let half = spacing / 2.0;
    if diameter <= 0.0 || half <= 0.0 || half + diameter / 2.0 >= length.min(width) / 2.0 {
        return Vec::new();
    }
    [(-half, -half), (half, -half), (half, half), (-half, half)]
        .into_iter()
        .map(|(x, y)| HoleSpec::new(diameter, Axis::Z).at(Some(x), Some(y), None))
        .collect()
}

fn vesa_adapter(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (w, h, t) = (p.get("width"), p.get("height"), p.get("thickness"));
    let plate = rounded_plate(w, h, t, p.get("corner_radius"), ctx.sections());

    // Explicit holes replace the VESA pattern
    let pattern;
    let holes = if holes.is_empty() {
        pattern = square_pattern(w, h, p.get("vesa"), p.get("hole"));
        &pattern[..]
    } else {
        holes
    };
    ctx.finish(&plate, holes, text)
}

fn qr_plate(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (l, w, t) = (p.get("length"), p.get("width"), p.get("thickness"));
    let plate = rounded_plate(l, w, t, p.get("corner_radius"), ctx.sections());

    let pattern: Vec<HoleSpec>;
    let holes = if holes.is_empty() {
        let (slot, d) = (p.get("slot"), p.get("screw_d"));
        pattern = [-slot / 2.0, 0.0, slot / 2.0]
            .into_iter()
            .filter(|x| x.abs() + d / 2.0 < l / 2.0)
            .map(|x| HoleSpec::new(d, Axis::Z).at(Some(x), Some(0.0), None))
            .collect();
        &pattern[..]
    } else {
        holes
    };
    ctx.finish(&plate, holes, text)
}

fn camera_plate(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let plate = rounded_plate(
        p.get("length"),
        p.get("width"),
        p.get("thickness"),
        p.get("corner_radius"),
        ctx.sections(),
    );
    let mut all = holes.to_vec();
    all.push(HoleSpec::new(p.get("screw_d"), Axis::Z).at(Some(0.0), Some(0.0), None));
    ctx.finish(&plate, &all, text)
}

fn router_mount(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (l, w, t) = (p.get("router_width"), p.get("router_depth"), p.get("thickness"));
    let plate = rounded_plate(l, w, t, p.get("corner_radius"), ctx.sections());

    let inset = p.get("hole_inset");
    let (dx, dy) = (l / 2.0 - inset, w / 2.0 - inset);
    let mut all = holes.to_vec();
    if dx > 0.0 && dy > 0.0 {
        all.extend(
            [(-dx, -dy), (dx, -dy), (dx, dy), (-dx, dy)]
                .into_iter()
                .map(|(x, y)| HoleSpec::new(p.get("hole_d"), Axis::Z).at(Some(x), Some(y), None)),
        );
    }
    ctx.finish(&plate, &all, text)
}

fn cable_clip(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let d = p.get("diameter");
    let length = (2.2 * d).max(18.0);
    let tab = box_mesh(length, p.get("width"), p.get("thickness"));

    let mut all = vec![HoleSpec::new(d, Axis::Z).at(Some(0.0), Some(0.0), None)];
    all.extend_from_slice(holes);
    ctx.finish(&tab, &all, text)
}
