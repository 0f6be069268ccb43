// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Desk stands and docks
//!
//! The front of every stand faces -Y.

use super::{block, on_bed, side_prism};
use crate::params::{ParamSpec, ResolvedParams};
use crate::pipeline::BuildContext;
use crate::registry::ModelEntry;
use partforge_geometry::{cylinder_along, Axis, HoleSpec, Mesh, Point3, TextOp, Vector3};

const PHONE_DOCK: &[ParamSpec] = &[
    ParamSpec::length("base_w", 90.0).aka(&["length", "length_mm"]),
    ParamSpec::length("base_d", 110.0).aka(&["width", "width_mm"]),
    ParamSpec::length("wall", 4.0).aka(&["thickness", "thickness_mm"]),
    ParamSpec::length("cable_slot", 12.0).aka(&["slot_w"]),
];

const PHONE_STAND: &[ParamSpec] = &[
    ParamSpec::length("support_depth", 110.0).aka(&["depth", "width_mm"]),
    ParamSpec::length("width", 80.0).aka(&["length", "length_mm"]),
    ParamSpec::length("thickness", 4.0).aka(&["thickness_mm"]),
    ParamSpec::number("angle_deg", 60.0).aka(&["angle"]),
    ParamSpec::length("lip_height", 8.0).aka(&["lip_h"]),
];

const TABLET_STAND: &[ParamSpec] = &[
    ParamSpec::length("width", 160.0).aka(&["length", "length_mm"]),
    ParamSpec::length("depth", 140.0).aka(&["width_mm"]),
    ParamSpec::length("wall", 4.0).aka(&["thickness", "thickness_mm"]),
    ParamSpec::length("lip_h", 10.0).aka(&["lip_height"]),
];

const LAPTOP_STAND: &[ParamSpec] = &[
    ParamSpec::length("length", 250.0).aka(&["length_mm"]),
    ParamSpec::length("width", 230.0).aka(&["width_mm"]),
    ParamSpec::length("height", 120.0).aka(&["height_mm"]),
    ParamSpec::length("thickness", 4.0).aka(&["thickness_mm"]),
    ParamSpec::length("fillet", 4.0).aka(&["fillet_mm"]),
    ParamSpec::count("rib_count", 2.0).aka(&["ribs"]),
];

const HEADSET_STAND: &[ParamSpec] = &[
    ParamSpec::length("length", 120.0).aka(&["length_mm"]),
    ParamSpec::length("width", 80.0).aka(&["width_mm"]),
    ParamSpec::length("height", 260.0).aka(&["height_mm"]),
    ParamSpec::length("thickness", 4.0).aka(&["thickness_mm"]),
    ParamSpec::length("fillet", 6.0).aka(&["fillet_mm"]),
];

pub(super) fn entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "phone_dock",
            aliases: &["phone_holder"],
            description: "Phone dock with a back rest, front lip and cable pass-through",
            defaults: PHONE_DOCK,
            builder: phone_dock,
        },
        ModelEntry {
            id: "phone_stand",
            aliases: &[],
            description: "Phone stand with a rest tilted to the requested angle",
            defaults: PHONE_STAND,
            builder: phone_stand,
        },
        ModelEntry {
            id: "tablet_stand",
            aliases: &[],
            description: "Tablet stand with a back rest and a front lip",
            defaults: TABLET_STAND,
            builder: tablet_stand,
        },
        ModelEntry {
            id: "laptop_stand",
            aliases: &["laptop_riser"],
            description: "Sloped laptop riser with side ribs and a front stop",
            defaults: LAPTOP_STAND,
            builder: laptop_stand,
        },
        ModelEntry {
            id: "headset_stand",
            aliases: &["headphone_stand"],
            description: "Headset stand: rounded base, mast and padded saddle",
            defaults: HEADSET_STAND,
            builder: headset_stand,
        },
    ]
}

/// Base plate with a back wall on the rear edge and a lip on the front edge
fn tray_with_back(ctx: &mut BuildContext<'_>, width: f64, depth: f64, t: f64, back_h: f64, lip_h: f64) -> Mesh {
    let (hw, hd) = (width / 2.0, depth / 2.0);
    let base = block([-hw, -hd, 0.0], [hw, hd, t]);
    let back = block([-hw, hd - t, 0.0], [hw, hd, back_h.max(t)]);
    let lip = block([-hw, -hd, 0.0], [hw, -hd + t, (t + lip_h).max(t)]);
    ctx.union(&[base, back, lip])
}

fn phone_dock(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (w, d, t) = (p.get("base_w"), p.get("base_d"), p.get("wall").max(0.6));
    let mut dock = tray_with_back(ctx, w, d, t, 0.7 * d, 1.5 * t);

    let slot = p.get("cable_slot").min(w - 2.0 * t);
    if slot > 0.0 {
        let center = Point3::new(0.0, -d / 2.0 + t + 0.15 * d, t / 2.0);
        dock = ctx.pocket(&dock, center, Vector3::new(slot, 0.3 * d, t + 2.0));
    }
    ctx.finish(&dock, holes, text)
}

fn phone_stand(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (d, w, t) = (p.get("support_depth"), p.get("width"), p.get("thickness").max(0.6));
    let angle = p.get("angle_deg").clamp(20.0, 85.0).to_radians();
    let (hw, hd) = (w / 2.0, d / 2.0);

    let base = block([-hw, -hd, 0.0], [hw, hd, t]);
    let lip = block([-hw, -hd, 0.0], [hw, -hd + t, t + p.get("lip_height")]);

    // Rest leans back from a foot just behind the lip
    let foot = -hd + t + 12.0;
    let thick = t / angle.sin();
    let run = (hd - foot - thick).max(t);
    let length = (run / angle.cos()).min(0.9 * d);
    let (dy, dz) = (length * angle.cos(), length * angle.sin());
    let rest = side_prism(
        &[[foot, 0.0], [foot + thick, 0.0], [foot + thick + dy, dz], [foot + dy, dz]],
        Axis::X,
        -hw,
        w,
    );

    let stand = ctx.union(&[base, lip, rest]);
    ctx.finish(&stand, holes, text)
}

fn tablet_stand(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (w, d, t) = (p.get("width"), p.get("depth"), p.get("wall").max(0.6));
    let stand = tray_with_back(ctx, w, d, t, 0.8 * d, p.get("lip_h"));
    ctx.finish(&stand, holes, text)
}

fn laptop_stand(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (l, w, h) = (p.get("length"), p.get("width"), p.get("height"));
    let t = p.get("thickness").max(0.6);
    let (hl, hw) = (l / 2.0, w / 2.0);
    let front_h = (3.0 * t).min(h);

    let mut parts = Vec::new();
    let ribs = p.count("rib_count").max(2);
    let spacing = (l - t) / (ribs - 1) as f64;
    for i in 0..ribs {
        let x = -hl + spacing * i as f64;
        parts.push(side_prism(
            &[[-hw, 0.0], [hw, 0.0], [hw, h.max(front_h)], [-hw, front_h]],
            Axis::X,
            x,
            t,
        ));
    }
    parts.push(block([-hl, -hw, 0.0], [hl, -hw + 2.5 * t, t]));
    parts.push(block([-hl, hw - 2.5 * t, 0.0], [hl, hw, t]));

    let lip = block([-hl, -hw, 0.0], [hl, -hw + t, front_h + 2.0 * t]);
    parts.push(ctx.round_top(&lip, p.get("fillet").min(t / 2.0)));

    let stand = ctx.union(&parts);
    ctx.finish(&stand, holes, text)
}

fn headset_stand(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (l, w, h) = (p.get("length"), p.get("width"), p.get("height"));
    let t = p.get("thickness").max(0.6);
    let top = t + h;

    let base = on_bed(ctx.rounded_box(l, w, t, p.get("fillet")));
    let mast = block([-1.5 * t, -t, 0.0], [1.5 * t, t, top]);

    let (saddle_x, saddle_y) = (0.3 * l, 0.25 * w);
    let saddle = block([-saddle_x, -saddle_y, top - t], [saddle_x, saddle_y, top]);
    let sections = ctx.sections();
    let rail = |x: f64| cylinder_along(t, 2.0 * saddle_y, sections, Axis::Y).translated(Vector3::new(x, 0.0, top));
    let (left, right) = (rail(-saddle_x + t), rail(saddle_x - t));

    let stand = ctx.union(&[base, mast, saddle, left, right]);
    ctx.finish(&stand, holes, text)
}
