// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brackets, hooks, clips and wall mounts

use super::{block, on_bed, side_prism};
use crate::params::{ParamSpec, ResolvedParams};
use crate::pipeline::BuildContext;
use crate::registry::ModelEntry;
use partforge_geometry::{cylinder, cylinder_along, Axis, HoleSpec, Mesh, Point3, TextOp, Vector3};

const WALL_BRACKET: &[ParamSpec] = &[
    ParamSpec::length("length", 120.0).aka(&["length_mm"]),
    ParamSpec::length("width", 40.0).aka(&["width_mm"]),
    ParamSpec::length("height", 80.0).aka(&["height_mm"]),
    ParamSpec::length("thickness", 4.0).aka(&["thickness_mm"]),
    ParamSpec::flag("gusset", true),
    ParamSpec::length("hole_d", 5.0),
];

const WALL_HOOK: &[ParamSpec] = &[
    ParamSpec::length("base_w", 40.0).aka(&["width", "width_mm"]),
    ParamSpec::length("base_h", 60.0).aka(&["height", "height_mm"]),
    ParamSpec::length("wall", 3.5).aka(&["thickness", "thickness_mm"]),
    ParamSpec::length("hook_depth", 35.0),
    ParamSpec::length("hook_height", 35.0),
    ParamSpec::length("hook_t", 8.0),
    ParamSpec::length("hole_d", 4.5),
    ParamSpec::length("hole_off", 12.0),
];

const GO_PRO_MOUNT: &[ParamSpec] = &[
    ParamSpec::length("fork_pitch", 17.5).aka(&["pitch"]),
    ParamSpec::length("ear_t", 3.2),
    ParamSpec::length("hole_d", 5.2),
    ParamSpec::length("base_w", 30.0).aka(&["width", "width_mm"]),
    ParamSpec::length("base_l", 35.0).aka(&["length", "length_mm"]),
    ParamSpec::length("wall", 3.0).aka(&["thickness", "thickness_mm"]),
];

const MIC_ARM_CLIP: &[ParamSpec] = &[
    ParamSpec::length("arm_d", 20.0).aka(&["diameter"]),
    ParamSpec::length("opening", 0.6).aka(&["gap"]),
    ParamSpec::length("clip_t", 3.0),
    ParamSpec::length("width", 14.0).aka(&["width_mm"]),
    ParamSpec::length("wall", 3.0).aka(&["thickness", "thickness_mm"]),
];

const VESA_SHELF: &[ParamSpec] = &[
    ParamSpec::length("vesa", 100.0).aka(&["vesa_mm"]),
    ParamSpec::length("thickness", 4.0).aka(&["thickness_mm"]),
    ParamSpec::length("shelf_width", 180.0).aka(&["width", "width_mm"]),
    ParamSpec::length("shelf_depth", 120.0).aka(&["depth", "length_mm"]),
    ParamSpec::length("lip_height", 15.0).aka(&["lip_h"]),
    ParamSpec::count("rib_count", 3.0).aka(&["ribs"]),
    ParamSpec::length("hole_d", 5.0),
    ParamSpec::flag("qr_enabled", true),
    ParamSpec::length("qr_slot_w", 18.0),
    ParamSpec::length("qr_slot_h", 6.0),
    ParamSpec::number("qr_offset_y", 12.0),
];

/// Border around the VESA pattern on the shelf back plate (mm)
const VESA_MARGIN: f64 = 40.0;

pub(super) fn entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "wall_bracket",
            aliases: &["l_bracket", "angle_bracket"],
            description: "L bracket with a gusset and screw holes in both legs",
            defaults: WALL_BRACKET,
            builder: wall_bracket,
        },
        ModelEntry {
            id: "wall_hook",
            aliases: &["wall_bracket_hook", "hook"],
            description: "Flat-printed wall hook with two screw holes",
            defaults: WALL_HOOK,
            builder: wall_hook,
        },
        ModelEntry {
            id: "go_pro_mount",
            aliases: &["gopro_mount", "gopro"],
            description: "Two-finger action camera mount with a bolt hole through the fingers",
            defaults: GO_PRO_MOUNT,
            builder: go_pro_mount,
        },
        ModelEntry {
            id: "mic_arm_clip",
            aliases: &["mic_clip"],
            description: "Split ring that snaps onto a microphone arm, with a side fin",
            defaults: MIC_ARM_CLIP,
            builder: mic_arm_clip,
        },
        ModelEntry {
            id: "vesa_shelf",
            aliases: &["vesa_tray"],
            description: "Shelf on a VESA back plate with ribs, lip and a quick-release slot",
            defaults: VESA_SHELF,
            builder: vesa_shelf,
        },
    ]
}

fn wall_bracket(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (l, w, h) = (p.get("length"), p.get("width"), p.get("height"));
    let t = p.get("thickness").max(0.6);
    let (hl, hw) = (l / 2.0, w / 2.0);

    let mut parts = vec![
        block([-hl, -hw, 0.0], [hl, hw, t]),
        block([hl - t, -hw, 0.0], [hl, hw, t + h]),
    ];
    if p.flag("gusset") {
        let g = 0.4 * (l - t).min(h);
        let inner = hl - t;
        // Profile in (z, x) for a prism along Y
        parts.push(side_prism(
            &[[t, inner], [t, inner - g], [t + g, inner]],
            Axis::Y,
            -t / 2.0,
            t,
        ));
    }
    let bracket = ctx.union(&parts);

    let d = p.get("hole_d");
    let mut all = vec![
        HoleSpec::new(d, Axis::Z).at(Some(-hl / 2.0), Some(0.0), None),
        HoleSpec::new(d, Axis::X).at(None, Some(-w / 4.0), Some(t + 0.6 * h)),
        HoleSpec::new(d, Axis::X).at(None, Some(w / 4.0), Some(t + 0.6 * h)),
    ];
    all.extend_from_slice(holes);
    ctx.finish(&bracket, &all, text)
}

fn wall_hook(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (bw, bh, t) = (p.get("base_w"), p.get("base_h"), p.get("wall").max(0.6));
    let (depth, rise, arm) = (p.get("hook_depth"), p.get("hook_height"), p.get("hook_t"));
    let (hx, hy) = (bw / 2.0, bh / 2.0);
    let foot = -hy + 2.0;

    let plate = block([-hx, -hy, 0.0], [hx, hy, t]);
    let reach = block([hx - 1.0, foot, 0.0], [hx + depth, foot + arm, t]);
    let lip = block([hx + depth - arm, foot, 0.0], [hx + depth, foot + rise.max(arm), t]);
    let hook = ctx.union(&[plate, reach, lip]);

    let (d, off) = (p.get("hole_d"), p.get("hole_off"));
    let mut all = Vec::new();
    if hy - off > d / 2.0 {
        all.push(HoleSpec::new(d, Axis::Z).at(Some(0.0), Some(hy - off), None));
        all.push(HoleSpec::new(d, Axis::Z).at(Some(0.0), Some(-hy + off), None));
    }
    all.extend_from_slice(holes);
    ctx.finish(&hook, &all, text)
}

fn go_pro_mount(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (pitch, ear_t, t) = (p.get("fork_pitch"), p.get("ear_t"), p.get("wall").max(0.6));
    let (bw, bl) = (p.get("base_w"), p.get("base_l"));
    let ear_h = 2.5 * t;
    let ear_d = 2.0 * t + 0.3 * bl;
    let pivot = 2.0 * t + ear_h;

    let mut parts = vec![block([-bw / 2.0, -bl / 2.0, 0.0], [bw / 2.0, bl / 2.0, 2.0 * t])];
    for x in [-pitch / 2.0, pitch / 2.0] {
        parts.push(block([x - ear_t / 2.0, -ear_d / 2.0, t], [x + ear_t / 2.0, ear_d / 2.0, pivot]));
        parts.push(
            cylinder_along(ear_d / 2.0, ear_t, ctx.sections(), Axis::X).translated(Vector3::new(x, 0.0, pivot)),
        );
    }
    let mount = ctx.union(&parts);

    let mut all = vec![HoleSpec::new(p.get("hole_d"), Axis::X).at(None, Some(0.0), Some(pivot))];
    all.extend_from_slice(holes);
    ctx.finish(&mount, &all, text)
}

fn mic_arm_clip(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (arm_d, gap, w) = (p.get("arm_d"), p.get("opening"), p.get("width"));
    let r_in = (arm_d / 2.0).max(0.1);
    let r_out = r_in + p.get("wall").max(0.6);
    let sections = ctx.sections().max(64);

    let outer = cylinder(r_out, w, sections);
    let bore = cylinder(r_in, w * 1.2, sections);
    let mut ring = ctx.difference(&outer, &bore);
    if gap > 0.0 {
        let slit = block([r_in - 1.0, -gap / 2.0, -w], [r_out + 1.0, gap / 2.0, w]);
        ring = ctx.difference(&ring, &slit);
    }

    let clip_t = p.get("clip_t");
    let fin = block([-r_out - clip_t, -0.6 * r_out, -w / 2.0], [-r_out + 1.0, 0.6 * r_out, w / 2.0]);
    let clip = ctx.union(&[ring, fin]);
    ctx.finish(&on_bed(clip), holes, text)
}

fn vesa_shelf(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (vesa, t) = (p.get("vesa"), p.get("thickness").max(0.6));
    let (sw, sd) = (p.get("shelf_width"), p.get("shelf_depth"));
    let side = vesa + VESA_MARGIN;
    let (hs, hw) = (side / 2.0, sw / 2.0);

    // VESA holes go through the back plate only
    let half = vesa / 2.0;
    let d = p.get("hole_d");
    let pattern: Vec<HoleSpec> = if half + d / 2.0 < hs {
        [(-half, -half), (half, -half), (half, half), (-half, half)]
            .into_iter()
            .map(|(x, z)| HoleSpec::new(d, Axis::Y).at(Some(x), Some(t / 2.0), Some(hs + z)))
            .collect()
    } else {
        Vec::new()
    };
    let back = ctx.drill(&block([-hs, 0.0, 0.0], [hs, t, side]), &pattern);

    let mut parts = vec![
        back,
        block([-hw, -sd, 0.0], [hw, t, t]),
        block([-hw, -sd, 0.0], [hw, -sd + t, t + p.get("lip_height")]),
    ];

    // Gussets between shelf and back plate
    let ribs = p.count("rib_count");
    let step = sw / (ribs + 1) as f64;
    let (run, rise) = (0.4 * sd, 0.4 * side);
    for i in 0..ribs {
        let x = -hw + step * (i + 1) as f64;
        parts.push(side_prism(
            &[[0.0, t], [-run, t], [0.0, t + rise]],
            Axis::X,
            x - t / 2.0,
            t,
        ));
    }
    let mut shelf = ctx.union(&parts);

    if p.flag("qr_enabled") {
        let center = Point3::new(0.0, t / 2.0, hs + p.get("qr_offset_y"));
        let size = Vector3::new(p.get("qr_slot_w"), 2.0 * t, p.get("qr_slot_h"));
        shelf = ctx.pocket(&shelf, center, size);
    }
    ctx.finish(&shelf, holes, text)
}
