// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shells, cases, trays and holders

use super::{block, on_bed};
use crate::params::{ParamSpec, ResolvedParams};
use crate::pipeline::BuildContext;
use crate::registry::ModelEntry;
use partforge_geometry::{Axis, HoleSpec, Mesh, TextOp};

const ENCLOSURE_IP65: &[ParamSpec] = &[
    ParamSpec::length("length", 120.0).aka(&["length_mm"]),
    ParamSpec::length("width", 68.0).aka(&["width_mm"]),
    ParamSpec::length("height", 45.0).aka(&["height_mm"]),
    ParamSpec::length("wall", 3.0).aka(&["thickness", "thickness_mm", "wall_mm"]),
    ParamSpec::length("corner_radius", 6.0).aka(&["fillet_mm"]),
];

const RASPI_CASE: &[ParamSpec] = &[
    ParamSpec::length("board_w", 85.0).aka(&["length", "length_mm"]),
    ParamSpec::length("board_l", 56.0).aka(&["width", "width_mm"]),
    ParamSpec::length("board_h", 17.0).aka(&["height", "height_mm"]),
    ParamSpec::length("wall", 2.2).aka(&["thickness", "thickness_mm"]),
    ParamSpec::length("corner_radius", 3.0).aka(&["fillet_mm"]),
];

const HUB_HOLDER: &[ParamSpec] = &[
    ParamSpec::length("hub_w", 100.0).aka(&["length", "length_mm"]),
    ParamSpec::length("hub_h", 28.0).aka(&["height", "height_mm"]),
    ParamSpec::length("hub_d", 30.0).aka(&["width", "width_mm"]),
    ParamSpec::length("tolerance", 0.5).aka(&["clearance"]),
    ParamSpec::length("wall", 3.0).aka(&["thickness", "thickness_mm"]),
];

const SSD_HOLDER: &[ParamSpec] = &[
    ParamSpec::length("drive_w", 69.85),
    ParamSpec::length("drive_l", 100.0).aka(&["length", "length_mm"]),
    ParamSpec::length("bay_w", 101.6).aka(&["width", "width_mm"]),
    ParamSpec::length("wall", 3.0).aka(&["thickness", "thickness_mm"]),
    ParamSpec::length("height", 20.0).aka(&["height_mm"]),
];

const CABLE_TRAY: &[ParamSpec] = &[
    ParamSpec::length("length", 180.0).aka(&["length_mm"]),
    ParamSpec::length("width", 60.0).aka(&["width_mm"]),
    ParamSpec::length("height", 25.0).aka(&["height_mm"]),
    ParamSpec::length("thickness", 3.0).aka(&["thickness_mm", "wall"]),
    ParamSpec::flag("ventilated", true).aka(&["vented", "vents"]),
    ParamSpec::length("vent_d", 8.0),
    ParamSpec::length("vent_pitch", 30.0),
];

const MONITOR_STAND: &[ParamSpec] = &[
    ParamSpec::length("width", 400.0).aka(&["length", "length_mm"]),
    ParamSpec::length("depth", 200.0).aka(&["width_mm"]),
    ParamSpec::length("height", 70.0).aka(&["height_mm"]),
    ParamSpec::length("wall", 4.0).aka(&["thickness", "thickness_mm"]),
];

pub(super) fn entries() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "enclosure_ip65",
            aliases: &["enclosure", "box_shell", "ip65_enclosure"],
            description: "Open-top rounded box shell",
            defaults: ENCLOSURE_IP65,
            builder: enclosure_ip65,
        },
        ModelEntry {
            id: "raspi_case",
            aliases: &["raspberry_pi_case", "rpi_case"],
            description: "Open-top tray sized around a single-board computer",
            defaults: RASPI_CASE,
            builder: raspi_case,
        },
        ModelEntry {
            id: "hub_holder",
            aliases: &["usb_hub_holder"],
            description: "Sleeve that holds a USB hub, open at the top",
            defaults: HUB_HOLDER,
            builder: hub_holder,
        },
        ModelEntry {
            id: "ssd_holder",
            aliases: &["ssd_bracket", "ssd_adapter"],
            description: "2.5 inch drive carrier for a 3.5 inch bay",
            defaults: SSD_HOLDER,
            builder: ssd_holder,
        },
        ModelEntry {
            id: "cable_tray",
            aliases: &["cable_channel"],
            description: "U-channel cable tray with optional vent holes",
            defaults: CABLE_TRAY,
            builder: cable_tray,
        },
        ModelEntry {
            id: "monitor_stand",
            aliases: &["monitor_riser"],
            description: "Bridge-shaped monitor riser",
            defaults: MONITOR_STAND,
            builder: monitor_stand,
        },
    ]
}

fn enclosure_ip65(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let shell = ctx.shell(
        p.get("length"),
        p.get("width"),
        p.get("height"),
        p.get("wall"),
        p.get("corner_radius"),
    );
    ctx.finish(&on_bed(shell), holes, text)
}

fn raspi_case(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let wall = p.get("wall");
    let shell = ctx.shell(
        p.get("board_w") + 2.0 * wall,
        p.get("board_l") + 2.0 * wall,
        p.get("board_h") + wall,
        wall,
        p.get("corner_radius"),
    );
    ctx.finish(&on_bed(shell), holes, text)
}

fn hub_holder(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (tol, t) = (p.get("tolerance"), p.get("wall").max(0.6));
    let inner_w = p.get("hub_w") + 2.0 * tol;
    let inner_d = p.get("hub_d") + 2.0 * tol;
    let inner_h = p.get("hub_h") + 2.0 * tol;

    let (ow, od, oh) = (inner_w / 2.0 + t, inner_d / 2.0 + t, inner_h + t);
    let outer = block([-ow, -od, 0.0], [ow, od, oh]);
    let pocket = block([-inner_w / 2.0, -inner_d / 2.0, t], [inner_w / 2.0, inner_d / 2.0, oh + 1.0]);
    let sleeve = ctx.difference(&outer, &pocket);
    ctx.finish(&sleeve, holes, text)
}

fn ssd_holder(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (drive_w, drive_l, wall, h) = (p.get("drive_w"), p.get("drive_l"), p.get("wall").max(0.6), p.get("height"));
    let side = ((p.get("bay_w") - drive_w) / 2.0).max(1.0);
    let (half_l, outer) = (drive_l / 2.0, drive_w / 2.0 + side);

    let base = block([-outer, -half_l, 0.0], [outer, half_l, wall]);
    let left = block([-outer, -half_l, 0.0], [-drive_w / 2.0, half_l, wall + h]);
    let right = block([drive_w / 2.0, -half_l, 0.0], [outer, half_l, wall + h]);
    let front = block([-outer, half_l - wall, 0.0], [outer, half_l, wall + h / 2.0]);
    let rear = block([-outer, -half_l, 0.0], [outer, -half_l + wall, wall + h / 2.0]);

    let carrier = ctx.union(&[base, left, right, front, rear]);
    ctx.finish(&carrier, holes, text)
}

fn cable_tray(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (l, w, h) = (p.get("length"), p.get("width"), p.get("height"));
    let t = p.get("thickness").clamp(0.6, (w / 2.0 - 0.1).max(0.6));
    let (half_l, half_w) = (l / 2.0, w / 2.0);

    let floor = block([-half_l, -half_w, 0.0], [half_l, half_w, t]);
    let left = block([-half_l, -half_w, 0.0], [half_l, -half_w + t, h.max(t)]);
    let right = block([-half_l, half_w - t, 0.0], [half_l, half_w, h.max(t)]);
    let tray = ctx.union(&[floor, left, right]);

    let mut all = Vec::new();
    if p.flag("ventilated") {
        let n = ((l / p.get("vent_pitch").max(1.0)).floor() as usize).max(1);
        let step = l / (n + 1) as f64;
        let d = p.get("vent_d").min((w - 2.0 * t) * 0.5);
        all.extend((0..n).map(|i| {
            let x = -half_l + step * (i + 1) as f64;
            HoleSpec::new(d, Axis::Z).at(Some(x), Some(0.0), None)
        }));
    }
    all.extend_from_slice(holes);
    ctx.finish(&tray, &all, text)
}

fn monitor_stand(ctx: &mut BuildContext<'_>, p: &ResolvedParams, holes: &[HoleSpec], text: &[TextOp]) -> Mesh {
    let (w, d, h, t) = (p.get("width"), p.get("depth"), p.get("height"), p.get("wall").max(0.6));
    let (half_w, half_d) = (w / 2.0, d / 2.0);
    let solid = block([-half_w, -half_d, 0.0], [half_w, half_d, h]);

    // Tunnel under the top, open front and back
    let stand = if w - 2.0 * t > 0.1 && h - t > 0.1 {
        let tunnel = block([-half_w + t, -half_d - 1.0, -1.0], [half_w - t, half_d + 1.0, h - t]);
        ctx.difference(&solid, &tunnel)
    } else {
        solid
    };
    ctx.finish(&stand, holes, text)
}
