// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use partforge_geometry::{is_watertight, GeometrySettings, Mesh, SystemFontProvider};
use partforge_processing::{Diagnostic, Error, GenerateRequest, Generated, Generator, ModelRegistry, ParamSet};

fn generator() -> Generator {
    Generator::new(GeometrySettings::default()).with_fonts(SystemFontProvider::builtin_only())
}

fn request(json: &str) -> GenerateRequest {
    serde_json::from_str(json).unwrap()
}

fn run(json: &str) -> Generated {
    generator().generate_request(&request(json)).unwrap()
}

fn analyze_mesh(mesh: &Mesh, name: &str) {
    let b = mesh.bounds();
    println!("\n=== {} ===", name);
    println!("  Triangles: {}", mesh.triangle_count());
    println!(
        "  Bounds: min=({:.3}, {:.3}, {:.3}), max=({:.3}, {:.3}, {:.3})",
        b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z
    );
    println!("  Volume: {:.3}", mesh.signed_volume());
}

#[test]
fn vesa_adapter_has_requested_bounding_box() {
    let part = run(r#"{"model": "vesa_adapter", "params": {"width": 180, "height": 180, "thickness": 6}}"#);
    analyze_mesh(&part.mesh, "vesa_adapter 180x180x6");

    let size = part.mesh.bounds().size();
    assert_relative_eq!(size.x, 180.0, epsilon = 1e-6);
    assert_relative_eq!(size.y, 180.0, epsilon = 1e-6);
    assert_relative_eq!(size.z, 6.0, epsilon = 1e-6);
    assert_eq!(part.model_id, "vesa_adapter");

    // The default VESA pattern is drilled
    let solid = 180.0 * 180.0 * 6.0;
    assert!(part.mesh.signed_volume() < solid);
    assert!(is_watertight(&part.mesh));
}

#[test]
fn drilled_shell_has_less_volume() {
    let plain = run(
        r#"{"model": "enclosure_ip65", "params": {"length": 120, "width": 60, "height": 40, "thickness": 3}}"#,
    );
    let drilled = run(
        r#"{"model": "enclosure_ip65",
            "params": {"length": 120, "width": 60, "height": 40, "thickness": 3},
            "holes": [{"x": 0, "d": 6, "axis": "z"}]}"#,
    );
    analyze_mesh(&plain.mesh, "shell");
    analyze_mesh(&drilled.mesh, "shell with floor hole");

    assert!(drilled.mesh.signed_volume() < plain.mesh.signed_volume());
    let size = plain.mesh.bounds().size();
    assert_relative_eq!(size.x, 120.0, epsilon = 1e-6);
    assert_relative_eq!(size.z, 40.0, epsilon = 1e-6);
}

#[test]
fn unknown_model_is_rejected() {
    let err = generator()
        .generate("unknown_model_xyz", &ParamSet::new(), &[], &[])
        .unwrap_err();
    match err {
        Error::UnknownModel { id, available } => {
            assert_eq!(id, "unknown_model_xyz");
            assert!(available.iter().any(|m| m == "vesa_adapter"));
        }
        other => panic!("unexpected error {}", other),
    }
}

#[test]
fn every_model_builds_with_defaults() {
    let generator = generator();
    for id in ModelRegistry::global().ids() {
        let part = generator.generate(id, &ParamSet::new(), &[], &[]).unwrap();
        assert!(!part.mesh.is_empty(), "{} is empty", id);
        assert!(part.mesh.is_finite(), "{} has non-finite vertices", id);

        let size = part.mesh.bounds().size();
        assert!(size.x > 0.0 && size.y > 0.0 && size.z > 0.0, "{} is flat: {:?}", id, size);
        assert!(part.mesh.signed_volume() > 0.0, "{} has no volume", id);
        assert!(!part.is_degraded(), "{} degraded: {:?}", id, part.diagnostics);
        assert!(is_watertight(&part.mesh), "{} is not watertight", id);

        let invalid = part
            .diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::InvalidParameter { .. }))
            .count();
        assert_eq!(invalid, 0, "{} rejected its own defaults", id);
    }
}

#[test]
fn zero_diameter_holes_change_nothing() {
    let plain = run(r#"{"model": "cable_clip"}"#);
    let with_noop = run(r#"{"model": "cable_clip", "holes": [{"d": 0}, {"diameter": -2, "axis": "x"}]}"#);
    assert_eq!(plain.mesh.vertex_count(), with_noop.mesh.vertex_count());
    assert_eq!(plain.mesh.triangle_count(), with_noop.mesh.triangle_count());
    assert_eq!(plain.mesh.bounds(), with_noop.mesh.bounds());
}

#[test]
fn generation_is_deterministic() {
    let json = r#"{"model": "wall-hook", "params": {"hook_depth": "30,5"},
                   "holes": [{"x": 5, "y": 0, "d": 3}],
                   "text": [{"text": "PF", "mode": "engrave", "size": 8}]}"#;
    let (first, second) = (run(json), run(json));
    assert_eq!(first.mesh, second.mesh);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(request(json).cache_key(), request(json).cache_key());
}

#[test]
fn text_reliefs_follow_their_mode() {
    let base = run(r#"{"model": "camera_plate", "params": {"thickness": 6}}"#);
    let embossed = run(r#"{"model": "camera_plate", "params": {"thickness": 6},
                          "text": [{"text": "CAM", "size": 10, "depth": 1.5, "mode": "emboss"}]}"#);
    let engraved = run(r#"{"model": "camera_plate", "params": {"thickness": 6},
                          "text": [{"text": "CAM", "size": 10, "depth": 1.5}]}"#);

    assert!(embossed.mesh.signed_volume() > base.mesh.signed_volume());
    assert!(embossed.mesh.bounds().max.z > base.mesh.bounds().max.z);
    assert!(engraved.mesh.signed_volume() < base.mesh.signed_volume() + 1e-6);
    assert_relative_eq!(engraved.mesh.bounds().max.z, base.mesh.bounds().max.z, epsilon = 1e-6);
}

#[test]
fn aliases_reach_the_same_model() {
    let part = run(r#"{"model": "gopro-mount"}"#);
    assert_eq!(part.model_id, "go_pro_mount");

    let by_alias = run(r#"{"model": "box_shell", "params": {"thickness_mm": 2}}"#);
    assert_eq!(by_alias.model_id, "enclosure_ip65");
    assert!(by_alias.diagnostics.iter().all(|d| !matches!(d, Diagnostic::InvalidParameter { .. })));
}

#[test]
fn bad_values_fall_back_to_defaults() {
    let part = run(r#"{"model": "qr_plate", "params": {"length": "long", "width": -1}}"#);
    let size = part.mesh.bounds().size();
    assert_relative_eq!(size.x, 90.0, epsilon = 1e-6);
    assert_relative_eq!(size.y, 38.0, epsilon = 1e-6);

    let names: Vec<String> = part
        .diagnostics
        .iter()
        .filter_map(|d| match d {
            Diagnostic::InvalidParameter { name, .. } => Some(name.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["length".to_string(), "width".to_string()]);
}
