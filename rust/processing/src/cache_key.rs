// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request keys for caching generated parts

use crate::params::ParamSet;
use crate::registry::normalize_id;
use partforge_geometry::{HoleSpec, TextOp};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest
const KEY_LEN: usize = 16;

fn axis_name(hole: &HoleSpec) -> &'static str {
    match hole.axis {
        partforge_geometry::Axis::X => "x",
        partforge_geometry::Axis::Y => "y",
        partforge_geometry::Axis::Z => "z",
    }
}

/// Canonical JSON for a request; object keys come out sorted
fn canonical(model: &str, params: &ParamSet, holes: &[HoleSpec], text_ops: &[TextOp]) -> Value {
    let holes: Vec<Value> = holes
        .iter()
        .map(|h| json!({ "x": h.x, "y": h.y, "z": h.z, "d": h.diameter, "axis": axis_name(h) }))
        .collect();
    let text: Vec<Value> = text_ops
        .iter()
        .map(|op| {
            json!({
                "text": op.text,
                "size": op.size,
                "depth": op.depth,
                "mode": op.mode.to_string(),
                "anchor": op.anchor.to_string(),
                "offset": op.offset,
                "font": op.font,
            })
        })
        .collect();
    json!({
        "model": normalize_id(model),
        "params": params,
        "holes": holes,
        "text": text,
    })
}

/// SHA-256 of the canonical request encoding, truncated to 16 hex chars
pub fn request_key(model: &str, params: &ParamSet, holes: &[HoleSpec], text_ops: &[TextOp]) -> String {
    let encoded = canonical(model, params, holes, text_ops).to_string();
    let mut hasher = Sha256::new();
    hasher.update(encoded.as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(KEY_LEN);
    key
}
