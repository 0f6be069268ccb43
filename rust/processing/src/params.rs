// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parameter Sets
//!
//! Requests carry loosely typed values; each model declares the names it
//! accepts together with a default. Resolution never fails: bad values fall
//! back to the default and leave an [`InvalidParameter`] note behind.
//!
//! [`InvalidParameter`]: crate::pipeline::Diagnostic::InvalidParameter

use crate::config::parse_flag;
use crate::pipeline::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A request value as it arrives over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Request parameters, ordered by name
pub type ParamSet = BTreeMap<String, ParamValue>;

/// How a declared parameter is validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Finite and non-negative (mm)
    Length,
    /// Any finite number (angles, offsets)
    Number,
    /// Non-negative whole number
    Count,
    /// On/off switch
    Flag,
}

/// One parameter a model accepts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: ParamKind,
    /// Default value; flags use 1.0 for on
    pub default: f64,
}

impl ParamSpec {
    pub const fn length(name: &'static str, default: f64) -> Self {
        Self::declare(name, ParamKind::Length, default)
    }

    pub const fn number(name: &'static str, default: f64) -> Self {
        Self::declare(name, ParamKind::Number, default)
    }

    pub const fn count(name: &'static str, default: f64) -> Self {
        Self::declare(name, ParamKind::Count, default)
    }

    pub const fn flag(name: &'static str, default: bool) -> Self {
        Self::declare(name, ParamKind::Flag, if default { 1.0 } else { 0.0 })
    }

    /// Alternative request keys, tried in order after the name
    pub const fn aka(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    const fn declare(name: &'static str, kind: ParamKind, default: f64) -> Self {
        Self {
            name,
            aliases: &[],
            kind,
            default,
        }
    }

    /// Check a request value against this declaration
    fn accept(&self, value: &ParamValue) -> Result<f64, String> {
        if self.kind == ParamKind::Flag {
            return flag_value(value).map(|on| if on { 1.0 } else { 0.0 });
        }

        let number = numeric_value(value)?;
        if !number.is_finite() {
            return Err(format!("{} is not finite", number));
        }
        match self.kind {
            ParamKind::Length | ParamKind::Count if number < 0.0 => Err(format!("{} is negative", number)),
            ParamKind::Count => Ok(number.round()),
            _ => Ok(number),
        }
    }
}

fn numeric_value(value: &ParamValue) -> Result<f64, String> {
    match value {
        ParamValue::Number(n) => Ok(*n),
        ParamValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        ParamValue::Text(text) => parse_number(text).ok_or_else(|| format!("'{}' is not a number", text)),
        ParamValue::Null => Err("value is null".into()),
    }
}

fn flag_value(value: &ParamValue) -> Result<bool, String> {
    match value {
        ParamValue::Bool(b) => Ok(*b),
        ParamValue::Number(n) if n.is_finite() => Ok(*n != 0.0),
        ParamValue::Number(n) => Err(format!("{} is not finite", n)),
        ParamValue::Text(text) => parse_flag(text).ok_or_else(|| format!("'{}' is not a switch", text)),
        ParamValue::Null => Err("value is null".into()),
    }
}

/// Parse a textual number, accepting `,` as decimal separator
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse().ok()
}

/// Parameters after defaults have been merged in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedParams {
    values: FxHashMap<&'static str, f64>,
}

impl ResolvedParams {
    /// Value of a declared parameter; undeclared names read as 0
    pub fn get(&self, name: &str) -> f64 {
        match self.values.get(name) {
            Some(v) => *v,
            None => {
                tracing::debug!(name, "Read of undeclared parameter");
                0.0
            }
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name) != 0.0
    }

    pub fn count(&self, name: &str) -> usize {
        self.get(name).max(0.0) as usize
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Look a declaration up in the request, by name then by alias
fn find<'p>(spec: &ParamSpec, params: &'p ParamSet) -> Option<(&'p str, &'p ParamValue)> {
    std::iter::once(spec.name)
        .chain(spec.aliases.iter().copied())
        .find_map(|key| params.get_key_value(key))
        .filter(|(_, value)| **value != ParamValue::Null)
        .map(|(key, value)| (key.as_str(), value))
}

/// Merge request values over the declared defaults
pub fn resolve(specs: &[ParamSpec], params: &ParamSet, diagnostics: &mut Vec<Diagnostic>) -> ResolvedParams {
    let mut values = FxHashMap::default();
    for spec in specs {
        let value = match find(spec, params) {
            Some((key, raw)) => match spec.accept(raw) {
                Ok(v) => v,
                Err(reason) => {
                    tracing::debug!(param = key, %reason, "Invalid parameter, using default");
                    diagnostics.push(Diagnostic::InvalidParameter {
                        name: key.to_string(),
                        reason,
                    });
                    spec.default
                }
            },
            None => spec.default,
        };
        values.insert(spec.name, value);
    }

    for key in params.keys() {
        let declared = specs.iter().any(|s| s.name == key.as_str() || s.aliases.contains(&key.as_str()));
        if !declared {
            tracing::debug!(param = %key, "Ignoring undeclared parameter");
        }
    }

    ResolvedParams { values }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[ParamSpec] = &[
        ParamSpec::length("length", 120.0).aka(&["length_mm", "len"]),
        ParamSpec::number("angle", 60.0),
        ParamSpec::count("ribs", 3.0),
        ParamSpec::flag("vented", true),
    ];

    fn params(pairs: &[(&str, ParamValue)]) -> ParamSet {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn defaults_fill_missing_names() {
        let mut notes = Vec::new();
        let resolved = resolve(SPECS, &ParamSet::new(), &mut notes);
        assert_eq!(resolved.get("length"), 120.0);
        assert_eq!(resolved.count("ribs"), 3);
        assert!(resolved.flag("vented"));
        assert!(notes.is_empty());
    }

    #[test]
    fn aliases_and_textual_numbers() {
        let mut notes = Vec::new();
        let request = params(&[("length_mm", "95,5".into()), ("angle", (-15.0).into()), ("ribs", 4.6.into())]);
        let resolved = resolve(SPECS, &request, &mut notes);
        assert_eq!(resolved.get("length"), 95.5);
        assert_eq!(resolved.get("angle"), -15.0);
        assert_eq!(resolved.count("ribs"), 5);
        assert!(notes.is_empty());
    }

    #[test]
    fn name_wins_over_alias() {
        let mut notes = Vec::new();
        let request = params(&[("length", 80.0.into()), ("length_mm", 10.0.into())]);
        assert_eq!(resolve(SPECS, &request, &mut notes).get("length"), 80.0);
    }

    #[test]
    fn invalid_values_fall_back_with_a_note() {
        let mut notes = Vec::new();
        let request = params(&[
            ("length", (-4.0).into()),
            ("angle", "steep".into()),
            ("ribs", f64::NAN.into()),
        ]);
        let resolved = resolve(SPECS, &request, &mut notes);
        assert_eq!(resolved.get("length"), 120.0);
        assert_eq!(resolved.get("angle"), 60.0);
        assert_eq!(resolved.count("ribs"), 3);
        assert_eq!(notes.len(), 3);
        assert!(matches!(&notes[0], Diagnostic::InvalidParameter { name, .. } if name == "length"));
    }

    #[test]
    fn switches_accept_common_spellings() {
        for (raw, expected) in [
            (ParamValue::Bool(false), false),
            (ParamValue::Number(0.0), false),
            (ParamValue::Number(2.0), true),
            ("off".into(), false),
            ("Yes".into(), true),
            ("1".into(), true),
        ] {
            let mut notes = Vec::new();
            let resolved = resolve(SPECS, &params(&[("vented", raw)]), &mut notes);
            assert_eq!(resolved.flag("vented"), expected);
            assert!(notes.is_empty());
        }
    }

    #[test]
    fn null_counts_as_absent() {
        let mut notes = Vec::new();
        let resolved = resolve(SPECS, &params(&[("length", ParamValue::Null)]), &mut notes);
        assert_eq!(resolved.get("length"), 120.0);
        assert!(notes.is_empty());
    }

    #[test]
    fn wire_values_deserialize_untagged() {
        let set: ParamSet = serde_json::from_str(r#"{"a": 1.5, "b": true, "c": "2,5", "d": null}"#).unwrap();
        assert_eq!(set["a"], ParamValue::Number(1.5));
        assert_eq!(set["b"], ParamValue::Bool(true));
        assert_eq!(set["c"], ParamValue::Text("2,5".into()));
        assert_eq!(set["d"], ParamValue::Null);
        assert_eq!(parse_number(" 2,5 "), Some(2.5));
    }
}
