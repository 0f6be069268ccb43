// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model Registry
//!
//! Immutable table from model id to builder. Ids are normalized before
//! lookup, so `Wall-Hook`, `wall hook` and `wall_hook` all resolve to the
//! same entry, and each entry may carry extra aliases.

use crate::error::{Error, Result};
use crate::models;
use crate::params::{ParamSpec, ResolvedParams};
use crate::pipeline::BuildContext;
use partforge_geometry::{HoleSpec, Mesh, TextOp};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// Builds a model mesh from resolved parameters
pub type Builder = fn(&mut BuildContext<'_>, &ResolvedParams, &[HoleSpec], &[TextOp]) -> Mesh;

/// One generatable part
#[derive(Clone, Copy)]
pub struct ModelEntry {
    pub id: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub defaults: &'static [ParamSpec],
    pub builder: Builder,
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("id", &self.id)
            .field("aliases", &self.aliases)
            .field("params", &self.defaults.len())
            .finish()
    }
}

/// Lookup table of model entries
#[derive(Debug)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
    index: FxHashMap<String, usize>,
}

static GLOBAL: OnceLock<ModelRegistry> = OnceLock::new();

/// Canonical form of a model id: trimmed, lowercase, `-` and spaces as `_`
pub fn normalize_id(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

impl ModelRegistry {
    /// The built-in catalogue
    pub fn builtin() -> Self {
        Self::from_entries(models::catalogue())
    }

    /// Process-wide built-in registry
    pub fn global() -> &'static ModelRegistry {
        GLOBAL.get_or_init(Self::builtin)
    }

    /// Index entries by id and alias; the first entry claiming a key wins
    pub fn from_entries(entries: Vec<ModelEntry>) -> Self {
        let mut index: FxHashMap<String, usize> = FxHashMap::default();
        for (slot, entry) in entries.iter().enumerate() {
            for key in std::iter::once(entry.id).chain(entry.aliases.iter().copied()) {
                let key = normalize_id(key);
                if let Some(existing) = index.get(&key) {
                    tracing::warn!(key = %key, kept = entries[*existing].id, dropped = entry.id, "Duplicate model key");
                    continue;
                }
                index.insert(key, slot);
            }
        }
        Self { entries, index }
    }

    pub fn lookup(&self, id: &str) -> Result<&ModelEntry> {
        self.index
            .get(&normalize_id(id))
            .map(|slot| &self.entries[*slot])
            .ok_or_else(|| Error::UnknownModel {
                id: id.to_string(),
                available: self.ids().into_iter().map(String::from).collect(),
            })
    }

    /// Canonical ids, sorted
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.entries.iter().map(|e| e.id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_ids() {
        assert_eq!(normalize_id("  Wall-Bracket "), "wall_bracket");
        assert_eq!(normalize_id("go pro-MOUNT"), "go_pro_mount");
    }

    #[test]
    fn builtin_catalogue_is_complete() {
        let registry = ModelRegistry::builtin();
        assert_eq!(registry.len(), 21);
        for entry in registry.entries() {
            assert_eq!(registry.lookup(entry.id).map(|e| e.id).ok(), Some(entry.id));
            assert!(!entry.description.is_empty());
            assert!(!entry.defaults.is_empty(), "{} declares no parameters", entry.id);
        }
    }

    #[test]
    fn aliases_resolve_to_canonical_entries() {
        let registry = ModelRegistry::global();
        assert_eq!(registry.lookup("gopro-mount").map(|e| e.id).ok(), Some("go_pro_mount"));
        assert_eq!(registry.lookup("Wall-Bracket-Hook").map(|e| e.id).ok(), Some("wall_hook"));
        assert_eq!(registry.lookup("VESA-adapter").map(|e| e.id).ok(), Some("vesa_adapter"));
    }

    #[test]
    fn first_entry_keeps_a_contested_key() {
        let catalogue = models::catalogue();
        let mut first = catalogue[0];
        let mut second = catalogue[1];
        first.aliases = &["shared"];
        second.aliases = &["Shared", "second-only"];

        let registry = ModelRegistry::from_entries(vec![first, second]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("shared").map(|e| e.id).ok(), Some(first.id));
        assert_eq!(registry.lookup("second_only").map(|e| e.id).ok(), Some(second.id));
        assert_eq!(registry.lookup(second.id).map(|e| e.id).ok(), Some(second.id));
    }

    #[test]
    fn unknown_id_reports_sorted_catalogue() {
        match ModelRegistry::global().lookup("unknown_model_xyz") {
            Err(Error::UnknownModel { id, available }) => {
                assert_eq!(id, "unknown_model_xyz");
                assert_eq!(available.len(), 21);
                assert!(available.windows(2).all(|w| w[0] < w[1]));
            }
            other => panic!("expected UnknownModel, got {:?}", other.map(|e| e.id)),
        }
    }

    #[test]
    fn declared_defaults_are_valid() {
        for entry in ModelRegistry::global().entries() {
            for spec in entry.defaults {
                assert!(spec.default.is_finite(), "{}.{}", entry.id, spec.name);
                assert!(spec.default >= 0.0 || spec.kind == crate::params::ParamKind::Number);
            }
        }
    }
}
