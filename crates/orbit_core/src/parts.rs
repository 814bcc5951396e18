//! Parts catalog and normalization. A ship's `parts` field is stored as a
//! list of either bare catalog-key strings or inline objects with
//! overrides; `normalize()` resolves either form against the category
//! catalogs into one canonical [`Part`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankPhase {
    Solid,
    Liquid,
    Gas,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCategory {
    Thruster,
    Reactor,
    Generator,
    Radiator,
    Robonaut,
    Refinery,
    Constructor,
    Storage,
    Material,
    Fuel,
    Generic,
}

/// A single part, fully resolved: category plus whichever attributes that
/// category cares about. Fields irrelevant to a category stay at their
/// default (0.0 / None) rather than being modeled as a nested enum — the
/// catalog data is this flat on disk and ships store it the same way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub item_id: String,
    pub name: String,
    pub category: PartCategory,
    pub mass_kg: f64,
    pub isp_s: f64,
    pub thrust_kn: f64,
    pub thermal_mw: f64,
    pub thermal_mw_input: f64,
    pub electric_mw: f64,
    pub conversion_efficiency: f64,
    pub heat_rejection_mw: f64,
    pub capacity_m3: f64,
    pub resource_id: Option<String>,
    pub tank_phase: Option<TankPhase>,
    pub cargo_fill_kg: Option<f64>,
}

impl Default for Part {
    fn default() -> Self {
        Self {
            item_id: String::new(),
            name: String::new(),
            category: PartCategory::Generic,
            mass_kg: 0.0,
            isp_s: 0.0,
            thrust_kn: 0.0,
            thermal_mw: 0.0,
            thermal_mw_input: 0.0,
            electric_mw: 0.0,
            conversion_efficiency: 0.0,
            heat_rejection_mw: 0.0,
            capacity_m3: 0.0,
            resource_id: None,
            tank_phase: None,
            cargo_fill_kg: None,
        }
    }
}

/// A part reference as authored: a bare catalog key, or an inline object
/// carrying a catalog key plus field overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PartRef {
    Key(String),
    Inline {
        item_id: String,
        #[serde(default)]
        overrides: PartOverrides,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartOverrides {
    pub mass_kg: Option<f64>,
    pub isp_s: Option<f64>,
    pub thrust_kn: Option<f64>,
    pub capacity_m3: Option<f64>,
    pub cargo_fill_kg: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct PartCatalog {
    entries: HashMap<String, Part>,
}

/// Catalog keys that don't match any entry fall back to "generic" via a
/// cheap alias table keyed on substring — enough to keep a ship buildable
/// from a partial catalog during content iteration rather than hard-erroring.
const GENERIC_ALIASES: &[(&str, PartCategory)] = &[
    ("thruster", PartCategory::Thruster),
    ("engine", PartCategory::Thruster),
    ("reactor", PartCategory::Reactor),
    ("generator", PartCategory::Generator),
    ("radiator", PartCategory::Radiator),
    ("robonaut", PartCategory::Robonaut),
    ("refinery", PartCategory::Refinery),
    ("constructor", PartCategory::Constructor),
    ("tank", PartCategory::Storage),
    ("storage", PartCategory::Storage),
];

impl PartCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, part: Part) {
        self.entries.insert(part.item_id.clone(), part);
    }

    #[must_use]
    pub fn get(&self, item_id: &str) -> Option<&Part> {
        self.entries.get(item_id)
    }

    /// Resolve a `PartRef` against this catalog. Unknown keys fall back to
    /// a generic part whose category is guessed from the key by alias
    /// substring match (still generic if nothing matches).
    #[must_use]
    pub fn normalize(&self, part_ref: &PartRef) -> Part {
        let (item_id, overrides) = match part_ref {
            PartRef::Key(key) => (key.clone(), PartOverrides::default()),
            PartRef::Inline { item_id, overrides } => (item_id.clone(), overrides.clone()),
        };

        let mut part = self.entries.get(&item_id).cloned().unwrap_or_else(|| {
            let category = GENERIC_ALIASES
                .iter()
                .find(|(needle, _)| item_id.to_lowercase().contains(needle))
                .map_or(PartCategory::Generic, |(_, cat)| cat.clone());
            Part {
                item_id: item_id.clone(),
                name: item_id.clone(),
                category,
                ..Part::default()
            }
        });

        if let Some(v) = overrides.mass_kg {
            part.mass_kg = v;
        }
        if let Some(v) = overrides.isp_s {
            part.isp_s = v;
        }
        if let Some(v) = overrides.thrust_kn {
            part.thrust_kn = v;
        }
        if let Some(v) = overrides.capacity_m3 {
            part.capacity_m3 = v;
        }
        if let Some(v) = overrides.cargo_fill_kg {
            part.cargo_fill_kg = Some(v);
        }
        part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thruster(item_id: &str, isp: f64, thrust: f64) -> Part {
        Part {
            item_id: item_id.to_string(),
            name: item_id.to_string(),
            category: PartCategory::Thruster,
            isp_s: isp,
            thrust_kn: thrust,
            mass_kg: 200.0,
            ..Part::default()
        }
    }

    #[test]
    fn known_key_resolves_from_catalog() {
        let mut catalog = PartCatalog::new();
        catalog.insert(thruster("ion_drive", 3000.0, 0.5));
        let resolved = catalog.normalize(&PartRef::Key("ion_drive".to_string()));
        assert_eq!(resolved.category, PartCategory::Thruster);
        assert!((resolved.isp_s - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_key_falls_back_to_alias_guess() {
        let catalog = PartCatalog::new();
        let resolved = catalog.normalize(&PartRef::Key("mystery_thruster_mk2".to_string()));
        assert_eq!(resolved.category, PartCategory::Thruster);
    }

    #[test]
    fn unknown_key_with_no_alias_match_is_generic() {
        let catalog = PartCatalog::new();
        let resolved = catalog.normalize(&PartRef::Key("widget".to_string()));
        assert_eq!(resolved.category, PartCategory::Generic);
    }

    #[test]
    fn inline_overrides_apply_on_top_of_catalog_entry() {
        let mut catalog = PartCatalog::new();
        catalog.insert(thruster("ion_drive", 3000.0, 0.5));
        let part_ref = PartRef::Inline {
            item_id: "ion_drive".to_string(),
            overrides: PartOverrides {
                thrust_kn: Some(0.8),
                ..PartOverrides::default()
            },
        };
        let resolved = catalog.normalize(&part_ref);
        assert!((resolved.thrust_kn - 0.8).abs() < 1e-9);
        assert!((resolved.isp_s - 3000.0).abs() < 1e-9);
    }
}
