//! Location inventory: stacked parts and resource masses owned per
//! (location, corp). Parts coalesce by a content hash of their normalized
//! form; resources coalesce by resource id.

use crate::hash::canonical_hash;
use crate::ids::{CorpId, LocationId, ResourceId};
use crate::parts::Part;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackType {
    Part,
    Resource,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackKey {
    pub location_id: LocationId,
    pub owner_corp_id: CorpId,
    pub stack_type: StackType,
    /// Resource id for resources; content hash of the normalized part for
    /// parts — see [`part_stack_key`].
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryStack {
    pub quantity: f64,
    pub mass_kg: f64,
    pub volume_m3: f64,
    pub updated_at: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    stacks: HashMap<StackKey, InventoryStack>,
}

/// Content-hash fingerprint used as the part stack key so structurally
/// identical parts coalesce into one stack regardless of insertion order.
#[must_use]
pub fn part_stack_key(part: &Part) -> String {
    canonical_hash(part)
}

impl Inventory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &StackKey) -> Option<&InventoryStack> {
        self.stacks.get(key)
    }

    /// Adjusts a resource stack's quantity/mass/volume by the given deltas
    /// (negative to consume). The row is removed once all tracked
    /// quantities reach zero. Panics never: negative results simply clamp
    /// to 0 and the caller is responsible for pre-checking sufficiency.
    pub fn upsert_resource(
        &mut self,
        location_id: &LocationId,
        owner_corp_id: &CorpId,
        resource_id: &ResourceId,
        delta_mass_kg: f64,
        delta_volume_m3: f64,
        now_s: f64,
    ) {
        let key = StackKey {
            location_id: location_id.clone(),
            owner_corp_id: owner_corp_id.clone(),
            stack_type: StackType::Resource,
            key: resource_id.0.clone(),
        };
        self.apply_delta(key, delta_mass_kg, delta_mass_kg, delta_volume_m3, now_s);
    }

    pub fn upsert_part(
        &mut self,
        location_id: &LocationId,
        owner_corp_id: &CorpId,
        part: &Part,
        delta_count: f64,
        now_s: f64,
    ) {
        let key = StackKey {
            location_id: location_id.clone(),
            owner_corp_id: owner_corp_id.clone(),
            stack_type: StackType::Part,
            key: part_stack_key(part),
        };
        let mass = delta_count * part.mass_kg;
        let volume = delta_count * part.capacity_m3;
        self.apply_delta(key, delta_count, mass, volume, now_s);
    }

    fn apply_delta(
        &mut self,
        key: StackKey,
        delta_quantity: f64,
        delta_mass_kg: f64,
        delta_volume_m3: f64,
        now_s: f64,
    ) {
        let entry = self.stacks.entry(key.clone()).or_insert(InventoryStack {
            quantity: 0.0,
            mass_kg: 0.0,
            volume_m3: 0.0,
            updated_at: now_s,
        });
        entry.quantity = (entry.quantity + delta_quantity).max(0.0);
        entry.mass_kg = (entry.mass_kg + delta_mass_kg).max(0.0);
        entry.volume_m3 = (entry.volume_m3 + delta_volume_m3).max(0.0);
        entry.updated_at = now_s;

        if entry.quantity <= 0.0 && entry.mass_kg <= 0.0 && entry.volume_m3 <= 0.0 {
            self.stacks.remove(&key);
        }
    }

    /// `true` if the location/owner has at least `amount_kg` of the
    /// resource available.
    #[must_use]
    pub fn has_resource(
        &self,
        location_id: &LocationId,
        owner_corp_id: &CorpId,
        resource_id: &ResourceId,
        amount_kg: f64,
    ) -> bool {
        let key = StackKey {
            location_id: location_id.clone(),
            owner_corp_id: owner_corp_id.clone(),
            stack_type: StackType::Resource,
            key: resource_id.0.clone(),
        };
        self.stacks
            .get(&key)
            .is_some_and(|s| s.mass_kg + 1e-9 >= amount_kg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parts::PartCategory;

    #[test]
    fn identical_parts_coalesce_into_one_stack() {
        let mut inv = Inventory::new();
        let loc = LocationId::from("loc");
        let corp = CorpId::from("corp");
        let part = Part {
            item_id: "tank".to_string(),
            category: PartCategory::Storage,
            mass_kg: 100.0,
            capacity_m3: 5.0,
            ..Part::default()
        };
        inv.upsert_part(&loc, &corp, &part, 1.0, 0.0);
        inv.upsert_part(&loc, &corp, &part, 2.0, 0.0);
        let key = StackKey {
            location_id: loc,
            owner_corp_id: corp,
            stack_type: StackType::Part,
            key: part_stack_key(&part),
        };
        let stack = inv.get(&key).unwrap();
        assert!((stack.quantity - 3.0).abs() < 1e-9);
        assert!((stack.mass_kg - 300.0).abs() < 1e-9);
    }

    #[test]
    fn different_parts_get_different_stacks() {
        let a = Part {
            item_id: "a".to_string(),
            mass_kg: 1.0,
            ..Part::default()
        };
        let b = Part {
            item_id: "b".to_string(),
            mass_kg: 1.0,
            ..Part::default()
        };
        assert_ne!(part_stack_key(&a), part_stack_key(&b));
    }

    #[test]
    fn stack_is_removed_once_emptied() {
        let mut inv = Inventory::new();
        let loc = LocationId::from("loc");
        let corp = CorpId::from("corp");
        let resource = ResourceId::from("ore");
        inv.upsert_resource(&loc, &corp, &resource, 100.0, 1.0, 0.0);
        inv.upsert_resource(&loc, &corp, &resource, -100.0, -1.0, 1.0);
        let key = StackKey {
            location_id: loc,
            owner_corp_id: corp,
            stack_type: StackType::Resource,
            key: resource.0,
        };
        assert!(inv.get(&key).is_none());
    }

    #[test]
    fn has_resource_checks_available_mass() {
        let mut inv = Inventory::new();
        let loc = LocationId::from("loc");
        let corp = CorpId::from("corp");
        let resource = ResourceId::from("ore");
        inv.upsert_resource(&loc, &corp, &resource, 50.0, 1.0, 0.0);
        assert!(inv.has_resource(&loc, &corp, &resource, 40.0));
        assert!(!inv.has_resource(&loc, &corp, &resource, 60.0));
    }

    #[test]
    fn quantities_never_go_negative() {
        let mut inv = Inventory::new();
        let loc = LocationId::from("loc");
        let corp = CorpId::from("corp");
        let resource = ResourceId::from("ore");
        inv.upsert_resource(&loc, &corp, &resource, 10.0, 1.0, 0.0);
        inv.upsert_resource(&loc, &corp, &resource, -100.0, -10.0, 1.0);
        let key = StackKey {
            location_id: loc,
            owner_corp_id: corp,
            stack_type: StackType::Resource,
            key: resource.0,
        };
        assert!(inv.get(&key).is_none());
    }
}
