//! Ship dynamics: normalized-parts → derived stats, Tsiolkovsky fuel
//! accounting, and the steady-state power/thermal balance checked at
//! transfer dispatch.

use crate::ids::{CorpId, LocationId, ShipId};
use crate::parts::{Part, PartCategory};
use serde::{Deserialize, Serialize};

pub const G0_M_S2: f64 = 9.80665;
const WATER_DENSITY_KG_M3: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub from: LocationId,
    pub to: LocationId,
    pub departed_at: f64,
    pub arrives_at: f64,
    pub transfer_path: Vec<LocationId>,
    pub planned_dv_m_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub name: String,
    pub owner_corp_id: CorpId,
    pub parts: Vec<Part>,
    pub fuel_kg: f64,
    /// Exactly one of `location_id` / `motion` is `Some` at any time.
    pub location_id: Option<LocationId>,
    pub motion: Option<MotionState>,
}

impl Ship {
    #[must_use]
    pub fn is_docked(&self) -> bool {
        self.location_id.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShipStats {
    pub dry_mass_kg: f64,
    pub fuel_capacity_kg: f64,
    pub isp_s: f64,
    pub thrust_kn: f64,
    pub wet_mass_kg: f64,
    pub accel_g: f64,
    pub delta_v_remaining_m_s: f64,
}

/// Sum of part mass, max thruster ISP, summed thrust, and the
/// Tsiolkovsky delta-v remaining at the ship's current fuel load.
#[must_use]
pub fn derive_stats(parts: &[Part], fuel_kg: f64) -> ShipStats {
    let dry_mass_kg: f64 = parts.iter().map(|p| p.mass_kg).sum();
    let fuel_capacity_kg: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Storage)
        .map(|p| p.capacity_m3 * WATER_DENSITY_KG_M3)
        .sum();
    let isp_s = parts
        .iter()
        .filter(|p| p.category == PartCategory::Thruster)
        .map(|p| p.isp_s)
        .fold(0.0_f64, f64::max);
    let thrust_kn: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Thruster)
        .map(|p| p.thrust_kn)
        .sum();

    let fuel_kg = fuel_kg.min(fuel_capacity_kg).max(0.0);
    let wet_mass_kg = dry_mass_kg + fuel_kg;
    let thrust_n = thrust_kn * 1000.0;
    let accel_g = if wet_mass_kg > 0.0 {
        thrust_n / (wet_mass_kg * G0_M_S2)
    } else {
        0.0
    };
    let delta_v_remaining_m_s = if isp_s > 0.0 && dry_mass_kg > 0.0 && wet_mass_kg > dry_mass_kg {
        isp_s * G0_M_S2 * (wet_mass_kg / dry_mass_kg).ln()
    } else if isp_s > 0.0 && dry_mass_kg > 0.0 {
        0.0
    } else {
        0.0
    };

    ShipStats {
        dry_mass_kg,
        fuel_capacity_kg,
        isp_s,
        thrust_kn,
        wet_mass_kg,
        accel_g,
        delta_v_remaining_m_s,
    }
}

/// Fuel mass consumed to achieve `dv_m_s` starting from `dry_mass_kg` +
/// `fuel_kg`. Returns `fuel_kg + 1.0` (an over-budget sentinel, never a
/// valid answer) when isp or dry mass is zero — the burn is not possible
/// at all, not merely expensive.
#[must_use]
pub fn fuel_for_delta_v(dry_mass_kg: f64, fuel_kg: f64, isp_s: f64, dv_m_s: f64) -> f64 {
    if isp_s <= 0.0 || dry_mass_kg <= 0.0 {
        return fuel_kg + 1.0;
    }
    let m0 = dry_mass_kg + fuel_kg;
    let used = m0 - m0 / (dv_m_s / (isp_s * G0_M_S2)).exp();
    used.clamp(0.0, fuel_kg)
}

/// Fills each storage part's `cargo_fill_kg` proportionally from the
/// ship's total fuel load, so the containers' fills sum to `fuel_kg`.
/// Storage parts with an explicit `cargo_fill_kg` already set (non-water
/// cargo) are left untouched.
pub fn distribute_fuel_into_containers(parts: &mut [Part], fuel_kg: f64) {
    let total_capacity: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Storage && p.cargo_fill_kg.is_none())
        .map(|p| p.capacity_m3)
        .sum();
    if total_capacity <= 0.0 {
        return;
    }
    for part in parts
        .iter_mut()
        .filter(|p| p.category == PartCategory::Storage && p.cargo_fill_kg.is_none())
    {
        let share = part.capacity_m3 / total_capacity;
        part.cargo_fill_kg = Some(fuel_kg * share);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerBalance {
    pub reactor_supply_mw: f64,
    pub thruster_demand_mw: f64,
    pub throttle_cap: f64,
    pub generator_electric_mw: f64,
    pub generator_waste_mw: f64,
    pub radiator_rejection_mw: f64,
    pub electric_surplus_mw: f64,
    pub waste_heat_surplus_mw: f64,
}

/// Steady-state power/thermal snapshot — not a simulation over time, just
/// the instantaneous balance given the current part list. `waste_heat_surplus_mw`
/// is the value transfer dispatch gates on: positive means the ship is
/// overheating and the burn is rejected.
#[must_use]
pub fn power_balance(parts: &[Part]) -> PowerBalance {
    let reactor_supply_mw: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Reactor)
        .map(|p| p.thermal_mw)
        .sum();
    let thruster_demand_mw: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Thruster)
        .map(|p| p.thermal_mw)
        .sum();
    let generator_thermal_input_mw: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Generator)
        .map(|p| p.thermal_mw_input)
        .sum();

    let throttle_cap = if thruster_demand_mw > 0.0 {
        (reactor_supply_mw / thruster_demand_mw).min(1.0)
    } else {
        1.0
    };

    let generator_efficiency = parts
        .iter()
        .filter(|p| p.category == PartCategory::Generator)
        .map(|p| p.conversion_efficiency)
        .fold(0.0_f64, f64::max);
    let generator_electric_mw = generator_efficiency * generator_thermal_input_mw;
    let generator_waste_mw = (1.0 - generator_efficiency) * generator_thermal_input_mw;

    let radiator_rejection_mw: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Radiator)
        .map(|p| p.heat_rejection_mw)
        .sum();

    let robonaut_demand_mw: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Robonaut)
        .map(|p| p.electric_mw)
        .sum();
    let constructor_demand_mw: f64 = parts
        .iter()
        .filter(|p| p.category == PartCategory::Constructor)
        .map(|p| p.electric_mw)
        .sum();
    let electric_surplus_mw = generator_electric_mw - robonaut_demand_mw - constructor_demand_mw;

    let waste_heat_surplus_mw = generator_waste_mw - radiator_rejection_mw;

    PowerBalance {
        reactor_supply_mw,
        thruster_demand_mw,
        throttle_cap,
        generator_electric_mw,
        generator_waste_mw,
        radiator_rejection_mw,
        electric_surplus_mw,
        waste_heat_surplus_mw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thruster(isp: f64, thrust_kn: f64, mass: f64) -> Part {
        Part {
            item_id: "th".to_string(),
            name: "th".to_string(),
            category: PartCategory::Thruster,
            isp_s: isp,
            thrust_kn,
            mass_kg: mass,
            ..Part::default()
        }
    }

    fn tank(capacity_m3: f64, mass: f64) -> Part {
        Part {
            item_id: "tank".to_string(),
            name: "tank".to_string(),
            category: PartCategory::Storage,
            capacity_m3,
            mass_kg: mass,
            ..Part::default()
        }
    }

    #[test]
    fn derive_stats_zero_dry_mass_has_zero_delta_v() {
        let stats = derive_stats(&[], 0.0);
        assert_eq!(stats.delta_v_remaining_m_s, 0.0);
        assert_eq!(stats.dry_mass_kg, 0.0);
    }

    #[test]
    fn derive_stats_computes_tsiolkovsky_delta_v() {
        let parts = vec![thruster(3000.0, 0.5, 500.0), tank(10.0, 100.0)];
        let stats = derive_stats(&parts, 5000.0);
        assert!((stats.fuel_capacity_kg - 10_000.0).abs() < 1e-6);
        let expected_dv = 3000.0 * G0_M_S2 * ((600.0 + 5000.0) / 600.0_f64).ln();
        assert!((stats.delta_v_remaining_m_s - expected_dv).abs() < 1e-3);
    }

    #[test]
    fn fuel_for_delta_v_roundtrips_with_derive_stats() {
        let parts = vec![thruster(3000.0, 0.5, 500.0), tank(10.0, 100.0)];
        let stats = derive_stats(&parts, 5000.0);
        let used = fuel_for_delta_v(stats.dry_mass_kg, 5000.0, stats.isp_s, stats.delta_v_remaining_m_s);
        assert!((used - 5000.0).abs() < 1.0);
    }

    #[test]
    fn fuel_for_delta_v_with_zero_isp_returns_over_budget_sentinel() {
        let used = fuel_for_delta_v(500.0, 1000.0, 0.0, 100.0);
        assert!((used - 1001.0).abs() < 1e-9);
    }

    #[test]
    fn distribute_fuel_splits_proportionally_across_tanks() {
        let mut parts = vec![tank(10.0, 50.0), tank(30.0, 50.0)];
        distribute_fuel_into_containers(&mut parts, 4000.0);
        assert!((parts[0].cargo_fill_kg.unwrap() - 1000.0).abs() < 1e-6);
        assert!((parts[1].cargo_fill_kg.unwrap() - 3000.0).abs() < 1e-6);
    }

    #[test]
    fn power_balance_detects_overheat() {
        let parts = vec![
            Part {
                category: PartCategory::Generator,
                thermal_mw_input: 10.0,
                conversion_efficiency: 0.3,
                ..Part::default()
            },
            Part {
                category: PartCategory::Radiator,
                heat_rejection_mw: 2.0,
                ..Part::default()
            },
        ];
        let balance = power_balance(&parts);
        assert!(balance.waste_heat_surplus_mw > 0.0);
    }

    #[test]
    fn power_balance_no_overheat_when_radiators_cover_waste() {
        let parts = vec![
            Part {
                category: PartCategory::Generator,
                thermal_mw_input: 10.0,
                conversion_efficiency: 0.3,
                ..Part::default()
            },
            Part {
                category: PartCategory::Radiator,
                heat_rejection_mw: 20.0,
                ..Part::default()
            },
        ];
        let balance = power_balance(&parts);
        assert!(balance.waste_heat_surplus_mw <= 0.0);
    }
}
