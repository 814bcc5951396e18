//! Transfer lifecycle: dispatch validation/guard rails and the
//! settle-on-access arrival rule. There is no tick loop — a ship's motion
//! state only changes when something reads or dispatches it and finds
//! `arrives_at <= now`.

use crate::celestial::{CelestialConfig, LocationKind};
use crate::error::{Result, SimError};
use crate::ids::LocationId;
use crate::planner::{self, LambertCache};
use crate::route_matrix::{Route, RouteMatrix};
use crate::ship::{self, MotionState, Ship};

const DV_EPSILON_M_S: f64 = 1e-6;

/// Settle-on-access: if the ship is in transit and has arrived, docks it
/// at `to` and clears motion fields. No-op for a docked ship or a ship
/// still en route. Must run before any dispatch validation reads the
/// ship's location.
pub fn settle_arrivals(ship: &mut Ship, now_s: f64) {
    if let Some(motion) = &ship.motion {
        if now_s >= motion.arrives_at {
            ship.location_id = Some(motion.to.clone());
            ship.motion = None;
        }
    }
}

fn location_parent_body<'a>(
    config: &'a CelestialConfig,
    location_id: &LocationId,
) -> Option<crate::ids::BodyId> {
    config.locations.iter().find_map(|loc| {
        if &loc.id != location_id {
            return None;
        }
        match &loc.kind {
            crate::celestial::LocationKind::OrbitNode { body, .. }
            | crate::celestial::LocationKind::Marker { body, .. }
            | crate::celestial::LocationKind::SurfaceSite { body, .. } => Some(body.clone()),
            crate::celestial::LocationKind::LagrangeLine { primary, .. }
            | crate::celestial::LocationKind::LagrangeTriangle { primary, .. } => {
                Some(primary.clone())
            }
            crate::celestial::LocationKind::Group => None,
        }
    })
}

fn is_interplanetary_hop(config: &CelestialConfig, from: &LocationId, to: &LocationId) -> bool {
    let (Some(from_body), Some(to_body)) = (
        location_parent_body(config, from),
        location_parent_body(config, to),
    ) else {
        return false;
    };
    let Ok(from_helio) = config.heliocentric_parent(&from_body) else {
        return false;
    };
    let Ok(to_helio) = config.heliocentric_parent(&to_body) else {
        return false;
    };
    from_helio != to_helio
}

/// Surface-site gravity in m/s^2, or `None` if `location_id` is not a
/// surface site.
fn surface_site_gravity(config: &CelestialConfig, location_id: &LocationId) -> Option<f64> {
    let loc = config.locations.iter().find(|l| &l.id == location_id)?;
    let LocationKind::SurfaceSite { body, .. } = &loc.kind else {
        return None;
    };
    config
        .bodies
        .iter()
        .find(|b| &b.id == body)
        .map(|b| b.surface_gravity_m_s2)
}

/// Resolves the route's effective dv/tof: if the first hop of the route
/// crosses a heliocentric boundary, replace the static matrix weight with
/// the Lambert-solved interplanetary leg at `departure_time_s` — same-body
/// legs use the matrix row unchanged.
fn effective_route(
    config: &CelestialConfig,
    route: &Route,
    departure_time_s: f64,
    extra_dv_fraction: f64,
    cache: &mut LambertCache,
) -> Result<(f64, f64)> {
    if route.path.len() < 2 {
        return Ok((route.dv_m_s, route.tof_s));
    }
    let from = &route.path[0];
    let to = &route.path[route.path.len() - 1];
    if !is_interplanetary_hop(config, from, to) {
        return Ok((route.dv_m_s, route.tof_s));
    }

    if let Some(cached) = cache.get(from, to, departure_time_s, extra_dv_fraction) {
        return Ok((cached.dv_m_s, cached.tof_s));
    }

    let from_body = location_parent_body(config, from)
        .ok_or_else(|| SimError::not_found(format!("location {from}")))?;
    let to_body = location_parent_body(config, to)
        .ok_or_else(|| SimError::not_found(format!("location {to}")))?;
    let from_helio = config.heliocentric_parent(&from_body)?;
    let to_helio = config.heliocentric_parent(&to_body)?;

    let leg = planner::compute_interplanetary_leg(
        config,
        &from_helio,
        &to_helio,
        departure_time_s,
        extra_dv_fraction,
    )
    .ok_or_else(|| SimError::precondition("no viable interplanetary transfer window"))?;

    let result = (leg.dv_m_s, leg.tof_s);
    cache.put(from, to, departure_time_s, extra_dv_fraction, leg);
    Ok(result)
}

/// Validates and executes a transfer dispatch per the documented guard
/// rails (overheat gate, delta-v gate, TWR-at-surface-sites gate), then
/// mutates the ship into its in-transit state. Callers must call
/// [`settle_arrivals`] on every ship they read before calling this.
pub fn dispatch(
    ship: &mut Ship,
    config: &CelestialConfig,
    matrix: &RouteMatrix,
    cache: &mut LambertCache,
    to_location_id: &LocationId,
    now_s: f64,
    extra_dv_fraction: f64,
) -> Result<()> {
    let current = ship
        .location_id
        .clone()
        .ok_or_else(|| SimError::precondition("ship is not docked"))?;

    let route = matrix
        .route(&current, to_location_id)
        .ok_or_else(|| SimError::not_found(format!("no route {current} -> {to_location_id}")))?
        .clone();

    let stats = ship::derive_stats(&ship.parts, ship.fuel_kg);
    let balance = ship::power_balance(&ship.parts);
    if balance.waste_heat_surplus_mw > 0.0 {
        return Err(SimError::precondition("ship is overheating"));
    }

    let (dv_m_s, tof_s) = effective_route(config, &route, now_s, extra_dv_fraction, cache)?;

    if dv_m_s > stats.delta_v_remaining_m_s + DV_EPSILON_M_S {
        return Err(SimError::precondition("insufficient delta-v for route"));
    }

    for leaf in &route.path {
        if let Some(gravity) = surface_site_gravity(config, leaf) {
            let twr = (stats.thrust_kn * 1000.0) / (stats.wet_mass_kg * gravity);
            if twr < 1.0 {
                return Err(SimError::precondition(format!(
                    "thrust-to-weight ratio below 1.0 at surface site {leaf}"
                )));
            }
        }
    }

    let fuel_used = ship::fuel_for_delta_v(stats.dry_mass_kg, ship.fuel_kg, stats.isp_s, dv_m_s);
    ship.fuel_kg = (ship.fuel_kg - fuel_used).max(0.0);
    ship.location_id = None;
    ship.motion = Some(MotionState {
        from: current,
        to: to_location_id.clone(),
        departed_at: now_s,
        arrives_at: now_s + tof_s,
        transfer_path: route.path,
        planned_dv_m_s: dv_m_s,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{CorpId, ShipId};
    use crate::parts::{Part, PartCategory};
    use crate::test_fixtures::{base_celestial_config, base_route_matrix};

    fn docked_ship(location: &str) -> Ship {
        Ship {
            id: ShipId::from("ship-1"),
            name: "Test Ship".to_string(),
            owner_corp_id: CorpId::from("corp-1"),
            parts: vec![
                Part {
                    item_id: "th".to_string(),
                    category: PartCategory::Thruster,
                    isp_s: 3000.0,
                    thrust_kn: 5.0,
                    mass_kg: 500.0,
                    ..Part::default()
                },
                Part {
                    item_id: "tank".to_string(),
                    category: PartCategory::Storage,
                    capacity_m3: 20.0,
                    mass_kg: 200.0,
                    ..Part::default()
                },
            ],
            fuel_kg: 15000.0,
            location_id: Some(LocationId::from(location)),
            motion: None,
        }
    }

    #[test]
    fn settle_arrivals_docks_ship_past_arrival_time() {
        let mut ship = docked_ship("leo");
        ship.location_id = None;
        ship.motion = Some(MotionState {
            from: LocationId::from("leo"),
            to: LocationId::from("geo"),
            departed_at: 0.0,
            arrives_at: 100.0,
            transfer_path: vec![LocationId::from("leo"), LocationId::from("geo")],
            planned_dv_m_s: 10.0,
        });
        settle_arrivals(&mut ship, 150.0);
        assert_eq!(ship.location_id, Some(LocationId::from("geo")));
        assert!(ship.motion.is_none());
    }

    #[test]
    fn settle_arrivals_is_noop_before_arrival() {
        let mut ship = docked_ship("leo");
        ship.location_id = None;
        ship.motion = Some(MotionState {
            from: LocationId::from("leo"),
            to: LocationId::from("geo"),
            departed_at: 0.0,
            arrives_at: 500.0,
            transfer_path: vec![],
            planned_dv_m_s: 10.0,
        });
        settle_arrivals(&mut ship, 150.0);
        assert!(ship.location_id.is_none());
        assert!(ship.motion.is_some());
    }

    #[test]
    fn dispatch_rejects_ship_in_transit() {
        let config = base_celestial_config();
        let matrix = base_route_matrix(&config);
        let mut cache = LambertCache::new();
        let mut ship = docked_ship("leo");
        ship.location_id = None;
        ship.motion = Some(MotionState {
            from: LocationId::from("leo"),
            to: LocationId::from("geo"),
            departed_at: 0.0,
            arrives_at: 500.0,
            transfer_path: vec![],
            planned_dv_m_s: 0.0,
        });
        let err = dispatch(
            &mut ship,
            &config,
            &matrix,
            &mut cache,
            &LocationId::from("geo"),
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::PreconditionFailed(_)));
    }

    #[test]
    fn dispatch_rejects_missing_route() {
        let config = base_celestial_config();
        let matrix = base_route_matrix(&config);
        let mut cache = LambertCache::new();
        let mut ship = docked_ship("leo");
        let err = dispatch(
            &mut ship,
            &config,
            &matrix,
            &mut cache,
            &LocationId::from("does_not_exist"),
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::NotFound(_)));
    }

    #[test]
    fn dispatch_rejects_insufficient_delta_v() {
        let config = base_celestial_config();
        let matrix = base_route_matrix(&config);
        let mut cache = LambertCache::new();
        let mut ship = docked_ship("leo");
        ship.fuel_kg = 0.0;
        let err = dispatch(
            &mut ship,
            &config,
            &matrix,
            &mut cache,
            &LocationId::from("geo"),
            0.0,
            0.0,
        )
        .unwrap_err();
        assert!(matches!(err, SimError::PreconditionFailed(_)));
    }

    #[test]
    fn successful_dispatch_puts_ship_in_transit_and_consumes_fuel() {
        let config = base_celestial_config();
        let matrix = base_route_matrix(&config);
        let mut cache = LambertCache::new();
        let mut ship = docked_ship("leo");
        let fuel_before = ship.fuel_kg;
        dispatch(
            &mut ship,
            &config,
            &matrix,
            &mut cache,
            &LocationId::from("geo"),
            0.0,
            0.0,
        )
        .expect("dispatch should succeed");
        assert!(ship.location_id.is_none());
        assert!(ship.motion.is_some());
        assert!(ship.fuel_kg < fuel_before);
    }
}
