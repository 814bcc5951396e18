//! Fixtures shared by unit tests across modules: a minimal but physically
//! sane sun/earth/mars topology with one orbit node, one Lagrange point,
//! and one surface site per body, small enough to read in one screen.

use crate::celestial::{
    Body, CelestialConfig, EdgeType, LagrangePoint, LocationDef, LocationKind, PositionSpec,
    TransferEdge,
};
use crate::ids::{BodyId, LocationId};
use crate::route_matrix::RouteMatrix;

const MU_SUN: f64 = 1.327_124_4e11;
const MU_EARTH: f64 = 398_600.0;
const MU_MARS: f64 = 42_828.0;
const AU_KM: f64 = 1.496e8;

#[must_use]
pub fn base_celestial_config() -> CelestialConfig {
    let sun = Body {
        id: BodyId::from("sun"),
        mu_km3_s2: MU_SUN,
        radius_km: 696_340.0,
        surface_gravity_m_s2: 274.0,
        position: PositionSpec::Fixed { x_km: 0.0, y_km: 0.0 },
    };
    let earth = Body {
        id: BodyId::from("earth"),
        mu_km3_s2: MU_EARTH,
        radius_km: 6371.0,
        surface_gravity_m_s2: 9.81,
        position: PositionSpec::Keplerian {
            parent: BodyId::from("sun"),
            a_km: AU_KM,
            e: 0.0167,
            i_deg: 0.0,
            raan_deg: 0.0,
            argp_deg: 0.0,
            m0_deg: 0.0,
            period_s: 365.25 * 86_400.0,
            epoch_s: 0.0,
        },
    };
    let mars = Body {
        id: BodyId::from("mars"),
        mu_km3_s2: MU_MARS,
        radius_km: 3389.5,
        surface_gravity_m_s2: 3.71,
        position: PositionSpec::Keplerian {
            parent: BodyId::from("sun"),
            a_km: 1.524 * AU_KM,
            e: 0.0934,
            i_deg: 1.85,
            raan_deg: 49.6,
            argp_deg: 286.5,
            m0_deg: 19.4,
            period_s: 686.98 * 86_400.0,
            epoch_s: 0.0,
        },
    };

    let leo = LocationDef {
        id: LocationId::from("leo"),
        name: "Low Earth Orbit".to_string(),
        parent: None,
        sort_order: 0,
        kind: LocationKind::OrbitNode {
            body: BodyId::from("earth"),
            radius_km: 6771.0,
            angle_deg: 0.0,
        },
    };
    let geo = LocationDef {
        id: LocationId::from("geo"),
        name: "Geostationary Orbit".to_string(),
        parent: None,
        sort_order: 1,
        kind: LocationKind::OrbitNode {
            body: BodyId::from("earth"),
            radius_km: 42_164.0,
            angle_deg: 45.0,
        },
    };
    let earth_surface = LocationDef {
        id: LocationId::from("earth_surface"),
        name: "Earth Surface".to_string(),
        parent: None,
        sort_order: 2,
        kind: LocationKind::SurfaceSite {
            body: BodyId::from("earth"),
            angle_deg: 0.0,
            orbit_node: LocationId::from("leo"),
            landing_dv_m_s: 9500.0,
            landing_tof_s: 1800.0,
        },
    };
    let mars_leo = LocationDef {
        id: LocationId::from("mars_leo"),
        name: "Low Mars Orbit".to_string(),
        parent: None,
        sort_order: 3,
        kind: LocationKind::OrbitNode {
            body: BodyId::from("mars"),
            radius_km: 3889.5,
            angle_deg: 0.0,
        },
    };
    let sun_earth_l1 = LocationDef {
        id: LocationId::from("sun_earth_l1"),
        name: "Sun-Earth L1".to_string(),
        parent: None,
        sort_order: 4,
        kind: LocationKind::LagrangeLine {
            primary: BodyId::from("sun"),
            secondary: BodyId::from("earth"),
            point: LagrangePoint::L1,
            distance_km: 1.5e6,
        },
    };

    CelestialConfig {
        bodies: vec![sun, earth, mars],
        locations: vec![leo, geo, earth_surface, mars_leo, sun_earth_l1],
        transfer_edges: vec![
            TransferEdge {
                from_id: LocationId::from("leo"),
                to_id: LocationId::from("geo"),
                dv_m_s: 3900.0,
                tof_s: 18_000.0,
                edge_type: EdgeType::Orbital,
            },
            TransferEdge {
                from_id: LocationId::from("geo"),
                to_id: LocationId::from("leo"),
                dv_m_s: 1500.0,
                tof_s: 18_000.0,
                edge_type: EdgeType::Orbital,
            },
        ],
        auto_interplanetary_edges: true,
        display_epoch_s: 0.0,
    }
}

#[must_use]
pub fn base_route_matrix(config: &CelestialConfig) -> RouteMatrix {
    let (_, edges) = config.build_graph().expect("fixture config should build");
    RouteMatrix::build(&edges)
}
