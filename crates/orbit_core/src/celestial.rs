//! Celestial topology — parses the declarative Solar-System document and
//! answers two questions: "where is everything at time t" (body state
//! vectors) and "how do leaf locations connect" (the static transfer-edge
//! graph before Dijkstra ever touches it, see [`crate::route_matrix`]).
//!
//! Position-chain references (a moon orbits its planet, a marker sits off
//! a moon) form a DAG terminating at a `Fixed` anchor (the sun). `state()`
//! resolves a body by recursing up that chain and summing position and
//! velocity contributions.

use crate::error::{Result, SimError};
use crate::ids::{BodyId, LocationId};
use crate::vector::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a body's or location's center is positioned relative to its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PositionSpec {
    Fixed {
        x_km: f64,
        y_km: f64,
    },
    PolarFromBody {
        parent: BodyId,
        radius_km: f64,
        angle_deg: f64,
    },
    Keplerian {
        parent: BodyId,
        a_km: f64,
        e: f64,
        i_deg: f64,
        raan_deg: f64,
        argp_deg: f64,
        m0_deg: f64,
        period_s: f64,
        epoch_s: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub mu_km3_s2: f64,
    pub radius_km: f64,
    pub surface_gravity_m_s2: f64,
    pub position: PositionSpec,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum LagrangePoint {
    L1,
    L2,
    L3,
    L4,
    L5,
}

/// Where an orbit-node / Lagrange point / marker / surface site sits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationKind {
    Group,
    OrbitNode {
        body: BodyId,
        radius_km: f64,
        angle_deg: f64,
    },
    LagrangeLine {
        primary: BodyId,
        secondary: BodyId,
        point: LagrangePoint,
        distance_km: f64,
    },
    LagrangeTriangle {
        primary: BodyId,
        secondary: BodyId,
        point: LagrangePoint,
        separation_km: f64,
    },
    Marker {
        body: BodyId,
        offset_x_km: f64,
        offset_y_km: f64,
    },
    SurfaceSite {
        body: BodyId,
        angle_deg: f64,
        orbit_node: LocationId,
        landing_dv_m_s: f64,
        landing_tof_s: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDef {
    pub id: LocationId,
    pub name: String,
    pub parent: Option<LocationId>,
    pub sort_order: i32,
    pub kind: LocationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeType {
    Orbital,
    Surface,
    Interplanetary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferEdge {
    pub from_id: LocationId,
    pub to_id: LocationId,
    pub dv_m_s: f64,
    pub tof_s: f64,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelestialConfig {
    pub bodies: Vec<Body>,
    pub locations: Vec<LocationDef>,
    pub transfer_edges: Vec<TransferEdge>,
    pub auto_interplanetary_edges: bool,
    /// Epoch (game-seconds) used to compute the static display coordinates
    /// of `keplerian` locations — those coordinates are a snapshot, not a
    /// live function of the clock (only `Body::state` is time-varying).
    pub display_epoch_s: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRow {
    pub id: LocationId,
    pub name: String,
    pub parent: Option<LocationId>,
    pub is_group: bool,
    pub sort_order: i32,
    pub x_km: f64,
    pub y_km: f64,
}

fn body_by_id<'a>(bodies: &'a [Body], id: &BodyId) -> Result<&'a Body> {
    bodies
        .iter()
        .find(|b| &b.id == id)
        .ok_or_else(|| SimError::config(format!("bodies/{id}"), "unresolved body reference"))
}

/// Solve Kepler's equation E - e*sin(E) = M for E via Newton's method.
fn solve_eccentric_anomaly(mean_anomaly_rad: f64, e: f64) -> f64 {
    let mut ecc = if e < 0.8 {
        mean_anomaly_rad
    } else {
        std::f64::consts::PI
    };
    for _ in 0..100 {
        let f = ecc - e * ecc.sin() - mean_anomaly_rad;
        let f_prime = 1.0 - e * ecc.cos();
        if f_prime.abs() < 1e-15 {
            break;
        }
        let delta = f / f_prime;
        ecc -= delta;
        if delta.abs() < 1e-12 {
            break;
        }
    }
    ecc
}

/// Rotate a perifocal-frame vector into the parent-centric inertial frame
/// by R_z(raan) * R_x(inc) * R_z(argp).
fn perifocal_to_inertial(v_pf: Vec3, raan: f64, inc: f64, argp: f64) -> Vec3 {
    let (sraan, craan) = raan.sin_cos();
    let (sinc, cinc) = inc.sin_cos();
    let (sargp, cargp) = argp.sin_cos();

    let r11 = craan * cargp - sraan * sargp * cinc;
    let r12 = -craan * sargp - sraan * cargp * cinc;
    let r21 = sraan * cargp + craan * sargp * cinc;
    let r22 = -sraan * sargp + craan * cargp * cinc;
    let r31 = sargp * sinc;
    let r32 = cargp * sinc;

    Vec3::new(
        r11 * v_pf.x + r12 * v_pf.y,
        r21 * v_pf.x + r22 * v_pf.y,
        r31 * v_pf.x + r32 * v_pf.y,
    )
}

fn keplerian_state_in_parent_frame(
    a_km: f64,
    e: f64,
    i_deg: f64,
    raan_deg: f64,
    argp_deg: f64,
    m0_deg: f64,
    period_s: f64,
    epoch_s: f64,
    mu: f64,
    t: f64,
) -> (Vec3, Vec3) {
    let n = if period_s > 0.0 {
        2.0 * std::f64::consts::PI / period_s
    } else {
        0.0
    };
    let m = m0_deg.to_radians() + n * (t - epoch_s);
    let ecc = solve_eccentric_anomaly(m, e);
    let true_anomaly = 2.0
        * ((1.0 + e).sqrt() * (ecc / 2.0).sin())
            .atan2((1.0 - e).sqrt() * (ecc / 2.0).cos());

    let p = a_km * (1.0 - e * e);
    let r = p / (1.0 + e * true_anomaly.cos());
    let r_pf = Vec3::new(r * true_anomaly.cos(), r * true_anomaly.sin(), 0.0);
    let h = (mu * p).sqrt();
    let v_pf = Vec3::new(
        -(mu / h) * true_anomaly.sin(),
        (mu / h) * (e + true_anomaly.cos()),
        0.0,
    );

    let inc = i_deg.to_radians();
    let raan = raan_deg.to_radians();
    let argp = argp_deg.to_radians();
    (
        perifocal_to_inertial(r_pf, raan, inc, argp),
        perifocal_to_inertial(v_pf, raan, inc, argp),
    )
}

impl CelestialConfig {
    /// Body state (position_km, velocity_km_s) at game-time `t`, resolved
    /// by recursing up the position-reference chain to its `Fixed` anchor.
    pub fn body_state(&self, body_id: &BodyId, t: f64) -> Result<(Vec3, Vec3)> {
        self.body_state_inner(body_id, t, 0)
    }

    fn body_state_inner(&self, body_id: &BodyId, t: f64, depth: usize) -> Result<(Vec3, Vec3)> {
        if depth > 32 {
            return Err(SimError::config(
                format!("bodies/{body_id}"),
                "position-reference chain did not resolve (cycle?)",
            ));
        }
        let body = body_by_id(&self.bodies, body_id)?;
        match &body.position {
            PositionSpec::Fixed { x_km, y_km } => {
                Ok((Vec3::new(*x_km, *y_km, 0.0), Vec3::ZERO))
            }
            PositionSpec::PolarFromBody {
                parent,
                radius_km,
                angle_deg,
            } => {
                let (parent_pos, _) = self.body_state_inner(parent, t, depth + 1)?;
                let theta = angle_deg.to_radians();
                let offset = Vec3::new(radius_km * theta.cos(), radius_km * theta.sin(), 0.0);
                Ok((parent_pos + offset, Vec3::ZERO))
            }
            PositionSpec::Keplerian {
                parent,
                a_km,
                e,
                i_deg,
                raan_deg,
                argp_deg,
                m0_deg,
                period_s,
                epoch_s,
            } => {
                let parent_body = body_by_id(&self.bodies, parent)?;
                let (parent_pos, parent_vel) = self.body_state_inner(parent, t, depth + 1)?;
                let (r, v) = keplerian_state_in_parent_frame(
                    *a_km,
                    *e,
                    *i_deg,
                    *raan_deg,
                    *argp_deg,
                    *m0_deg,
                    *period_s,
                    *epoch_s,
                    parent_body.mu_km3_s2,
                    t,
                );
                Ok((parent_pos + r, parent_vel + v))
            }
        }
    }

    /// Walks up from a body to the heliocentric ancestor whose own parent
    /// is the fixed anchor (the sun).
    pub fn heliocentric_parent(&self, body_id: &BodyId) -> Result<BodyId> {
        let mut current = body_by_id(&self.bodies, body_id)?;
        loop {
            match &current.position {
                PositionSpec::Fixed { .. } => return Ok(current.id.clone()),
                PositionSpec::PolarFromBody { parent, .. }
                | PositionSpec::Keplerian { parent, .. } => {
                    let parent_body = body_by_id(&self.bodies, parent)?;
                    if matches!(parent_body.position, PositionSpec::Fixed { .. }) {
                        return Ok(current.id.clone());
                    }
                    current = parent_body;
                }
            }
        }
    }

    /// Location id -> its heliocentric parent body, for every leaf in the graph.
    pub fn location_parent_body_map(&self) -> Result<HashMap<LocationId, BodyId>> {
        let mut map = HashMap::new();
        for loc in &self.locations {
            let body = match &loc.kind {
                LocationKind::Group => continue,
                LocationKind::OrbitNode { body, .. }
                | LocationKind::Marker { body, .. }
                | LocationKind::SurfaceSite { body, .. } => body.clone(),
                LocationKind::LagrangeLine { primary, .. }
                | LocationKind::LagrangeTriangle { primary, .. } => primary.clone(),
            };
            map.insert(loc.id.clone(), self.heliocentric_parent(&body)?);
        }
        Ok(map)
    }

    fn location_center(&self, body_id: &BodyId) -> Result<(f64, f64)> {
        let (pos, _) = self.body_state(body_id, self.display_epoch_s)?;
        Ok((pos.x, pos.y))
    }

    fn location_coords(&self, kind: &LocationKind) -> Result<(f64, f64)> {
        match kind {
            LocationKind::Group => Ok((0.0, 0.0)),
            LocationKind::OrbitNode {
                body,
                radius_km,
                angle_deg,
            } => {
                let (cx, cy) = self.location_center(body)?;
                let theta = angle_deg.to_radians();
                Ok((cx + radius_km * theta.cos(), cy + radius_km * theta.sin()))
            }
            LocationKind::Marker {
                body,
                offset_x_km,
                offset_y_km,
            } => {
                let (cx, cy) = self.location_center(body)?;
                Ok((cx + offset_x_km, cy + offset_y_km))
            }
            LocationKind::SurfaceSite { body, angle_deg, .. } => {
                let b = body_by_id(&self.bodies, body)?;
                let (cx, cy) = self.location_center(body)?;
                let theta = angle_deg.to_radians();
                Ok((
                    cx + b.radius_km * theta.cos(),
                    cy + b.radius_km * theta.sin(),
                ))
            }
            LocationKind::LagrangeLine {
                primary,
                secondary,
                point,
                distance_km,
            } => {
                let (px, py) = self.location_center(primary)?;
                let (sx, sy) = self.location_center(secondary)?;
                let unit = Vec3::new(sx - px, sy - py, 0.0).normalized();
                let sign = match point {
                    LagrangePoint::L1 | LagrangePoint::L3 => -1.0,
                    _ => 1.0,
                };
                // L2 extends beyond the secondary; L1/L3 sit short of or
                // behind the primary — all three are "center + unit*d*sign".
                let d = match point {
                    LagrangePoint::L3 => -*distance_km,
                    _ => *distance_km,
                };
                Ok((px + unit.x * d * -sign, py + unit.y * d * -sign))
            }
            LocationKind::LagrangeTriangle {
                primary,
                secondary,
                point,
                separation_km,
            } => {
                let (px, py) = self.location_center(primary)?;
                let (sx, sy) = self.location_center(secondary)?;
                let unit = Vec3::new(sx - px, sy - py, 0.0).normalized();
                let tangent = Vec3::new(-unit.y, unit.x, 0.0);
                let sign = match point {
                    LagrangePoint::L4 => 1.0,
                    _ => -1.0,
                };
                let base = unit.scale(0.5) + tangent.scale(sign * 3f64.sqrt() / 2.0);
                Ok((
                    px + base.x * separation_km,
                    py + base.y * separation_km,
                ))
            }
        }
    }

    /// Builds the full location-row table and the static transfer-edge set:
    /// authored edges, synthesized surface<->orbit-node hops, and
    /// (optionally) auto-generated interplanetary edges using Hohmann dv.
    pub fn build_graph(&self) -> Result<(Vec<LocationRow>, Vec<TransferEdge>)> {
        let mut rows = Vec::with_capacity(self.locations.len());
        for loc in &self.locations {
            let (x, y) = self.location_coords(&loc.kind)?;
            rows.push(LocationRow {
                id: loc.id.clone(),
                name: loc.name.clone(),
                parent: loc.parent.clone(),
                is_group: matches!(loc.kind, LocationKind::Group),
                sort_order: loc.sort_order,
                x_km: x,
                y_km: y,
            });
        }

        let known_ids: std::collections::HashSet<&LocationId> =
            rows.iter().map(|r| &r.id).collect();
        for loc in &self.locations {
            if let Some(parent) = &loc.parent {
                if !known_ids.contains(parent) {
                    return Err(SimError::config(
                        format!("locations/{}/parent", loc.id),
                        "parent location does not resolve",
                    ));
                }
            }
            if let LocationKind::SurfaceSite { orbit_node, .. } = &loc.kind {
                if !known_ids.contains(orbit_node) {
                    return Err(SimError::config(
                        format!("locations/{}/orbit_node", loc.id),
                        "surface site references unknown orbit node",
                    ));
                }
            }
        }

        let mut edges = self.transfer_edges.clone();

        for loc in &self.locations {
            if let LocationKind::SurfaceSite {
                orbit_node,
                landing_dv_m_s,
                landing_tof_s,
                ..
            } = &loc.kind
            {
                edges.push(TransferEdge {
                    from_id: loc.id.clone(),
                    to_id: orbit_node.clone(),
                    dv_m_s: *landing_dv_m_s,
                    tof_s: *landing_tof_s,
                    edge_type: EdgeType::Surface,
                });
                edges.push(TransferEdge {
                    from_id: orbit_node.clone(),
                    to_id: loc.id.clone(),
                    dv_m_s: *landing_dv_m_s,
                    tof_s: *landing_tof_s,
                    edge_type: EdgeType::Surface,
                });
            }
        }

        if self.auto_interplanetary_edges {
            edges.extend(self.auto_interplanetary_edges_for(&rows)?);
        }

        for edge in &edges {
            if edge.dv_m_s < 0.0 || edge.tof_s < 0.0 {
                return Err(SimError::config(
                    format!("transfer_edges/{}->{}", edge.from_id, edge.to_id),
                    "dv and tof must be non-negative",
                ));
            }
        }

        Ok((rows, edges))
    }

    fn auto_interplanetary_edges_for(&self, rows: &[LocationRow]) -> Result<Vec<TransferEdge>> {
        let parent_map = self.location_parent_body_map()?;
        let mut orbit_nodes_by_body: HashMap<BodyId, Vec<LocationId>> = HashMap::new();
        for loc in &self.locations {
            if let LocationKind::OrbitNode { body, .. } = &loc.kind {
                if let Some(helio) = parent_map.get(&loc.id) {
                    orbit_nodes_by_body
                        .entry(helio.clone())
                        .or_default()
                        .push(loc.id.clone());
                }
                let _ = body;
            }
        }
        let body_ids: Vec<&BodyId> = orbit_nodes_by_body.keys().collect();
        let mut edges = Vec::new();
        for &from_body in &body_ids {
            for &to_body in &body_ids {
                if from_body == to_body {
                    continue;
                }
                let r1 = rows
                    .iter()
                    .find(|r| &r.id == &orbit_nodes_by_body[from_body][0])
                    .map(|r| (r.x_km.powi(2) + r.y_km.powi(2)).sqrt());
                let r2 = rows
                    .iter()
                    .find(|r| &r.id == &orbit_nodes_by_body[to_body][0])
                    .map(|r| (r.x_km.powi(2) + r.y_km.powi(2)).sqrt());
                let (Some(r1), Some(r2)) = (r1, r2) else {
                    continue;
                };
                let sun_mu = self
                    .bodies
                    .iter()
                    .find(|b| matches!(b.position, PositionSpec::Fixed { .. }))
                    .map_or(1.327e11, |b| b.mu_km3_s2);
                let (dv, tof) = crate::lambert::compute_hohmann_dv_tof(sun_mu, r1, r2);
                edges.push(TransferEdge {
                    from_id: orbit_nodes_by_body[from_body][0].clone(),
                    to_id: orbit_nodes_by_body[to_body][0].clone(),
                    dv_m_s: dv,
                    tof_s: tof,
                    edge_type: EdgeType::Interplanetary,
                });
            }
        }
        Ok(edges)
    }
}
