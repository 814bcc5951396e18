//! Interplanetary transfer planner: wraps the Lambert solver with the
//! patched-conic Δv model, a departure/TOF sweep around the Hohmann
//! estimate, departure-window scanning, and a bounded LRU result cache.
//!
//! Bucketed by (from, to, departure-hour, extra-dv-0.0001-fraction) — a
//! caller re-querying the same leg within the same departure hour and the
//! same extra-fuel budget gets the cached result instead of re-running the
//! sweep. Invalidated wholesale on celestial-config reload.

use crate::celestial::CelestialConfig;
use crate::ids::{BodyId, LocationId};
use crate::lambert::{self, Prograde};
use crate::vector::Vec3;
use std::collections::{HashMap, VecDeque};

const LAMBERT_CACHE_BUCKET_S: f64 = 3600.0;
const LAMBERT_CACHE_MAX: usize = 1024;
const TOF_PENALTY_M_S_PER_DAY: f64 = 1.0;
const REV_PENALTY_M_S: f64 = 50.0;

const TOF_SWEEP_FACTORS: &[f64] = &[
    1.0, 0.9, 1.1, 0.8, 1.2, 0.7, 1.3, 0.5, 1.5, 0.4, 1.8, 2.0, 2.5, 0.3,
];

#[derive(Debug, Clone, PartialEq)]
pub struct InterplanetaryLeg {
    pub base_dv_m_s: f64,
    pub base_tof_s: f64,
    pub dv_m_s: f64,
    pub tof_s: f64,
    pub phase_angle_deg: f64,
    pub optimal_phase_deg: f64,
    pub alignment_pct: f64,
    pub v_inf_depart_km_s: f64,
    pub v_inf_arrive_km_s: f64,
    pub arrival_time_s: f64,
    pub helio_r1: Vec3,
    pub helio_v1: Vec3,
    pub helio_mu: f64,
}

fn parking_orbit_radius_km(config: &CelestialConfig, body_id: &BodyId) -> f64 {
    let body = config.bodies.iter().find(|b| &b.id == body_id);
    let Some(body) = body else {
        return 6578.0;
    };
    let default_alt = if body.radius_km > 10_000.0 {
        1000.0
    } else if body.radius_km > 1000.0 {
        250.0
    } else {
        80.0
    };
    body.radius_km + default_alt
}

fn angle_between_2d(a: Vec3, b: Vec3) -> f64 {
    let theta_a = a.y.atan2(a.x);
    let theta_b = b.y.atan2(b.x);
    (theta_b - theta_a).rem_euclid(2.0 * std::f64::consts::PI)
}

/// Extra-dv trades excess fuel for a shorter time of flight; same formula
/// the upstream fleet router uses so quoted TOFs stay cross-consistent.
fn excess_dv_time_reduction(base_tof_s: f64, extra_dv_fraction: f64) -> f64 {
    if base_tof_s <= 0.0 || extra_dv_fraction <= 0.0 {
        return base_tof_s;
    }
    let reduction = 1.0 / (1.0 + extra_dv_fraction).powf(0.6);
    (base_tof_s * reduction).max(3600.0)
}

/// Score used to rank competing Lambert branches (lower is better):
/// raw Δv plus a time-of-flight penalty plus a per-revolution penalty, so
/// a fuel-cheap multi-rev solution that takes an order of magnitude longer
/// doesn't win purely on Δv.
#[must_use]
pub fn transfer_quality_score(dv_m_s: f64, tof_s: f64, revolutions: u32) -> f64 {
    let tof_days = tof_s.max(0.0) / 86400.0;
    dv_m_s + TOF_PENALTY_M_S_PER_DAY * tof_days + f64::from(revolutions) * REV_PENALTY_M_S
}

/// Computes a single interplanetary leg: sweeps TOF factors around the
/// Hohmann estimate, keeps the lowest total patched-conic Δv, then applies
/// the caller's extra-dv fraction to trade fuel for time.
#[must_use]
pub fn compute_interplanetary_leg(
    config: &CelestialConfig,
    from_body: &BodyId,
    to_body: &BodyId,
    departure_time_s: f64,
    extra_dv_fraction: f64,
) -> Option<InterplanetaryLeg> {
    if from_body == to_body {
        return None;
    }
    let sun = config
        .bodies
        .iter()
        .find(|b| matches!(b.position, crate::celestial::PositionSpec::Fixed { .. }))?;
    let mu_sun = sun.mu_km3_s2;

    let (r1_vec, v1_body) = config.body_state(from_body, departure_time_s).ok()?;
    let r1_km = r1_vec.norm();
    let r2_km_estimate = config.body_state(to_body, departure_time_s).ok()?.0.norm();
    if r1_km < 1e-6 || r2_km_estimate < 1e-6 {
        return None;
    }

    let mu_from = config.bodies.iter().find(|b| &b.id == from_body)?.mu_km3_s2;
    let mu_to = config.bodies.iter().find(|b| &b.id == to_body)?.mu_km3_s2;
    let r_park_from = parking_orbit_radius_km(config, from_body);
    let r_park_to = parking_orbit_radius_km(config, to_body);

    let hohmann_tof_s =
        std::f64::consts::PI * (((r1_km + r2_km_estimate) / 2.0).powi(3) / mu_sun).sqrt();

    let mut best_dv_total = f64::INFINITY;
    let mut best_v1 = None;
    let mut best_v2 = None;
    let mut best_tof_s = hohmann_tof_s;
    let mut best_v2_body_arr = None;
    let mut best_r2_vec = r1_vec;

    for &factor in TOF_SWEEP_FACTORS {
        let tof_try = hohmann_tof_s * factor;
        if tof_try < 86_400.0 {
            continue;
        }
        let arr_time = departure_time_s + tof_try;
        let Ok((r2_arr, v2_arr)) = config.body_state(to_body, arr_time) else {
            continue;
        };

        let Some(sol) = lambert::solve_lambert(r1_vec, r2_arr, tof_try, mu_sun, Prograde::Prograde)
        else {
            continue;
        };

        let dv_total = lambert::compute_transfer_dv(
            v1_body, sol.v1, v2_arr, sol.v2, mu_from, mu_to, r_park_from, r_park_to,
        );
        if dv_total < best_dv_total {
            best_dv_total = dv_total;
            best_v1 = Some(sol.v1);
            best_v2 = Some(sol.v2);
            best_tof_s = tof_try;
            best_v2_body_arr = Some(v2_arr);
            best_r2_vec = r2_arr;
        }
    }

    let (best_v1, best_v2, best_v2_body_arr) = (best_v1?, best_v2?, best_v2_body_arr?);

    let v_inf_depart = (best_v1 - v1_body).norm();
    let v_inf_arrive = (best_v2_body_arr - best_v2).norm();

    let phase_rad = angle_between_2d(r1_vec, best_r2_vec);
    let mut optimal_phase = std::f64::consts::PI
        * (1.0 - (1.0 / 2f64.powf(2.0 / 3.0)) * ((r1_km + r2_km_estimate) / r2_km_estimate).powf(2.0 / 3.0));
    if r2_km_estimate < r1_km {
        optimal_phase = 2.0 * std::f64::consts::PI - optimal_phase.abs();
    }
    optimal_phase = optimal_phase.rem_euclid(2.0 * std::f64::consts::PI);

    let delta = phase_rad - optimal_phase;
    let alignment_pct = (1.0 - delta.cos()) / 2.0 * 100.0;

    let extra = extra_dv_fraction.max(0.0);
    let final_dv = best_dv_total * (1.0 + extra);
    let final_tof = excess_dv_time_reduction(best_tof_s, extra);

    Some(InterplanetaryLeg {
        base_dv_m_s: best_dv_total,
        base_tof_s: best_tof_s,
        dv_m_s: final_dv,
        tof_s: final_tof,
        phase_angle_deg: phase_rad.to_degrees(),
        optimal_phase_deg: optimal_phase.to_degrees(),
        alignment_pct,
        v_inf_depart_km_s: v_inf_depart,
        v_inf_arrive_km_s: v_inf_arrive,
        arrival_time_s: departure_time_s + best_tof_s,
        helio_r1: r1_vec,
        helio_v1: best_v1,
        helio_mu: mu_sun,
    })
}

/// Synodic period between two heliocentric bodies, or `None` if either
/// orbit is non-periodic (a fixed anchor) or the periods coincide.
#[must_use]
pub fn synodic_period_s(config: &CelestialConfig, body_a: &BodyId, body_b: &BodyId) -> Option<f64> {
    let period = |id: &BodyId| -> Option<f64> {
        match &config.bodies.iter().find(|b| &b.id == id)?.position {
            crate::celestial::PositionSpec::Keplerian { period_s, .. } if *period_s > 0.0 => {
                Some(*period_s)
            }
            _ => None,
        }
    };
    let p1 = period(body_a)?;
    let p2 = period(body_b)?;
    let denom = (1.0 / p1 - 1.0 / p2).abs();
    if denom < 1e-12 {
        None
    } else {
        Some((1.0 / denom).abs())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepartureWindow {
    pub departure_time_s: f64,
    pub wait_s: f64,
    pub dv_m_s: f64,
    pub alignment_pct: f64,
}

/// Scans up to `min(synodic_period, 240 days)` ahead in 1-day steps for
/// better departure windows, ranked by (dv, wait) and truncated to the
/// `max_candidates` best.
#[must_use]
pub fn scan_departure_windows(
    config: &CelestialConfig,
    from_body: &BodyId,
    to_body: &BodyId,
    departure_time_s: f64,
    synodic_period_s: f64,
    max_candidates: usize,
) -> Vec<DepartureWindow> {
    if synodic_period_s <= 0.0 {
        return Vec::new();
    }
    let horizon_s = synodic_period_s.min(240.0 * 86_400.0).max(86_400.0);
    let step_s = 86_400.0;
    let samples = (horizon_s / step_s) as u64;

    let mut candidates: Vec<DepartureWindow> = (1..=samples)
        .filter_map(|idx| {
            let t = departure_time_s + (idx as f64) * step_s;
            let leg = compute_interplanetary_leg(config, from_body, to_body, t, 0.0)?;
            Some(DepartureWindow {
                departure_time_s: t,
                wait_s: t - departure_time_s,
                dv_m_s: leg.base_dv_m_s,
                alignment_pct: leg.alignment_pct,
            })
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.dv_m_s
            .partial_cmp(&b.dv_m_s)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.wait_s.partial_cmp(&b.wait_s).unwrap_or(std::cmp::Ordering::Equal))
    });
    candidates.truncate(max_candidates);
    candidates
}

const PORKCHOP_MAX_SOLUTIONS: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct PorkchopSolution {
    pub departure_time_s: f64,
    pub tof_s: f64,
    pub dv_m_s: f64,
    pub quality_score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PorkchopGrid {
    pub departure_times_s: Vec<f64>,
    pub tof_samples_s: Vec<f64>,
    /// `dv_grid[i][j]` is the Δv for departing at `departure_times_s[i]`
    /// with time of flight `tof_samples_s[j]`, or `f64::INFINITY` where no
    /// Lambert branch converges for that cell.
    pub dv_grid: Vec<Vec<f64>>,
    /// Up to [`PORKCHOP_MAX_SOLUTIONS`] local-minimum cells, sorted by
    /// `quality_score` ascending and spread out across the grid rather
    /// than clustered around the single global optimum.
    pub best_solutions: Vec<PorkchopSolution>,
}

/// One porkchop cell's Δv: a direct Lambert solve at the exact (departure,
/// TOF) pair, unlike [`compute_interplanetary_leg`]'s Hohmann-anchored TOF
/// sweep — the grid needs every cell to reflect its own coordinates.
fn porkchop_cell_dv(
    config: &CelestialConfig,
    from_body: &BodyId,
    to_body: &BodyId,
    departure_time_s: f64,
    tof_s: f64,
) -> Option<f64> {
    if tof_s <= 0.0 {
        return None;
    }
    let sun = config
        .bodies
        .iter()
        .find(|b| matches!(b.position, crate::celestial::PositionSpec::Fixed { .. }))?;
    let mu_sun = sun.mu_km3_s2;
    let mu_from = config.bodies.iter().find(|b| &b.id == from_body)?.mu_km3_s2;
    let mu_to = config.bodies.iter().find(|b| &b.id == to_body)?.mu_km3_s2;
    let r_park_from = parking_orbit_radius_km(config, from_body);
    let r_park_to = parking_orbit_radius_km(config, to_body);

    let (r1, v1_body) = config.body_state(from_body, departure_time_s).ok()?;
    let (r2, v2_body) = config.body_state(to_body, departure_time_s + tof_s).ok()?;
    if r1.norm() < 1e-6 || r2.norm() < 1e-6 {
        return None;
    }
    let sol = lambert::solve_lambert(r1, r2, tof_s, mu_sun, Prograde::Prograde)?;
    Some(lambert::compute_transfer_dv(
        v1_body, sol.v1, v2_body, sol.v2, mu_from, mu_to, r_park_from, r_park_to,
    ))
}

/// Builds a `grid_size × grid_size` porkchop plot over
/// `[departure_start_s, departure_start_s + departure_span_s] ×
/// [tof_min_s, tof_max_s]`, then extracts up to 5 locally-minimal,
/// spatially-dispersed departure/TOF pairs ranked by
/// [`transfer_quality_score`] ascending.
#[must_use]
pub fn compute_porkchop(
    config: &CelestialConfig,
    from_body: &BodyId,
    to_body: &BodyId,
    departure_start_s: f64,
    departure_span_s: f64,
    tof_min_s: f64,
    tof_max_s: f64,
    grid_size: usize,
) -> PorkchopGrid {
    let grid_size = grid_size.max(2);
    let last = (grid_size - 1) as f64;
    let departure_times_s: Vec<f64> = (0..grid_size)
        .map(|i| departure_start_s + departure_span_s * (i as f64) / last)
        .collect();
    let tof_samples_s: Vec<f64> = (0..grid_size)
        .map(|j| tof_min_s + (tof_max_s - tof_min_s) * (j as f64) / last)
        .collect();

    let dv_grid: Vec<Vec<f64>> = departure_times_s
        .iter()
        .map(|&dep_t| {
            tof_samples_s
                .iter()
                .map(|&tof| porkchop_cell_dv(config, from_body, to_body, dep_t, tof).unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect();

    let mut candidates: Vec<(usize, usize, PorkchopSolution)> = Vec::new();
    for i in 0..grid_size {
        for j in 0..grid_size {
            let dv = dv_grid[i][j];
            if !dv.is_finite() {
                continue;
            }
            let is_local_min = [
                (i.wrapping_sub(1), j),
                (i + 1, j),
                (i, j.wrapping_sub(1)),
                (i, j + 1),
            ]
            .iter()
            .all(|&(ni, nj)| ni >= grid_size || nj >= grid_size || dv_grid[ni][nj] >= dv);
            if !is_local_min {
                continue;
            }
            let quality_score = transfer_quality_score(dv, tof_samples_s[j], 0);
            candidates.push((
                i,
                j,
                PorkchopSolution {
                    departure_time_s: departure_times_s[i],
                    tof_s: tof_samples_s[j],
                    dv_m_s: dv,
                    quality_score,
                },
            ));
        }
    }
    candidates.sort_by(|a, b| {
        a.2.quality_score
            .partial_cmp(&b.2.quality_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // Greedily keep the best-ranked minima, skipping any candidate too close
    // (in grid-index space) to one already kept, so the result spreads
    // across distinct porkchop "islands" instead of clustering around the
    // single global optimum.
    let min_separation = (grid_size / 8).max(1);
    let mut chosen_cells: Vec<(usize, usize)> = Vec::new();
    let mut best_solutions: Vec<PorkchopSolution> = Vec::new();
    for (i, j, solution) in candidates {
        if chosen_cells
            .iter()
            .any(|&(ci, cj)| i.abs_diff(ci) < min_separation && j.abs_diff(cj) < min_separation)
        {
            continue;
        }
        chosen_cells.push((i, j));
        best_solutions.push(solution);
        if best_solutions.len() == PORKCHOP_MAX_SOLUTIONS {
            break;
        }
    }

    PorkchopGrid {
        departure_times_s,
        tof_samples_s,
        dv_grid,
        best_solutions,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    from: u64,
    to: u64,
    dep_bucket: i64,
    extra_bucket: i64,
}

fn hash_location(id: &LocationId) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    id.hash(&mut hasher);
    hasher.finish()
}

fn cache_key(from: &LocationId, to: &LocationId, departure_time_s: f64, extra_dv_fraction: f64) -> CacheKey {
    CacheKey {
        from: hash_location(from),
        to: hash_location(to),
        dep_bucket: (departure_time_s / LAMBERT_CACHE_BUCKET_S).floor() as i64,
        extra_bucket: (extra_dv_fraction * 10_000.0).round() as i64,
    }
}

/// Bounded LRU cache over [`compute_interplanetary_leg`] results, keyed by
/// location pair + departure-hour bucket + extra-dv bucket. Holding
/// `LocationId`s rather than `BodyId`s in the key lets callers at the
/// routing layer cache per-site even though the Lambert solve itself only
/// depends on the resolved heliocentric bodies.
///
/// Tracks hit/miss counters so `hits + misses` always equals the number of
/// `get` calls made (one per `compute_leg` request) — `clear` zeroes both
/// alongside the entries.
#[derive(Debug, Default)]
pub struct LambertCache {
    order: VecDeque<CacheKey>,
    entries: HashMap<CacheKey, InterplanetaryLeg>,
    hits: u64,
    misses: u64,
}

impl LambertCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(
        &mut self,
        from: &LocationId,
        to: &LocationId,
        departure_time_s: f64,
        extra_dv_fraction: f64,
    ) -> Option<&InterplanetaryLeg> {
        let hit = self
            .entries
            .contains_key(&cache_key(from, to, departure_time_s, extra_dv_fraction));
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.entries
            .get(&cache_key(from, to, departure_time_s, extra_dv_fraction))
    }

    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn put(
        &mut self,
        from: &LocationId,
        to: &LocationId,
        departure_time_s: f64,
        extra_dv_fraction: f64,
        leg: InterplanetaryLeg,
    ) {
        let key = cache_key(from, to, departure_time_s, extra_dv_fraction);
        if !self.entries.contains_key(&key) {
            self.order.push_back(key);
        }
        self.entries.insert(key, leg);
        while self.entries.len() > LAMBERT_CACHE_MAX {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::base_celestial_config;

    #[test]
    fn leg_between_earth_and_mars_is_physical() {
        let config = base_celestial_config();
        let leg = compute_interplanetary_leg(
            &config,
            &BodyId::from("earth"),
            &BodyId::from("mars"),
            0.0,
            0.0,
        );
        let leg = leg.expect("earth-mars leg should solve");
        assert!(leg.dv_m_s > 0.0);
        assert!(leg.tof_s > 0.0);
    }

    #[test]
    fn extra_dv_fraction_shortens_tof() {
        let config = base_celestial_config();
        let plain = compute_interplanetary_leg(
            &config,
            &BodyId::from("earth"),
            &BodyId::from("mars"),
            0.0,
            0.0,
        )
        .unwrap();
        let boosted = compute_interplanetary_leg(
            &config,
            &BodyId::from("earth"),
            &BodyId::from("mars"),
            0.0,
            0.2,
        )
        .unwrap();
        assert!(boosted.tof_s <= plain.base_tof_s);
        assert!(boosted.dv_m_s >= plain.base_dv_m_s);
    }

    #[test]
    fn same_body_leg_returns_none() {
        let config = base_celestial_config();
        let leg = compute_interplanetary_leg(
            &config,
            &BodyId::from("earth"),
            &BodyId::from("earth"),
            0.0,
            0.0,
        );
        assert!(leg.is_none());
    }

    #[test]
    fn quality_score_penalizes_long_tof_and_revs() {
        let cheap_slow = transfer_quality_score(1000.0, 400.0 * 86_400.0, 1);
        let fast_direct = transfer_quality_score(1200.0, 150.0 * 86_400.0, 0);
        assert!(fast_direct < cheap_slow);
    }

    #[test]
    fn cache_evicts_oldest_entry_past_capacity() {
        let mut cache = LambertCache::new();
        let leg = InterplanetaryLeg {
            base_dv_m_s: 1.0,
            base_tof_s: 1.0,
            dv_m_s: 1.0,
            tof_s: 1.0,
            phase_angle_deg: 0.0,
            optimal_phase_deg: 0.0,
            alignment_pct: 0.0,
            v_inf_depart_km_s: 0.0,
            v_inf_arrive_km_s: 0.0,
            arrival_time_s: 0.0,
            helio_r1: Vec3::ZERO,
            helio_v1: Vec3::ZERO,
            helio_mu: 1.0,
        };
        for i in 0..(LAMBERT_CACHE_MAX + 10) {
            cache.put(
                &LocationId::from("a"),
                &LocationId::from("b"),
                i as f64 * LAMBERT_CACHE_BUCKET_S,
                0.0,
                leg.clone(),
            );
        }
        assert_eq!(cache.len(), LAMBERT_CACHE_MAX);
    }

    #[test]
    fn cache_hits_within_same_departure_bucket() {
        let mut cache = LambertCache::new();
        let leg = InterplanetaryLeg {
            base_dv_m_s: 42.0,
            base_tof_s: 1.0,
            dv_m_s: 42.0,
            tof_s: 1.0,
            phase_angle_deg: 0.0,
            optimal_phase_deg: 0.0,
            alignment_pct: 0.0,
            v_inf_depart_km_s: 0.0,
            v_inf_arrive_km_s: 0.0,
            arrival_time_s: 0.0,
            helio_r1: Vec3::ZERO,
            helio_v1: Vec3::ZERO,
            helio_mu: 1.0,
        };
        let from = LocationId::from("a");
        let to = LocationId::from("b");
        cache.put(&from, &to, 100.0, 0.0, leg);
        assert!(cache.get(&from, &to, 200.0, 0.0).is_some());
        assert!(cache.get(&from, &to, LAMBERT_CACHE_BUCKET_S + 200.0, 0.0).is_none());
    }

    #[test]
    fn porkchop_grid_has_expected_shape_and_bounded_best_solutions() {
        let config = base_celestial_config();
        let grid = compute_porkchop(
            &config,
            &BodyId::from("earth"),
            &BodyId::from("mars"),
            0.0,
            2.0 * 365.0 * 86_400.0,
            100.0 * 86_400.0,
            400.0 * 86_400.0,
            40,
        );
        assert_eq!(grid.dv_grid.len(), 40);
        assert!(grid.dv_grid.iter().all(|row| row.len() == 40));
        assert!(grid.dv_grid.iter().flatten().any(|dv| dv.is_finite()));
        assert!(grid.best_solutions.len() <= 5);
        assert!(!grid.best_solutions.is_empty());
        for pair in grid.best_solutions.windows(2) {
            assert!(pair[0].quality_score <= pair[1].quality_score);
        }
    }

    #[test]
    fn hits_plus_misses_equals_get_calls_and_clear_zeroes_both() {
        let mut cache = LambertCache::new();
        let from = LocationId::from("a");
        let to = LocationId::from("b");
        let leg = InterplanetaryLeg {
            base_dv_m_s: 1.0,
            base_tof_s: 1.0,
            dv_m_s: 1.0,
            tof_s: 1.0,
            phase_angle_deg: 0.0,
            optimal_phase_deg: 0.0,
            alignment_pct: 0.0,
            v_inf_depart_km_s: 0.0,
            v_inf_arrive_km_s: 0.0,
            arrival_time_s: 0.0,
            helio_r1: Vec3::ZERO,
            helio_v1: Vec3::ZERO,
            helio_mu: 1.0,
        };
        assert!(cache.get(&from, &to, 0.0, 0.0).is_none());
        cache.put(&from, &to, 0.0, 0.0, leg);
        assert!(cache.get(&from, &to, 0.0, 0.0).is_some());
        assert!(cache.get(&from, &to, 0.0, 0.0).is_some());
        assert_eq!(cache.hits() + cache.misses(), 3);
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 2);

        cache.clear();
        assert_eq!(cache.hits(), 0);
        assert_eq!(cache.misses(), 0);
        assert_eq!(cache.len(), 0);
    }
}
