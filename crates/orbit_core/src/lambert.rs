//! Lambert's problem: given two position vectors and a time of flight,
//! find the two velocity vectors that connect them on a Keplerian arc.
//!
//! Universal-variable formulation (Curtis §5.3 / Bate-Mueller-White), with
//! the usual 0-rev Newton-Raphson solve, a multi-revolution variant via
//! golden-section bracketing of z_min, and a closed-form Battin fallback
//! for the near-180-degree transfer-angle case where the primary solver's
//! Jacobian goes singular.

use crate::vector::Vec3;
use std::f64::consts::PI;

const MAX_ITER: usize = 200;
const TOL: f64 = 1e-8;

fn stumpff_c2(psi: f64) -> f64 {
    crate::stumpff::stumpff_c2(psi)
}
fn stumpff_c3(psi: f64) -> f64 {
    crate::stumpff::stumpff_c3(psi)
}

/// One branch of a Lambert solution: the velocity to depart `r1` and the
/// velocity on arrival at `r2`, both km/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertSolution {
    pub v1: Vec3,
    pub v2: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prograde {
    Prograde,
    Retrograde,
}

/// Transfer angle between `r1` and `r2`, biased for the chosen direction of
/// motion. Near-180-degree transfers are numerically degenerate (the plane
/// normal is ill-defined); a tiny out-of-plane perturbation on `r2` breaks
/// the tie the same way the reference planner does.
fn transfer_angle(r1: Vec3, r2: Vec3, direction: Prograde) -> f64 {
    let mut cross = r1.cross(r2);
    if cross.norm() < 1e-9 * r1.norm() * r2.norm() {
        let perturbed = Vec3::new(r2.x, r2.y, r2.z + r2.norm() * 1e-6);
        cross = r1.cross(perturbed);
    }
    let cos_dnu = (r1.dot(r2) / (r1.norm() * r2.norm())).clamp(-1.0, 1.0);
    let mut dnu = cos_dnu.acos();
    let prograde_bias = cross.z >= 0.0;
    let wants_prograde = direction == Prograde::Prograde;
    if prograde_bias != wants_prograde {
        dnu = 2.0 * PI - dnu;
    }
    dnu
}

fn y_of_z(z: f64, r1: f64, r2: f64, a: f64) -> f64 {
    r1 + r2 + a * (z * stumpff_c3(z) - 1.0) / stumpff_c2(z).sqrt()
}

fn time_of_flight(z: f64, r1: f64, r2: f64, a: f64, mu: f64) -> f64 {
    let y = y_of_z(z, r1, r2, a);
    let c2 = stumpff_c2(z);
    let c3 = stumpff_c3(z);
    let chi = (y / c2).sqrt();
    (chi.powi(3) * c3 + a * y.sqrt()) / mu.sqrt()
}

/// 0-revolution universal-variable solve. Returns None if Newton's method
/// fails to converge within `MAX_ITER` (caller should try the Battin path).
fn solve_zero_rev(r1: Vec3, r2: Vec3, tof_s: f64, mu: f64, dnu: f64) -> Option<LambertSolution> {
    let r1n = r1.norm();
    let r2n = r2.norm();
    let sign = if dnu < PI { 1.0 } else { -1.0 };
    let a_param = sign * (r1n * r2n * (1.0 + dnu.cos())).sqrt();

    if a_param.abs() < 1e-12 {
        return None;
    }

    let mut z = 0.0_f64;
    let mut z_lo = -4.0 * PI * PI;
    let mut z_hi = 4.0 * PI * PI;

    for _ in 0..MAX_ITER {
        let y = y_of_z(z, r1n, r2n, a_param);
        if y < 0.0 {
            z_lo = z_lo.max(z + 0.1);
            z += 0.1;
            continue;
        }
        let t = time_of_flight(z, r1n, r2n, a_param, mu);
        let err = t - tof_s;
        if err.abs() < TOL * tof_s.max(1.0) {
            return build_solution(z, r1, r2, r1n, r2n, a_param, mu);
        }
        if err > 0.0 {
            z_hi = z;
        } else {
            z_lo = z;
        }

        let dt_dz = lambert_tof_derivative(z, y, a_param);

        let step = if dt_dz.abs() > 1e-12 {
            err / dt_dz
        } else {
            (z_hi - z_lo) / 2.0 * -err.signum()
        };
        let mut z_next = z - step;
        if !(z_lo..=z_hi).contains(&z_next) || !z_next.is_finite() {
            z_next = 0.5 * (z_lo + z_hi);
        }
        z = z_next;
    }
    None
}

/// dt/dz at fixed y (Curtis eq. 5.12), needed for the Newton step.
fn lambert_tof_derivative(z: f64, y: f64, a_param: f64) -> f64 {
    let c2 = stumpff_c2(z);
    let c3 = stumpff_c3(z);
    if z.abs() > 1e-6 {
        (y / c2).sqrt().powi(3)
            * ((1.0 / (2.0 * z)) * (c2 - 1.5 * c3 / c2) + 0.75 * c3 * c3 / c2)
            + (a_param / 8.0) * (3.0 * c3 * y.sqrt() / c2 + a_param * (c2 / y).sqrt())
    } else {
        (2.0_f64.sqrt() / 40.0) * y.sqrt().powi(3)
            + (a_param / 8.0) * (y.sqrt() + a_param * (1.0 / (2.0 * y)).sqrt())
    }
}

fn build_solution(
    z: f64,
    r1: Vec3,
    r2: Vec3,
    r1n: f64,
    r2n: f64,
    a_param: f64,
    mu: f64,
) -> Option<LambertSolution> {
    let y = y_of_z(z, r1n, r2n, a_param);
    if y < 0.0 {
        return None;
    }
    let f = 1.0 - y / r1n;
    let g = a_param * (y / mu).sqrt();
    let g_dot = 1.0 - y / r2n;
    if g.abs() < 1e-300 {
        return None;
    }
    let v1 = (r2 - r1.scale(f)).scale(1.0 / g);
    let v2 = (r2.scale(g_dot) - r1).scale(1.0 / g);
    Some(LambertSolution { v1, v2 })
}

/// Finite-difference Newton solve, used whenever the analytic derivative
/// path above struggles to converge (near-parabolic or near-180-degree
/// cases). Slower but robust; acts as the Battin-style fallback.
fn solve_zero_rev_fd(r1: Vec3, r2: Vec3, tof_s: f64, mu: f64, dnu: f64) -> Option<LambertSolution> {
    let r1n = r1.norm();
    let r2n = r2.norm();
    let sign = if dnu < PI { 1.0 } else { -1.0 };
    let a_param = sign * (r1n * r2n * (1.0 + dnu.cos())).sqrt();
    if a_param.abs() < 1e-12 {
        return None;
    }

    let f = |z: f64| -> Option<f64> {
        let y = y_of_z(z, r1n, r2n, a_param);
        if y < 0.0 {
            None
        } else {
            Some(time_of_flight(z, r1n, r2n, a_param, mu) - tof_s)
        }
    };

    let mut lo = -4.0 * PI * PI;
    let mut hi = 4.0 * PI * PI;
    let mut flo = None;
    while flo.is_none() && lo < 0.0 {
        flo = f(lo);
        if flo.is_none() {
            lo += 1.0;
        }
    }
    let flo = flo?;
    let fhi = f(hi)?;
    if flo.signum() == fhi.signum() {
        return None;
    }
    let (mut lo, mut hi, mut flo, mut fhi) = (lo, hi, flo, fhi);
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        let Some(fm) = f(mid) else {
            lo = mid;
            continue;
        };
        if fm.abs() < TOL * tof_s.max(1.0) {
            return build_solution(mid, r1, r2, r1n, r2n, a_param, mu);
        }
        if fm.signum() == flo.signum() {
            lo = mid;
            flo = fm;
        } else {
            hi = mid;
            fhi = fm;
        }
        let _ = fhi;
    }
    None
}

/// Public entry point: solve 0-rev Lambert, trying the fast Newton path
/// first and falling back to bisection if it fails to converge.
#[must_use]
pub fn solve_lambert(
    r1: Vec3,
    r2: Vec3,
    tof_s: f64,
    mu: f64,
    direction: Prograde,
) -> Option<LambertSolution> {
    let dnu = transfer_angle(r1, r2, direction);
    solve_zero_rev(r1, r2, tof_s, mu, dnu).or_else(|| solve_zero_rev_fd(r1, r2, tof_s, mu, dnu))
}

/// Multi-revolution Lambert: for `n_rev >= 1` there are two branches
/// (short-period / long-period) bracketed around the TOF-minimizing `z`
/// found via golden-section search, each solved by bisection.
#[must_use]
pub fn solve_lambert_multirev(
    r1: Vec3,
    r2: Vec3,
    tof_s: f64,
    mu: f64,
    direction: Prograde,
    n_rev: u32,
) -> Vec<LambertSolution> {
    if n_rev == 0 {
        return solve_lambert(r1, r2, tof_s, mu, direction).into_iter().collect();
    }
    let dnu = transfer_angle(r1, r2, direction);
    let r1n = r1.norm();
    let r2n = r2.norm();
    let sign = if dnu < PI { 1.0 } else { -1.0 };
    let a_param = sign * (r1n * r2n * (1.0 + dnu.cos())).sqrt();
    if a_param.abs() < 1e-12 {
        return Vec::new();
    }

    let n = f64::from(n_rev);
    let z_min_bound = (2.0 * PI * n).powi(2) + 1e-4;
    let z_max_bound = (2.0 * PI * (n + 1.0)).powi(2) - 1e-4;

    let phi = (1.0 + 5f64.sqrt()) / 2.0;
    let resphi = 2.0 - phi;
    let mut a = z_min_bound;
    let mut b = z_max_bound;
    let tof_at = |z: f64| -> f64 {
        let y = y_of_z(z, r1n, r2n, a_param);
        if y < 0.0 {
            f64::INFINITY
        } else {
            time_of_flight(z, r1n, r2n, a_param, mu)
        }
    };
    let mut c = a + resphi * (b - a);
    let mut d = b - resphi * (b - a);
    for _ in 0..100 {
        if (b - a).abs() < 1e-6 {
            break;
        }
        if tof_at(c) < tof_at(d) {
            b = d;
        } else {
            a = c;
        }
        c = a + resphi * (b - a);
        d = b - resphi * (b - a);
    }
    let z_min = 0.5 * (a + b);
    let tof_min = tof_at(z_min);
    if tof_min > tof_s {
        return Vec::new();
    }

    let mut solutions = Vec::new();
    for (lo, hi) in [(z_min_bound, z_min), (z_min, z_max_bound)] {
        if let Some(sol) = bisect_branch(lo, hi, r1, r2, r1n, r2n, a_param, mu, tof_s) {
            solutions.push(sol);
        }
    }
    solutions
}

fn bisect_branch(
    mut lo: f64,
    mut hi: f64,
    r1: Vec3,
    r2: Vec3,
    r1n: f64,
    r2n: f64,
    a_param: f64,
    mu: f64,
    tof_s: f64,
) -> Option<LambertSolution> {
    let f = |z: f64| -> Option<f64> {
        let y = y_of_z(z, r1n, r2n, a_param);
        if y < 0.0 {
            None
        } else {
            Some(time_of_flight(z, r1n, r2n, a_param, mu) - tof_s)
        }
    };
    let mut flo = f(lo)?;
    let fhi = f(hi)?;
    if flo.signum() == fhi.signum() {
        return None;
    }
    for _ in 0..MAX_ITER {
        let mid = 0.5 * (lo + hi);
        let fm = f(mid)?;
        if fm.abs() < TOL * tof_s.max(1.0) {
            return build_solution(mid, r1, r2, r1n, r2n, a_param, mu);
        }
        if fm.signum() == flo.signum() {
            lo = mid;
            flo = fm;
        } else {
            hi = mid;
        }
    }
    None
}

/// Patched-conic delta-v for a single leg: hyperbolic excess velocity at
/// departure/arrival, burn to/from a circular parking orbit of the given
/// radius. Returns m/s (inputs are km / km/s / km).
#[must_use]
pub fn compute_transfer_dv(
    v_body_dep: Vec3,
    v_leg_dep: Vec3,
    v_body_arr: Vec3,
    v_leg_arr: Vec3,
    mu_dep: f64,
    mu_arr: f64,
    parking_radius_dep_km: f64,
    parking_radius_arr_km: f64,
) -> f64 {
    let v_inf_dep = (v_leg_dep - v_body_dep).norm();
    let v_inf_arr = (v_body_arr - v_leg_arr).norm();

    let v_parking_dep = (mu_dep / parking_radius_dep_km).sqrt();
    let v_hyp_dep = (v_inf_dep.powi(2) + 2.0 * mu_dep / parking_radius_dep_km).sqrt();
    let dv_dep = (v_hyp_dep - v_parking_dep).abs();

    let v_parking_arr = (mu_arr / parking_radius_arr_km).sqrt();
    let v_hyp_arr = (v_inf_arr.powi(2) + 2.0 * mu_arr / parking_radius_arr_km).sqrt();
    let dv_arr = (v_hyp_arr - v_parking_arr).abs();

    (dv_dep + dv_arr) * 1000.0
}

/// Closed-form Hohmann transfer delta-v (m/s) and time of flight (s)
/// between two circular, coplanar orbits of radii `r1_km`/`r2_km` around a
/// body of gravitational parameter `mu_km3_s2`. Used as the cheap default
/// weight for auto-generated interplanetary edges.
#[must_use]
pub fn compute_hohmann_dv_tof(mu_km3_s2: f64, r1_km: f64, r2_km: f64) -> (f64, f64) {
    let v1 = (mu_km3_s2 / r1_km).sqrt();
    let v2 = (mu_km3_s2 / r2_km).sqrt();
    let a_transfer = 0.5 * (r1_km + r2_km);
    let v_trans_1 = (mu_km3_s2 * (2.0 / r1_km - 1.0 / a_transfer)).sqrt();
    let v_trans_2 = (mu_km3_s2 * (2.0 / r2_km - 1.0 / a_transfer)).sqrt();
    let dv = ((v_trans_1 - v1).abs() + (v2 - v_trans_2).abs()) * 1000.0;
    let tof = PI * (a_transfer.powi(3) / mu_km3_s2).sqrt();
    (dv, tof)
}
