//! Universal-variable Kepler propagator (Curtis Algorithm 3.3): given a
//! state vector (r0, v0) and an elapsed time, find the state vector at
//! `t0 + dt` on the same conic, covering ellipse/parabola/hyperbola with
//! one formulation via the Stumpff functions.
//!
//! Used to advance a ship's in-flight position for trajectory display and
//! to sample a leg into a polyline (`sample_trajectory`); the lifecycle
//! itself never needs this (`transfer.rs` is settle-on-access and only
//! cares about the endpoints), but ships in flight still want a position
//! to render.

use crate::vector::Vec3;

const MAX_ITER: usize = 100;
const TOL: f64 = 1e-8;

fn stumpff_c2(psi: f64) -> f64 {
    crate::stumpff::stumpff_c2(psi)
}
fn stumpff_c3(psi: f64) -> f64 {
    crate::stumpff::stumpff_c3(psi)
}

/// Propagate (r0, v0) forward by `dt` seconds under two-body gravity `mu`.
/// Returns the new (position_km, velocity_km_s).
#[must_use]
pub fn propagate(r0: Vec3, v0: Vec3, dt_s: f64, mu: f64) -> (Vec3, Vec3) {
    if dt_s == 0.0 {
        return (r0, v0);
    }
    let r0n = r0.norm();
    let v0n = v0.norm();
    let vr0 = r0.dot(v0) / r0n;
    let alpha = 2.0 / r0n - v0n * v0n / mu;

    // Initial guess per Curtis Algorithm 3.3: scale by sqrt(mu)*alpha*dt
    // for ellipses, a hyperbola-specific log form otherwise, and a plain
    // angular-momentum-scaled fallback near the parabolic boundary.
    let mut chi = if alpha > 1e-8 {
        mu.sqrt() * alpha * dt_s
    } else if alpha.abs() < 1e-8 {
        let h = r0.cross(v0).norm();
        (h * h / mu).sqrt() * dt_s.signum()
    } else {
        let a = 1.0 / alpha;
        dt_s.signum()
            * (-a).sqrt()
            * ((-2.0 * mu * alpha * dt_s)
                / (vr0 * r0n + dt_s.signum() * (-mu * a).sqrt() * (1.0 - r0n * alpha)))
                .ln()
    };
    if !chi.is_finite() {
        chi = mu.sqrt() * dt_s.abs().sqrt();
    }

    let mut psi = chi * chi * alpha;
    for _ in 0..MAX_ITER {
        psi = chi * chi * alpha;
        let c2 = stumpff_c2(psi);
        let c3 = stumpff_c3(psi);
        let t = (chi.powi(3) * c3 + vr0 * r0n / mu.sqrt() * chi * chi * c2
            + r0n * chi * (1.0 - psi * c3))
            / mu.sqrt();
        let err = t - dt_s;
        if err.abs() < TOL * dt_s.abs().max(1.0) {
            break;
        }
        let dt_dchi = chi * chi * c2
            + vr0 * r0n / mu.sqrt() * chi * (1.0 - psi * c3)
            + r0n * (1.0 - psi * c2);
        if dt_dchi.abs() < 1e-300 {
            break;
        }
        chi -= err * mu.sqrt() / dt_dchi;
    }

    let c2 = stumpff_c2(psi);
    let c3 = stumpff_c3(psi);
    let f = 1.0 - (chi * chi / r0n) * c2;
    let g = dt_s - (chi.powi(3) / mu.sqrt()) * c3;
    let r = r0.scale(f) + v0.scale(g);
    let rn = r.norm();
    let f_dot = (mu.sqrt() / (rn * r0n)) * chi * (psi * c3 - 1.0);
    let g_dot = 1.0 - (chi * chi / rn) * c2;
    let v = r0.scale(f_dot) + v0.scale(g_dot);
    (r, v)
}

/// Samples `n_points` states along a Lambert-connected leg for
/// trajectory-line rendering. Endpoints are exact (index 0 and n-1).
#[must_use]
pub fn sample_trajectory(r1: Vec3, v1: Vec3, mu: f64, tof_s: f64, n_points: usize) -> Vec<Vec3> {
    if n_points < 2 {
        return vec![r1];
    }
    (0..n_points)
        .map(|i| {
            let dt = tof_s * (i as f64) / ((n_points - 1) as f64);
            propagate(r1, v1, dt, mu).0
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU_EARTH: f64 = 398_600.0;

    #[test]
    fn circular_orbit_returns_to_start_after_one_period() {
        let r = 7000.0;
        let v = (MU_EARTH / r).sqrt();
        let r0 = Vec3::new(r, 0.0, 0.0);
        let v0 = Vec3::new(0.0, v, 0.0);
        let period = 2.0 * std::f64::consts::PI * (r.powi(3) / MU_EARTH).sqrt();
        let (r1, _) = propagate(r0, v0, period, MU_EARTH);
        assert!((r1 - r0).norm() / r < 1e-3);
    }

    #[test]
    fn quarter_period_rotates_roughly_90_degrees() {
        let r = 7000.0;
        let v = (MU_EARTH / r).sqrt();
        let r0 = Vec3::new(r, 0.0, 0.0);
        let v0 = Vec3::new(0.0, v, 0.0);
        let period = 2.0 * std::f64::consts::PI * (r.powi(3) / MU_EARTH).sqrt();
        let (r1, _) = propagate(r0, v0, period / 4.0, MU_EARTH);
        let angle = (r0.dot(r1) / (r0.norm() * r1.norm())).clamp(-1.0, 1.0).acos();
        assert!((angle.to_degrees() - 90.0).abs() < 2.0);
    }

    #[test]
    fn zero_dt_is_identity() {
        let r0 = Vec3::new(7000.0, 0.0, 0.0);
        let v0 = Vec3::new(0.0, 7.5, 0.0);
        let (r1, v1) = propagate(r0, v0, 0.0, MU_EARTH);
        assert_eq!(r1, r0);
        assert_eq!(v1, v0);
    }

    #[test]
    fn sample_trajectory_endpoints_match_propagation() {
        let r0 = Vec3::new(7000.0, 0.0, 0.0);
        let v0 = Vec3::new(0.0, 7.5, 0.0);
        let tof = 1800.0;
        let points = sample_trajectory(r0, v0, MU_EARTH, tof, 10);
        assert_eq!(points.len(), 10);
        assert_eq!(points[0], r0);
        let (expected_last, _) = propagate(r0, v0, tof, MU_EARTH);
        assert!((points[9] - expected_last).norm() < 1e-6);
    }
}
