//! Stumpff functions C(ψ), S(ψ) — the power series that let the universal
//! variable formulation cover ellipse, parabola and hyperbola with one set
//! of equations (Curtis §3.4 / §5.3).

/// C(ψ) = c2. Series expansion near ψ = 0 avoids the 0/0 form.
#[must_use]
pub fn stumpff_c2(psi: f64) -> f64 {
    if psi.abs() < 1e-12 {
        return 0.5;
    }
    if psi > 0.0 {
        let sp = psi.sqrt();
        (1.0 - sp.cos()) / psi
    } else {
        let sp = (-psi).sqrt();
        (sp.cosh() - 1.0) / (-psi)
    }
}

/// S(ψ) = c3.
#[must_use]
pub fn stumpff_c3(psi: f64) -> f64 {
    if psi.abs() < 1e-12 {
        return 1.0 / 6.0;
    }
    if psi > 0.0 {
        let sp = psi.sqrt();
        (sp - sp.sin()) / (psi * sp)
    } else {
        let sp = (-psi).sqrt();
        (sp.sinh() - sp) / ((-psi) * sp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_matches_series_limit() {
        assert!((stumpff_c2(0.0) - 0.5).abs() < 1e-12);
        assert!((stumpff_c3(0.0) - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn continuous_across_zero() {
        let eps = 1e-6;
        assert!((stumpff_c2(eps) - stumpff_c2(-eps)).abs() < 1e-5);
        assert!((stumpff_c3(eps) - stumpff_c3(-eps)).abs() < 1e-5);
    }

    #[test]
    fn positive_psi_matches_trig_form() {
        let psi = (std::f64::consts::PI / 2.0).powi(2);
        let expected_c2 = (1.0 - (psi.sqrt()).cos()) / psi;
        assert!((stumpff_c2(psi) - expected_c2).abs() < 1e-12);
    }
}
