//! Simulation clock — maps real wall-clock seconds to game-time seconds.
//!
//! The clock itself never touches `SystemTime`; callers pass in
//! `real_now_s` so the type stays pure and the behaviour stays testable
//! without faking the system clock.

use serde::{Deserialize, Serialize};

/// Game epoch: 2000-01-01T00:00:00Z, expressed as game-seconds-since-epoch.
/// Used only by [`Clock::reset`] to anchor a fresh clock at time zero.
pub const EPOCH_GAME_S: f64 = 0.0;

/// Default scale: one real hour advances roughly one game-week.
pub const DEFAULT_SCALE: f64 = (7.0 * 86400.0) / 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockAnchor {
    pub real_anchor_s: f64,
    pub game_anchor_s: f64,
    pub paused: bool,
    pub scale: f64,
}

impl Default for ClockAnchor {
    fn default() -> Self {
        Self {
            real_anchor_s: 0.0,
            game_anchor_s: EPOCH_GAME_S,
            paused: false,
            scale: DEFAULT_SCALE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    anchor: ClockAnchor,
}

impl Clock {
    #[must_use]
    pub fn new(anchor: ClockAnchor) -> Self {
        Self { anchor }
    }

    #[must_use]
    pub fn export(&self) -> ClockAnchor {
        self.anchor
    }

    /// `now()` — game-seconds at `real_now_s`.
    #[must_use]
    pub fn now(&self, real_now_s: f64) -> f64 {
        if self.anchor.paused {
            self.anchor.game_anchor_s
        } else {
            self.anchor.game_anchor_s + (real_now_s - self.anchor.real_anchor_s) * self.anchor.scale
        }
    }

    pub fn set_paused(&mut self, real_now_s: f64, paused: bool) {
        let game_now = self.now(real_now_s);
        self.anchor.game_anchor_s = game_now;
        self.anchor.real_anchor_s = real_now_s;
        self.anchor.paused = paused;
    }

    /// `set_scale` — rejects non-positive scales as a validation error at
    /// the caller; the clock itself just asserts the invariant.
    pub fn set_scale(&mut self, real_now_s: f64, scale: f64) {
        debug_assert!(scale > 0.0, "clock scale must be positive");
        let game_now = self.now(real_now_s);
        self.anchor.game_anchor_s = game_now;
        self.anchor.real_anchor_s = real_now_s;
        self.anchor.scale = scale;
    }

    pub fn reset(&mut self, real_now_s: f64) {
        self.anchor = ClockAnchor {
            real_anchor_s: real_now_s,
            game_anchor_s: EPOCH_GAME_S,
            paused: false,
            scale: self.anchor.scale,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_advances_by_scale() {
        let clock = Clock::new(ClockAnchor {
            real_anchor_s: 0.0,
            game_anchor_s: 0.0,
            paused: false,
            scale: 2.0,
        });
        assert!((clock.now(10.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn paused_clock_is_frozen() {
        let clock = Clock::new(ClockAnchor {
            real_anchor_s: 0.0,
            game_anchor_s: 42.0,
            paused: true,
            scale: 5.0,
        });
        assert!((clock.now(0.0) - 42.0).abs() < 1e-9);
        assert!((clock.now(1000.0) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn set_paused_captures_anchor_then_freezes() {
        let mut clock = Clock::new(ClockAnchor {
            real_anchor_s: 0.0,
            game_anchor_s: 0.0,
            paused: false,
            scale: 1.0,
        });
        clock.set_paused(100.0, true);
        assert!((clock.now(100.0) - 100.0).abs() < 1e-9);
        assert!((clock.now(500.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn double_pause_is_idempotent() {
        let mut clock = Clock::new(ClockAnchor::default());
        clock.set_paused(50.0, true);
        let after_first = clock.export();
        clock.set_paused(50.0, true);
        assert_eq!(clock.export(), after_first);
    }

    #[test]
    fn set_scale_preserves_current_game_time() {
        let mut clock = Clock::new(ClockAnchor {
            real_anchor_s: 0.0,
            game_anchor_s: 0.0,
            paused: false,
            scale: 1.0,
        });
        let before = clock.now(10.0);
        clock.set_scale(10.0, 100.0);
        let after = clock.now(10.0);
        assert!((before - after).abs() < 1e-9);
        assert!((clock.now(11.0) - (after + 100.0)).abs() < 1e-6);
    }

    #[test]
    fn reset_returns_to_epoch() {
        let mut clock = Clock::new(ClockAnchor {
            real_anchor_s: 0.0,
            game_anchor_s: 99_999.0,
            paused: true,
            scale: 3.0,
        });
        clock.reset(7.0);
        assert!((clock.now(7.0) - EPOCH_GAME_S).abs() < 1e-9);
        assert!(!clock.export().paused);
    }

    #[test]
    fn monotonic_within_unpaused_segment() {
        let clock = Clock::new(ClockAnchor {
            real_anchor_s: 0.0,
            game_anchor_s: 0.0,
            paused: false,
            scale: 168.0,
        });
        let t1 = clock.now(10.0);
        let t2 = clock.now(20.0);
        assert!(t2 > t1);
    }
}
