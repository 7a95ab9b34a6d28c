//! Frame-driven timers.
//!
//! Timers are advanced explicitly with the elapsed milliseconds of a frame.
//! Holders keep them in an `Option` and cancel with `take()`: a dropped timer
//! can never fire again.

/// Fires once after `duration_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Countdown {
    remaining_ms: f32,
    fired: bool,
}

impl Countdown {
    pub fn new(duration_ms: f32) -> Self {
        Self {
            remaining_ms: duration_ms,
            fired: false,
        }
    }

    /// Returns `true` on the single advance that crosses zero.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        if self.fired {
            return false;
        }
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= 0.0 {
            self.fired = true;
            return true;
        }
        false
    }
}

/// Fires every `period_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval {
    period_ms: f32,
    elapsed_ms: f32,
}

impl Interval {
    pub fn new(period_ms: f32) -> Self {
        Self {
            period_ms: period_ms.max(f32::EPSILON),
            elapsed_ms: 0.0,
        }
    }

    /// Number of periods completed during this advance.
    pub fn advance(&mut self, dt_ms: f32) -> u32 {
        self.elapsed_ms += dt_ms;
        let mut fired = 0;
        while self.elapsed_ms >= self.period_ms {
            self.elapsed_ms -= self.period_ms;
            fired += 1;
        }
        fired
    }
}
