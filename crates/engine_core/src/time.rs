//! Time management for the simulation loop.

use std::time::Duration;

/// Frame timing with a fixed-timestep accumulator for physics.
///
/// The simulation is driven by explicit frame deltas rather than a wall clock,
/// so a headless run and a test produce the same sequence of fixed steps.
#[derive(Debug)]
pub struct Time {
    /// Duration of the last frame.
    delta: Duration,
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Frame count since start.
    frame_count: u64,
    /// Fixed timestep for physics (default 60 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
    /// Upper bound on a single frame delta, avoids a spiral of fixed steps after a stall.
    max_delta: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / 60.0),
            accumulator: Duration::ZERO,
            max_delta: Duration::from_millis(250),
        }
    }

    /// Advance by one frame of the given length.
    pub fn advance(&mut self, delta: Duration) {
        let delta = delta.min(self.max_delta);
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
        self.accumulator += delta;
    }

    /// Advance by one frame given in seconds. Negative and NaN values count as
    /// zero, anything too large for a `Duration` as the maximum frame.
    pub fn advance_seconds(&mut self, seconds: f32) {
        let delta = Duration::try_from_secs_f32(seconds.max(0.0)).unwrap_or(self.max_delta);
        self.advance(delta);
    }

    /// Get the delta time in seconds.
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the current frame count.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz. Non-positive rates are ignored.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        if hz > 0.0 {
            self.fixed_timestep = Duration::from_secs_f64(1.0 / hz);
        } else {
            log::warn!("Ignoring non-positive fixed rate {}", hz);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_steps_consume_accumulator() {
        let mut time = Time::new();
        time.set_fixed_rate(50.0);
        time.advance(Duration::from_millis(50));
        let mut steps = 0;
        while time.should_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert_eq!(time.frame_count(), 1);
    }

    #[test]
    fn huge_delta_is_clamped() {
        let mut time = Time::new();
        time.advance(Duration::from_secs(10));
        assert!(time.delta_seconds() <= 0.25 + 1e-6);
    }

    #[test]
    fn non_finite_seconds_do_not_panic() {
        let mut time = Time::new();
        time.advance_seconds(f32::INFINITY);
        assert!((time.delta_seconds() - 0.25).abs() < 1e-6);
        time.advance_seconds(f32::NAN);
        assert_eq!(time.delta_seconds(), 0.0);
        time.advance_seconds(-1.0);
        assert_eq!(time.delta_seconds(), 0.0);
        assert_eq!(time.frame_count(), 3);
    }
}
