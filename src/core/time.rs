//! Fixed-step simulation clock

use std::time::Duration;

/// Accumulates real frame time and hands out whole fixed steps.
#[derive(Debug, Clone)]
pub struct Time {
    fixed_timestep: Duration,
    max_steps_per_frame: u32,
    accumulator: Duration,
    elapsed: Duration,
    steps: u64,
    frame_delta: Duration,
}

impl Time {
    /// Create a clock stepping every `fixed_timestep`, running at most
    /// `max_steps_per_frame` steps per [`Time::advance`]
    #[must_use]
    pub fn new(fixed_timestep: Duration, max_steps_per_frame: u32) -> Self {
        Self {
            fixed_timestep,
            max_steps_per_frame,
            accumulator: Duration::ZERO,
            elapsed: Duration::ZERO,
            steps: 0,
            frame_delta: Duration::ZERO,
        }
    }

    /// Add a frame's worth of real time and return how many fixed steps to run.
    ///
    /// Time beyond the per-frame step budget is discarded so a long stall does
    /// not snowball into ever longer frames.
    pub fn advance(&mut self, frame_delta: Duration) -> u32 {
        self.frame_delta = frame_delta;
        if self.fixed_timestep.is_zero() {
            return 0;
        }

        self.accumulator += frame_delta;
        let mut steps = 0;
        while self.accumulator >= self.fixed_timestep && steps < self.max_steps_per_frame {
            self.accumulator -= self.fixed_timestep;
            self.elapsed += self.fixed_timestep;
            self.steps += 1;
            steps += 1;
        }

        if self.accumulator >= self.fixed_timestep {
            log::debug!(
                "Dropping {:.1}ms of simulation time",
                self.accumulator.as_secs_f32() * 1000.0
            );
            self.accumulator = Duration::ZERO;
        }
        steps
    }

    /// Record a step that was run outside [`Time::advance`]
    pub(crate) fn record_step(&mut self, dt: Duration) {
        self.elapsed += dt;
        self.steps += 1;
    }

    /// Length of one fixed step
    #[must_use]
    pub fn fixed_timestep(&self) -> Duration {
        self.fixed_timestep
    }

    /// Length of one fixed step in seconds
    #[must_use]
    pub fn fixed_delta_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Last frame delta passed to [`Time::advance`]
    #[must_use]
    pub fn frame_delta(&self) -> Duration {
        self.frame_delta
    }

    /// Simulated time so far
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total fixed steps run
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Fraction of a step left in the accumulator, for interpolation
    #[must_use]
    pub fn alpha(&self) -> f32 {
        if self.fixed_timestep.is_zero() {
            return 0.0;
        }
        self.accumulator.as_secs_f32() / self.fixed_timestep.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(1.0 / 60.0), 5)
    }
}
