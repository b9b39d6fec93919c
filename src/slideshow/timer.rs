use std::time::Duration;

/// Fixed resolution of the slideshow timer.
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Progress bookkeeping for the auto-advance timer.
///
/// The timer counts whole ticks and derives progress from the configured
/// delay, so a delay that is not a multiple of the tick completes on the
/// first tick past it.
#[derive(Debug, Clone)]
pub struct SlideTimer {
    running: bool,
    elapsed_ticks: u32,
    delay: Duration,
}

impl SlideTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            running: false,
            elapsed_ticks: 0,
            delay,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.elapsed_ticks = 0;
    }

    /// Fraction of the delay elapsed, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let delay = self.delay.as_secs_f64();
        if delay <= 0.0 {
            return 1.0;
        }
        let elapsed = f64::from(self.elapsed_ticks) * TICK_INTERVAL.as_secs_f64();
        (elapsed / delay).min(1.0)
    }

    /// Records one tick. Returns `true` when a full delay has elapsed, in
    /// which case progress starts over.
    pub fn tick(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.elapsed_ticks = self.elapsed_ticks.saturating_add(1);
        if self.progress() >= 1.0 {
            self.reset();
            true
        } else {
            false
        }
    }
}
