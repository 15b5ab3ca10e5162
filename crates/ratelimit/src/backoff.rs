use std::time::Duration;

/// Doubling (or other integer factor) delay schedule, capped at `max`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial: Duration,
    max: Duration,
    factor: u32,
    current_attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            factor: 2,
            current_attempt: 0,
        }
    }

    pub fn with_factor(mut self, factor: u32) -> Self {
        self.factor = factor.max(1);
        self
    }

    /// Delay for the given zero-based attempt without advancing the schedule
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let scale = self.factor.saturating_pow(attempt);
        self.initial.saturating_mul(scale).min(self.max)
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.current_attempt);
        self.current_attempt = self.current_attempt.saturating_add(1);
        delay
    }

    /// Sum of the first `attempts` delays
    pub fn total_delay(&self, attempts: u32) -> Duration {
        (0..attempts).fold(Duration::ZERO, |acc, a| acc.saturating_add(self.delay_for(a)))
    }

    pub fn reset(&mut self) {
        self.current_attempt = 0;
    }

    pub fn current_attempt(&self) -> u32 {
        self.current_attempt
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(10), Duration::from_secs(300))
    }
}
