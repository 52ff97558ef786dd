//! Minimum-interval gate for RC command dispatch.
//!
//! The control tick and the command rate are independent: ticks run at the
//! poll cadence, commands go out no more often than the gate allows.

use embassy_time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandGate {
    min_interval: Duration,
    last: Option<Instant>,
}

impl CommandGate {
    #[must_use]
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// At least `min_interval` has passed since the last dispatch.
    #[must_use]
    pub fn ready(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= self.min_interval),
        }
    }

    /// Record a dispatch at `now`.
    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }

    /// [`ready`](Self::ready) and, if so, [`mark`](Self::mark).
    pub fn try_pass(&mut self, now: Instant) -> bool {
        let ready = self.ready(now);
        if ready {
            self.mark(now);
        }
        ready
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_dispatch_passes() {
        let gate = CommandGate::new(Duration::from_millis(50));
        assert!(gate.ready(Instant::from_millis(0)));
    }

    #[test]
    fn test_enforces_min_interval() {
        let mut gate = CommandGate::new(Duration::from_millis(50));
        assert!(gate.try_pass(Instant::from_millis(1000)));
        assert!(!gate.try_pass(Instant::from_millis(1016)));
        assert!(!gate.try_pass(Instant::from_millis(1049)));
        assert!(gate.try_pass(Instant::from_millis(1050)));
        assert!(!gate.ready(Instant::from_millis(1066)));
    }

    #[test]
    fn test_rate_independent_of_tick_cadence() {
        // 60 Hz ticks against a 20 Hz gate for one second.
        let mut gate = CommandGate::new(Duration::from_millis(50));
        let passed = (0..60u64)
            .filter(|i| gate.try_pass(Instant::from_micros(i * 16_667)))
            .count();
        assert!((15..=20).contains(&passed), "{passed}");
    }

    #[test]
    fn test_reset() {
        let mut gate = CommandGate::new(Duration::from_secs(10));
        gate.mark(Instant::from_secs(1));
        assert!(!gate.ready(Instant::from_secs(2)));
        gate.reset();
        assert!(gate.ready(Instant::from_secs(2)));
    }
}
