use std::time::{Duration, Instant};

/// Fixed interval tick source.
///
/// The first tick is due immediately. Every later tick becomes due one
/// interval after the previous tick *finished*, so ticks never overlap.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    interval: Duration,
    next: Option<Instant>,
}

impl FrameTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.next.map_or(true, |next| now >= next)
    }

    /// Schedules the next tick relative to `finished`.
    pub fn arm(&mut self, finished: Instant) {
        self.next = Some(finished + self.interval);
    }

    /// Time left until the next tick is due.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.next
            .map_or(Duration::ZERO, |next| next.saturating_duration_since(now))
    }

    /// Runs `tick` if it is due and re-arms the timer once it returns.
    pub fn fire<R>(&mut self, tick: impl FnOnce() -> R) -> Option<R> {
        if !self.is_due(Instant::now()) {
            return None;
        }
        let out = tick();
        self.arm(Instant::now());
        Some(out)
    }
}
