use std::time::{Duration, Instant};

/// Wall-clock cooldown used to rate-limit periodic broadcasts. A fresh timer
/// rings immediately so the first broadcast of a session is never delayed.
pub struct Timer {
    duration: Duration,
    last: Option<Instant>,
}

impl Timer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            last: None,
        }
    }

    /// Whether the cooldown has elapsed since the last `reset`.
    pub fn ringing(&self) -> bool {
        match self.last {
            Some(last) => last.elapsed() >= self.duration,
            None => true,
        }
    }

    /// Restarts the cooldown.
    pub fn reset(&mut self) {
        self.last = Some(Instant::now());
    }
}
