use std::time::{Duration, Instant};

use crossbeam::channel::{at, Receiver};

/// Provides a constant-period looping construct.
///
/// Cycles which are missed entirely (because the loop body ran longer than a
/// period) are skipped rather than fired back to back.
pub struct Loop {
    delta: Duration,
    next: Instant,
}

impl Loop {
    #[inline]
    /// Creates a new loop object with a given period.
    pub fn new(delta: Duration) -> Self {
        Loop {
            delta,
            next: Instant::now() + delta,
        }
    }

    /// Gets the loop period.
    pub fn period(&self) -> Duration {
        self.delta
    }

    /// Delays until the next loop cycle.
    pub fn delay(&mut self) {
        let now = Instant::now();
        if self.next > now {
            std::thread::sleep(self.next - now);
        }
        self.advance();
    }

    /// A channel which receives once, at the next loop cycle.
    ///
    /// Intended as an arm of a [`select!`](crossbeam::channel::select)
    /// together with a cancellation channel.
    pub fn select(&mut self) -> Receiver<Instant> {
        let rx = at(self.next);
        self.advance();
        rx
    }

    /// Restarts the period from now.
    pub fn reset(&mut self) {
        self.next = Instant::now() + self.delta;
    }

    fn advance(&mut self) {
        self.next += self.delta;
        let now = Instant::now();
        if self.next < now {
            self.next = now + self.delta;
        }
    }
}
