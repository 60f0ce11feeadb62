use std::time::{Duration, Instant};

pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_millis(1000);
pub const CLOCK_INTERVAL: Duration = Duration::from_millis(1000);

/// A periodic deadline polled by the owner. Cancelling it is final until it
/// is armed again, so a torn-down session can never be ticked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicTimer {
    period: Duration,
    next_due: Option<Instant>,
}

impl PeriodicTimer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
        }
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Fires at most once per call. When the caller falls more than a period
    /// behind, the schedule restarts from `now` instead of bursting.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                let mut next = due + self.period;
                if next <= now {
                    next = now + self.period;
                }
                self.next_due = Some(next);
                true
            }
            _ => false,
        }
    }
}

/// Every timer a session owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimers {
    pub countdown: PeriodicTimer,
    pub poll: PeriodicTimer,
    pub clock: PeriodicTimer,
}

impl Default for SessionTimers {
    fn default() -> Self {
        Self {
            countdown: PeriodicTimer::new(COUNTDOWN_INTERVAL),
            poll: PeriodicTimer::new(POLL_INTERVAL),
            clock: PeriodicTimer::new(CLOCK_INTERVAL),
        }
    }
}

impl SessionTimers {
    pub fn cancel_all(&mut self) {
        self.countdown.cancel();
        self.poll.cancel();
        self.clock.cancel();
    }

    pub fn any_armed(&self) -> bool {
        self.countdown.is_armed() || self.poll.is_armed() || self.clock.is_armed()
    }
}
