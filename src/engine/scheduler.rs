use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed { deadline: Instant },
}

/// Cooperative one-shot timer polled by the UI loop. At most one wake-up is
/// outstanding: arming again replaces the previous deadline.
#[derive(Debug)]
pub struct TickScheduler {
    state: SchedulerState,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl TickScheduler {
    pub fn new() -> Self {
        Self {
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, SchedulerState::Armed { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Armed { deadline } => Some(deadline),
            SchedulerState::Idle => None,
        }
    }

    pub fn arm(&mut self, delay: Duration, now: Instant) {
        self.state = SchedulerState::Armed {
            deadline: now + delay,
        };
    }

    /// Cancelling an idle scheduler is a no-op.
    pub fn cancel(&mut self) {
        self.state = SchedulerState::Idle;
    }

    /// Returns true once when the armed deadline has passed, leaving the
    /// scheduler idle until the caller re-arms it.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::Armed { deadline } if now >= deadline => {
                self.state = SchedulerState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}
