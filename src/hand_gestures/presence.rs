use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresencePhase {
    /// No hand in the latest frame.
    Absent,
    /// A hand is visible but has not been held for the full dwell yet.
    Checking { remaining: Duration },
    /// Control is authorized.
    Confirmed,
}

impl PresencePhase {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

/// Gates control until a hand has been continuously visible for `dwell`.
#[derive(Debug)]
pub struct PresenceDebouncer {
    dwell: Duration,
    since: Option<Instant>,
    confirmed: bool,
}

impl PresenceDebouncer {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            since: None,
            confirmed: false,
        }
    }

    pub fn observe(&mut self, detected: bool, now: Instant) -> PresencePhase {
        if !detected {
            if self.since.is_some() {
                tracing::debug!("hand lost, presence reset");
            }
            self.reset();
            return PresencePhase::Absent;
        }

        let since = match self.since {
            Some(since) => since,
            None => {
                self.since = Some(now);
                return PresencePhase::Checking {
                    remaining: self.dwell,
                };
            }
        };

        if self.confirmed {
            return PresencePhase::Confirmed;
        }

        let elapsed = now.saturating_duration_since(since);
        if elapsed >= self.dwell {
            self.confirmed = true;
            tracing::info!(dwell_ms = self.dwell.as_millis() as u64, "hand presence confirmed");
            PresencePhase::Confirmed
        } else {
            PresencePhase::Checking {
                remaining: self.dwell - elapsed,
            }
        }
    }

    pub fn reset(&mut self) {
        self.since = None;
        self.confirmed = false;
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn since(&self) -> Option<Instant> {
        self.since
    }
}
