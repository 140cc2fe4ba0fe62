//! Per-(caller, endpoint) cooldown tracking.
//!
//! Windows are indexed by caller, then by endpoint. The check-then-record
//! step runs under the endpoint entry's shard lock, so two concurrent calls
//! for the same pair can never both be admitted in one window. Ending a
//! session removes one caller entry and leaves every other caller alone.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::context::{CallerId, EndpointId};

/// Floor applied to every configured cooldown, so zero or near-zero values
/// still mean something under timer jitter.
pub const MIN_COOLDOWN_RESOLUTION: Duration = Duration::from_millis(10);

type Windows = DashMap<EndpointId, Instant>;

#[derive(Default)]
pub struct CooldownTracker {
    by_caller: DashMap<CallerId, Windows>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit the call and record `now`, or report it as throttled.
    ///
    /// With no cooldown configured the call is always admitted and nothing is
    /// stored. A throttled call does not move the window.
    pub fn check_and_record(
        &self,
        caller: &CallerId,
        endpoint: &EndpointId,
        now: Instant,
        cooldown: Option<Duration>,
    ) -> bool {
        let Some(cooldown) = cooldown else {
            return true;
        };
        let window = cooldown.max(MIN_COOLDOWN_RESOLUTION);

        // Common case: the caller already has windows; only a read lock on
        // the outer shard is taken.
        if let Some(windows) = self.by_caller.get(caller) {
            return admit(windows.value(), endpoint, now, window);
        }
        let windows = self.by_caller.entry(caller.clone()).or_default();
        admit(windows.value(), endpoint, now, window)
    }

    /// Drop every window of a caller whose session ended.
    pub fn forget_caller(&self, caller: &CallerId) {
        self.by_caller.remove(caller);
    }

    /// Drop every window of an endpoint that was disconnected.
    pub fn forget_endpoint(&self, endpoint: &EndpointId) {
        for windows in self.by_caller.iter() {
            windows.value().remove(endpoint);
        }
    }

    /// Number of live (caller, endpoint) windows.
    pub fn len(&self) -> usize {
        self.by_caller.iter().map(|w| w.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_caller.iter().all(|w| w.value().is_empty())
    }
}

fn admit(windows: &Windows, endpoint: &EndpointId, now: Instant, window: Duration) -> bool {
    match windows.entry(endpoint.clone()) {
        Entry::Vacant(e) => {
            e.insert(now);
            true
        }
        Entry::Occupied(mut e) => {
            if now.saturating_duration_since(*e.get()) >= window {
                e.insert(now);
                true
            } else {
                false
            }
        }
    }
}
