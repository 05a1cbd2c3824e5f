/// UsageTracker - counts in-flight references to a render target
///
/// A target can only be destroyed once every scene recorded against it has
/// executed. Each `begin_scene` takes a `UsageToken`; the token is released
/// when the matching `end_scene` command runs or is dropped unexecuted.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct UsageTracker {
    in_flight: Arc<AtomicUsize>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more pending use
    pub fn acquire(&self) -> UsageToken {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        UsageToken {
            in_flight: Arc::clone(&self.in_flight),
        }
    }

    /// Number of tokens still alive
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn is_in_use(&self) -> bool {
        self.in_flight() > 0
    }
}

/// RAII guard returned by `UsageTracker::acquire`
#[derive(Debug)]
pub struct UsageToken {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for UsageToken {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
