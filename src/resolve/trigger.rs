//! Debounced trigger gate
//!
//! The collaborator bumps a monotonically increasing counter each time the
//! user explicitly asks for an address lookup. Each value is processed at
//! most once, however many times the surrounding UI re-evaluates.

/// Accepts each strictly increasing trigger value once
#[derive(Debug, Clone, Default)]
pub struct TriggerGate {
    last_processed: Option<u64>,
}

impl TriggerGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `value` if it is newer than anything
    /// processed so far; repeated or stale values return `false`.
    pub fn should_process(&mut self, value: u64) -> bool {
        match self.last_processed {
            Some(last) if value <= last => false,
            _ => {
                self.last_processed = Some(value);
                true
            }
        }
    }

    pub fn last_processed(&self) -> Option<u64> {
        self.last_processed
    }
}
