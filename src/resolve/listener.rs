//! Collaborator-facing notifications
//!
//! The surrounding form or map widget implements [`ResolutionListener`];
//! [`EventLog`] is a buffering implementation used by the CLI and the HTTP
//! sessions.

use crate::coord::Position;
use crate::resolve::lookup::{FailureCategory, LookupFailure};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// A change of the canonical position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub position: Position,
    /// New address text, when it changed together with the position
    pub address: Option<String>,
    /// Distance to the reference point in kilometers
    pub distance_km: f64,
}

/// Receives engine results
pub trait ResolutionListener: Send + Sync {
    /// The canonical position changed, for either cause
    fn on_position_change(&self, update: &PositionUpdate);

    /// The address text changed because of a reverse lookup
    fn on_address_change(&self, address: &str);

    /// A terminal failure to show the user
    fn on_error(&self, failure: &LookupFailure);

    /// A soft warning or validation notice
    fn on_notice(&self, message: &str);
}

impl<T: ResolutionListener + ?Sized> ResolutionListener for Arc<T> {
    fn on_position_change(&self, update: &PositionUpdate) {
        (**self).on_position_change(update)
    }

    fn on_address_change(&self, address: &str) {
        (**self).on_address_change(address)
    }

    fn on_error(&self, failure: &LookupFailure) {
        (**self).on_error(failure)
    }

    fn on_notice(&self, message: &str) {
        (**self).on_notice(message)
    }
}

/// Reports every notification to two listeners, `first` then `second`
pub struct Tee<'a, A: ?Sized, B: ?Sized> {
    first: &'a A,
    second: &'a B,
}

impl<'a, A: ?Sized, B: ?Sized> Tee<'a, A, B> {
    pub fn new(first: &'a A, second: &'a B) -> Self {
        Self { first, second }
    }
}

impl<A, B> ResolutionListener for Tee<'_, A, B>
where
    A: ResolutionListener + ?Sized,
    B: ResolutionListener + ?Sized,
{
    fn on_position_change(&self, update: &PositionUpdate) {
        self.first.on_position_change(update);
        self.second.on_position_change(update);
    }

    fn on_address_change(&self, address: &str) {
        self.first.on_address_change(address);
        self.second.on_address_change(address);
    }

    fn on_error(&self, failure: &LookupFailure) {
        self.first.on_error(failure);
        self.second.on_error(failure);
    }

    fn on_notice(&self, message: &str) {
        self.first.on_notice(message);
        self.second.on_notice(message);
    }
}

/// A recorded notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent {
    PositionChanged {
        position: Position,
        address: Option<String>,
        distance_km: f64,
    },
    AddressChanged {
        address: String,
    },
    Error {
        category: FailureCategory,
        message: String,
    },
    Notice {
        message: String,
    },
}

/// A notification with the time it was emitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ResolutionEvent,
}

/// Listener that buffers notifications
///
/// Unbounded by default; a bounded log keeps only the most recent events.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<VecDeque<TimedEvent>>,
    capacity: Option<usize>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that keeps at most `capacity` events, dropping the oldest
    pub fn bounded(capacity: usize) -> Self {
        Self {
            events: Mutex::default(),
            capacity: Some(capacity),
        }
    }

    fn push(&self, event: ResolutionEvent) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(capacity) = self.capacity {
            while events.len() >= capacity.max(1) {
                events.pop_front();
            }
        }
        events.push_back(TimedEvent {
            at: Utc::now(),
            event,
        });
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<TimedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<TimedEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner)).into()
    }
}

impl ResolutionListener for EventLog {
    fn on_position_change(&self, update: &PositionUpdate) {
        self.push(ResolutionEvent::PositionChanged {
            position: update.position,
            address: update.address.clone(),
            distance_km: update.distance_km,
        });
    }

    fn on_address_change(&self, address: &str) {
        self.push(ResolutionEvent::AddressChanged {
            address: address.to_string(),
        });
    }

    fn on_error(&self, failure: &LookupFailure) {
        self.push(ResolutionEvent::Error {
            category: failure.category,
            message: failure.message.clone(),
        });
    }

    fn on_notice(&self, message: &str) {
        self.push(ResolutionEvent::Notice {
            message: message.to_string(),
        });
    }
}
