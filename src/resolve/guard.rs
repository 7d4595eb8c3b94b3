//! Loop-guard state coordinator
//!
//! Owns the canonical position and address text. A reverse lookup writes
//! both at once and opens a short suppression window; while it is open,
//! address-field changes are echoes of that write and must not start a
//! forward lookup. The window closes itself once its deadline passes.

use crate::coord::Position;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Two-state suppression machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suppression {
    Idle,
    Active { until: Instant },
}

/// What happened to an observed address change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressObservation {
    /// A user edit; recorded and eligible for a forward lookup
    Accepted,
    /// An echo of a reverse-lookup write; ignored
    Suppressed,
}

/// Canonical position/address pair plus the suppression window
#[derive(Debug, Clone)]
pub struct LoopGuard {
    position: Option<Position>,
    address: String,
    window: Duration,
    suppression: Suppression,
}

impl LoopGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            position: None,
            address: String::new(),
            window,
            suppression: Suppression::Idle,
        }
    }

    /// Seed with values from a stored profile
    pub fn seed(&mut self, position: Option<Position>, address: impl Into<String>) {
        self.position = position;
        self.address = address.into();
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether the suppression window is open at `now`
    ///
    /// An expired window transitions back to idle.
    pub fn is_suppressed(&mut self, now: Instant) -> bool {
        match self.suppression {
            Suppression::Active { until } if now < until => true,
            Suppression::Active { .. } => {
                self.suppression = Suppression::Idle;
                false
            }
            Suppression::Idle => false,
        }
    }

    /// Replace position and address from a reverse lookup
    ///
    /// Opens the suppression window so the resulting address-field change
    /// is not mistaken for a user edit.
    pub fn apply_coordinate_derived_address(
        &mut self,
        position: Position,
        address: impl Into<String>,
        now: Instant,
    ) {
        self.suppression = Suppression::Active {
            until: now + self.window,
        };
        self.position = Some(position);
        self.address = address.into();
    }

    /// Replace the position from a forward lookup
    ///
    /// The address stays as the user typed it.
    pub fn apply_address_derived_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Record a position whose address could not be resolved
    pub fn commit_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Handle a change of the collaborator's address field
    pub fn observe_address_change(
        &mut self,
        address: impl Into<String>,
        now: Instant,
    ) -> AddressObservation {
        if self.is_suppressed(now) {
            return AddressObservation::Suppressed;
        }
        self.address = address.into();
        AddressObservation::Accepted
    }
}
