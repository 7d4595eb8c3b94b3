//! Coordinate resolution engine
//!
//! Reconciles forward (address to position) and reverse (position to
//! address) lookups against one canonical position:
//! - [`rate_limit`] spaces out explicit forward lookups
//! - [`trigger`] processes each lookup request value once
//! - [`lookup`] retries provider calls with timeout and backoff
//! - [`guard`] keeps reverse-lookup writes from re-triggering forward lookups
//! - [`engine`] composes the above and reports to a [`ResolutionListener`]

pub mod engine;
pub mod guard;
pub mod listener;
pub mod lookup;
pub mod rate_limit;
pub mod trigger;

pub use engine::{EnginePhase, EngineSnapshot, ForwardOutcome, Rejection, ResolutionEngine, ReverseOutcome};
pub use guard::{AddressObservation, LoopGuard};
pub use listener::{
    EventLog, PositionUpdate, ResolutionEvent, ResolutionListener, Tee, TimedEvent,
};
pub use lookup::{
    FailureCategory, LookupClient, LookupFailure, LookupKind, LookupPolicy, LookupRequest,
    LookupResult, Resolved,
};
pub use rate_limit::RateLimiter;
pub use trigger::TriggerGate;
