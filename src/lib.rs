//! dorm-locate: Coordinate resolution for a dormitory portal
//!
//! A library and CLI tool that keeps a dormitory's address and map position
//! consistent. Addresses are geocoded to positions, map clicks are reverse
//! geocoded to addresses, and every position is measured against a fixed
//! campus reference point.
//!
//! ## Features
//!
//! - Haversine distance to a configurable reference point
//! - Nominatim lookups with per-attempt timeouts and linear backoff
//! - Client-side rate limiting of forward lookups
//! - Loop guard so reverse-lookup writes never re-trigger a forward lookup
//! - HTTP session API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use dorm_locate::coord::{Position, ReferencePoint};
//!
//! let campus = ReferencePoint::default();
//! let dorm = Position::new(-6.2383, 107.0215); // Tambun, Bekasi
//!
//! let km = campus.distance_km(dorm);
//! println!("{} km from {}", km, campus.name);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod format;
pub mod geo;
pub mod resolve;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use coord::{Position, ReferencePoint};
pub use error::{Error, Result};
pub use resolve::{ForwardOutcome, ResolutionEngine, ResolutionListener, ReverseOutcome};
