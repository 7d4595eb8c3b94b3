//! Output formatters
//!
//! Provides trait-based output formatting for CLI resolution reports.

pub mod json;
pub mod text;

use crate::coord::{Position, ReferencePoint};
use crate::error::Result;
use crate::resolve::{LookupFailure, TimedEvent};
use serde::{Deserialize, Serialize};

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Everything one CLI resolution produced
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// "geocode" or "reverse"
    pub operation: String,
    /// The address or position that was looked up
    pub input: String,
    pub position: Option<Position>,
    pub address: Option<String>,
    pub distance_km: Option<f64>,
    pub reference: ReferencePoint,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<LookupFailure>,
    pub events: Vec<TimedEvent>,
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a resolution report
    fn format(&self, report: &Report) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    vec![
        FormatInfo {
            name: "json".to_string(),
            description: "Full JSON report".to_string(),
        },
        FormatInfo {
            name: "text".to_string(),
            description: "Human-readable text".to_string(),
        },
    ]
}

#[cfg(test)]
pub(crate) fn sample_report() -> Report {
    Report {
        operation: "geocode".to_string(),
        input: "Jl. Raya Tambun, Bekasi".to_string(),
        position: Some(Position::new(-6.2383, 107.0215)),
        address: Some("Jl. Raya Tambun, Bekasi".to_string()),
        distance_km: Some(26.43),
        reference: ReferencePoint::default(),
        failure: None,
        events: Vec::new(),
    }
}
