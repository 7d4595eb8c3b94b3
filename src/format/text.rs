//! Human-readable text output formatter

use crate::error::Result;
use crate::format::{OutputFormatter, Report};

/// Text formatter - outputs a human-readable summary
pub struct TextFormatter;

impl OutputFormatter for TextFormatter {
    fn name(&self) -> &str {
        "text"
    }

    fn description(&self) -> &str {
        "Human-readable text"
    }

    fn format(&self, report: &Report) -> Result<String> {
        let mut output = String::new();

        output.push_str(&format!("{}: {}\n", report.operation, report.input));

        match report.position {
            Some(position) => output.push_str(&format!("Position: {}\n", position)),
            None => output.push_str("Position: (none)\n"),
        }

        if let Some(address) = &report.address {
            output.push_str(&format!("Address: {}\n", address));
        }

        if let Some(distance) = report.distance_km {
            output.push_str(&format!(
                "Distance to {}: {:.2} km\n",
                report.reference.name, distance
            ));
        }

        if let Some(failure) = &report.failure {
            output.push_str(&format!(
                "\n{} [{}, {} attempt(s)]\n",
                failure.message, failure.category, failure.attempts
            ));
        }

        Ok(output)
    }
}
