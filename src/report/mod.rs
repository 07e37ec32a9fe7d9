//! Report generation and rendering.
//!
//! `generator` runs the pipeline (aggregate, prompt, call the model, parse,
//! fall back); `markdown` turns the resulting [`Report`] into a printable
//! document or JSON.
//!
//! [`Report`]: crate::models::Report

pub mod fallback;
pub mod generator;
pub mod markdown;
pub mod prompt;
pub mod response;

pub use generator::ReportGenerator;
pub use markdown::write_report;

use crate::analysis::round_display;

/// Two-decimal display of an average; `N/A` when undefined.
pub fn format_average(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}", round_display(v)),
        None => "N/A".to_string(),
    }
}

/// One-decimal percentage, e.g. `66.7%`.
pub fn format_pass_rate(rate: f64) -> String {
    format!("{:.1}%", (rate * 10.0).round() / 10.0)
}

/// Scale values print with at least one decimal: `3.0`, `2.75`.
pub fn format_scale_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}
