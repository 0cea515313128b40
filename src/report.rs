//! Terminal rendering of structured results.
//!
//! Everything here is derived from the structured result types; nothing
//! is computed that the caller could not recompute from them.

use crate::walkforward::WalkForwardReport;
use colored::Colorize;
use std::collections::HashMap;
use tabled::{builder::Builder, settings::Style};

/// Weights below this fraction are omitted from text rendering. The
/// structured weight vector always keeps them.
pub const DISPLAY_WEIGHT_THRESHOLD: f64 = 0.01;

/// Render a weight vector as `SYM 61.0%, SYM 39.0%`, largest first,
/// omitting entries under `threshold`.
pub fn format_weights(weights: &HashMap<String, f64>, threshold: f64) -> String {
    let mut entries: Vec<(&String, f64)> =
        weights.iter().map(|(s, &w)| (s, w)).collect();
    // Sort by weight descending, then by symbol so equal weights render
    // deterministically.
    entries.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    entries
        .iter()
        .filter(|(_, w)| *w >= threshold)
        .map(|(s, w)| format!("{} {:.1}%", s, w * 100.0))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a walk-forward report as an aligned window table.
pub fn walkforward_table(report: &WalkForwardReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Window", "Train", "Test", "Params", "Test Return"]);
    for w in &report.windows {
        builder.push_record([
            w.index.to_string(),
            format!("{}..{}", w.train.start, w.train.end),
            format!("{}..{}", w.test.start, w.test.end),
            w.params.to_string(),
            format!("{:.2}%", w.test_return * 100.0),
        ]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Print a walk-forward report to the terminal, window table plus a
/// color-coded total.
pub fn print_walkforward(report: &WalkForwardReport) {
    println!("{}", "Walk-Forward Analysis".bold());
    println!("{}", walkforward_table(report));

    let total = format!("{:.2}%", report.total_return * 100.0);
    let total = if report.total_return >= 0.0 {
        total.green()
    } else {
        total.red()
    };
    println!(
        "Total out-of-sample return ({:?}): {}",
        report.config.aggregation, total
    );
}
