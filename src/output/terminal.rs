//! Terminal output utilities.
//!
//! Provides formatting helpers for aligned terminal rows and the deploy
//! progress bar.

use itertools::Itertools;

/// Format a value as a left-aligned field of at least `width` characters.
///
/// Values longer than `width` are kept whole.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    if value_str.chars().count() >= width {
        value_str
    } else {
        format!("{value_str:<width$}")
    }
}

/// Join fields into one row, each padded to its column width.
pub fn format_row<T: ToString>(fields: &[T], widths: &[usize]) -> String {
    fields
        .iter()
        .zip(widths.iter().chain(std::iter::repeat(&0)))
        .map(|(value, width)| format_field(value.to_string(), *width))
        .join("  ")
        .trim_end()
        .to_string()
}

/// Column widths that fit every row.
pub fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|v| v.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect()
}

const BAR_WIDTH: usize = 20;

/// One-line progress bar, e.g. `[#####---------------]  25.0% subnets`.
pub fn progress_line(phase: impl std::fmt::Display, percent: f64) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let filled = (percent / 100.0 * BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}] {percent:5.1}% {phase}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}
