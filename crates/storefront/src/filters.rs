//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats a date or timestamp as e.g. "May 1, 2025".
///
/// Accepts anything whose display form starts with `YYYY-MM-DD`, which covers
/// chrono timestamps and plain dates alike. Unparseable input passes through
/// unchanged.
///
/// Usage in templates: `{{ order.created_at|date }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_date(&value.to_string()))
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

fn format_date(raw: &str) -> String {
    raw.get(..10)
        .and_then(|d| chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map_or_else(|| raw.to_string(), |d| d.format("%B %-d, %Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::format_date;

    #[test]
    fn test_format_date_accepts_timestamps_and_dates() {
        assert_eq!(format_date("2025-05-01 00:00:00 UTC"), "May 1, 2025");
        assert_eq!(format_date("2025-12-31"), "December 31, 2025");
        assert_eq!(format_date("soon"), "soon");
    }
}
