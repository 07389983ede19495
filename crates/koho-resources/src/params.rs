//! Query parameter helpers for common filters.

use chrono::NaiveDate;
use koho_api_client::QueryParams;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format a date the way the API expects it in filters.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// `start_date` / `end_date` filter, accepted by work sessions and assignments.
///
/// Work session listings are large; narrowing them by date is recommended.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> QueryParams {
    QueryParams::new()
        .with("start_date", format_date(start))
        .with("end_date", format_date(end))
}

/// `updated_after` filter.
pub fn updated_after(date: NaiveDate) -> QueryParams {
    QueryParams::new().with("updated_after", format_date(date))
}

/// `offset` / `limit` window.
pub fn page(offset: u64, limit: u64) -> QueryParams {
    QueryParams::new().with("offset", offset).with("limit", limit)
}
