use chrono::{Datelike, NaiveDate};

/// Formats the ISO-8601 year-week bucket key for a date, e.g. `2025-W10`.
///
/// Weeks start on Monday and the year component is the ISO week-numbering
/// year, which differs from the calendar year around January 1st.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}
