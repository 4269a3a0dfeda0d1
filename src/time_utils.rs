// SPDX-License-Identifier: MIT

//! Shared helpers for subscription date arithmetic and formatting.
//!
//! Subscription start/expiry dates are stored as `DD/MM/YYYY` strings,
//! the format the rest of the platform already uses.

use chrono::{Datelike, Months, NaiveDate, Utc};

/// Format a date as `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

/// Today's date (UTC) as `DD/MM/YYYY`.
pub fn today_str() -> String {
    format_date(Utc::now().date_naive())
}

/// Add `months` to a date, clamping the day when the target month is shorter
/// (31 Jan + 1 month = 28/29 Feb).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    // checked_add_months only fails past year 262143; treat that as saturation.
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

/// Expiry date for a subscription of `months` starting today, as `DD/MM/YYYY`.
pub fn expiry_from_today(months: u32) -> String {
    format_date(add_months(Utc::now().date_naive(), months))
}
