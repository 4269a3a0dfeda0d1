// SPDX-License-Identifier: MIT

//! CSV export of the usage log.
//!
//! The output is built for spreadsheet tools: a UTF-8 BOM up front so
//! Excel detects the encoding, every text cell quoted (with `""` escaping),
//! numeric cells written raw, and every row newline-terminated including
//! the last one.

use crate::models::UsageEvent;
use crate::time_utils::format_date;
use chrono::{Timelike, Utc};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

const USAGE_HEADER: &[&str] = &[
    "Event ID",
    "User",
    "Widget",
    "Date",
    "Time",
    "Duration (seconds)",
];

/// One CSV cell. Text cells are always quoted, numbers never are.
#[derive(Debug, Clone)]
pub enum CsvCell {
    Text(String),
    Number(i64),
}

impl CsvCell {
    fn write_to(&self, out: &mut String) {
        match self {
            CsvCell::Text(value) => {
                out.push('"');
                for ch in value.chars() {
                    if ch == '"' {
                        out.push('"');
                    }
                    out.push(ch);
                }
                out.push('"');
            }
            CsvCell::Number(value) => {
                out.push_str(&value.to_string());
            }
        }
    }
}

/// Serialize a header plus rows into CSV bytes, BOM included.
pub fn to_csv_bytes(header: &[&str], rows: &[Vec<CsvCell>]) -> Vec<u8> {
    let mut body = String::new();

    body.push_str(&header.join(","));
    body.push('\n');

    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                body.push(',');
            }
            cell.write_to(&mut body);
        }
        body.push('\n');
    }

    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + body.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(body.as_bytes());
    bytes
}

/// Render the usage log as a CSV document.
pub fn usage_report_csv(events: &[UsageEvent]) -> Vec<u8> {
    let rows: Vec<Vec<CsvCell>> = events
        .iter()
        .map(|event| {
            let started = event.started_at;
            vec![
                CsvCell::Text(event.id.clone().unwrap_or_default()),
                CsvCell::Text(event.email.clone()),
                CsvCell::Text(event.widget_key().to_string()),
                CsvCell::Text(format_date(started.date_naive())),
                CsvCell::Text(format!("{:02}:{:02}", started.hour(), started.minute())),
                CsvCell::Number(event.duration),
            ]
        })
        .collect();

    to_csv_bytes(USAGE_HEADER, &rows)
}

/// Dated download filename, e.g. `usage_report_general_2026-08-27.csv`.
///
/// `scope` is "general" for the full log or a sanitized user label for a
/// filtered export.
pub fn usage_report_filename(scope: &str) -> String {
    let sanitized: String = scope
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "usage_report_{}_{}.csv",
        sanitized,
        Utc::now().format("%Y-%m-%d")
    )
}
