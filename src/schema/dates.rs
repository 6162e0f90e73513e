//! Date parsing for text date cells.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01, the Arrow `Date32` epoch
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Years accepted for text dates. `%Y` also matches one and two digit
/// years, so `02/01/22` would otherwise parse as year 22.
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2100;

/// Configuration for date format handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormatConfig {
    /// Date formats tried in order
    pub date_formats: Vec<String>,
    /// Date-time formats tried in order; the time part is discarded
    pub datetime_formats: Vec<String>,
    /// Enable heuristic format detection
    pub enable_format_detection: bool,
}

impl Default for DateFormatConfig {
    fn default() -> Self {
        Self {
            date_formats: vec![
                "%Y-%m-%d".to_string(), // ISO format: 2023-01-15
                "%d/%m/%Y".to_string(), // UK: 15/01/2023
                "%d-%m-%Y".to_string(), // 15-01-2023
                "%Y/%m/%d".to_string(), // 2023/01/15
                "%d.%m.%Y".to_string(), // 15.01.2023
                "%Y%m%d".to_string(),   // Compact: 20230115
                "%d %b %Y".to_string(), // 15 Jan 2023
                "%d %B %Y".to_string(), // 15 January 2023
            ],
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M:%S%.f".to_string(),
                "%d/%m/%Y %H:%M".to_string(),
                "%d/%m/%Y %H:%M:%S".to_string(),
            ],
            enable_format_detection: true,
        }
    }
}

/// Parse a date string with multiple format attempts
///
/// Dates outside 1900..=2100 are rejected, which also rules out
/// two-digit years.
#[must_use]
pub fn parse_date_string(s: &str, config: &DateFormatConfig) -> Option<NaiveDate> {
    let s = s.trim();

    let parsed = config
        .date_formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok().filter(in_year_window))
        .or_else(|| {
            config.datetime_formats.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(s, format)
                    .ok()
                    .map(|datetime| datetime.date())
                    .filter(in_year_window)
            })
        });
    if parsed.is_some() {
        return parsed;
    }

    if config.enable_format_detection {
        let format = detect_date_format(s)?;
        return NaiveDate::parse_from_str(s, format).ok().filter(in_year_window);
    }

    None
}

fn in_year_window(date: &NaiveDate) -> bool {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year())
}

/// Try to detect the date format based on string patterns
#[must_use]
pub fn detect_date_format(s: &str) -> Option<&'static str> {
    // YYYY-MM-DD
    if s.len() == 10 && s.chars().nth(4) == Some('-') && s.chars().nth(7) == Some('-') {
        return Some("%Y-%m-%d");
    }

    if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() == 3 {
            if parts[0].len() == 4 {
                return Some("%Y/%m/%d");
            } else if parts[2].len() == 4 {
                // Day-first unless the first part cannot be a day
                return match parts[1].parse::<u8>() {
                    Ok(second) if second > 12 => Some("%m/%d/%Y"),
                    _ => Some("%d/%m/%Y"),
                };
            }
        }
    }

    if s.contains('.') {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() == 3 && parts[2].len() == 4 {
            return Some("%d.%m.%Y");
        }
    }

    if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        return Some("%Y%m%d");
    }

    None
}

/// Convert a date to days since 1970-01-01
#[must_use]
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Convert a spreadsheet serial date (days since 1899-12-30) to a date
#[must_use]
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > 2_958_465.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_days(chrono::Days::new(serial.floor() as u64))
}
