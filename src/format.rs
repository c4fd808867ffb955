// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display formatting for readings.
//!
//! The dashboard shows one of four kinds of text per field: a loading
//! placeholder, a formatted value, or one of the sentinels [`NOT_AVAILABLE`]
//! and [`INVALID_TIME`]. Sentinels are display values, not errors.
//!
//! # Examples
//!
//! ```
//! use smarthome_readings::format;
//!
//! assert_eq!(format::format_temperature(23.456), "23.46");
//! assert_eq!(format::format_decimal_hours(6.5), "6h30m");
//! assert_eq!(format::format_timestamp("2024-05-01T06:07:00Z"), "06h07m");
//! assert_eq!(format::format_timestamp("06:07"), format::INVALID_TIME);
//! ```

use std::fmt;

/// Shown when every tier of a sequence failed.
pub const NOT_AVAILABLE: &str = "N/A";

/// Shown when the backend's cached sun reading cannot be parsed.
pub const INVALID_TIME: &str = "Invalid time";

/// Shown while a reading is still being fetched.
pub const LOADING: &str = "Loading...";

/// Formats a temperature with two decimal places.
#[must_use]
pub fn format_temperature(value: f64) -> String {
    format!("{value:.2}")
}

/// Formats a temperature as the dashboard shows it, e.g. `"18.20 °C"`.
#[must_use]
pub fn temperature_label(value: f64) -> String {
    format!("{} °C", format_temperature(value))
}

/// Formats a decimal hour value as `<hours>h<MM>m`.
///
/// The whole part gives the hours; the fraction is converted to minutes and
/// rounded. A fraction that rounds up to 60 minutes carries into the hour.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_decimal_hours(time: f64) -> String {
    let mut hours = time.floor() as i64;
    let mut minutes = ((time - time.floor()) * 60.0).round() as i64;
    if minutes >= 60 {
        hours += 1;
        minutes -= 60;
    }
    format!("{hours}h{minutes:02}m")
}

/// Extracts the two-digit hour and minute fields following the `T` of an
/// ISO 8601 timestamp.
///
/// Offsets and zone suffixes after the minutes are ignored, so both
/// `2024-05-01T06:07:00Z` and `2024-05-01T06:07+01:00[Europe/Lisbon]` yield
/// `("06", "07")`.
#[must_use]
pub fn parse_clock_time(timestamp: &str) -> Option<(String, String)> {
    let (_, time) = timestamp.trim().split_once('T')?;
    let mut fields = time.split(':');
    let hours = fields.next()?;
    let minutes = fields.next()?.get(..2)?;

    if !is_two_digits(hours) || !is_two_digits(minutes) {
        return None;
    }
    if hours > "23" || minutes > "59" {
        return None;
    }
    Some((hours.to_string(), minutes.to_string()))
}

/// Formats the time of an ISO 8601 timestamp as `<HH>h<MM>m`, or
/// [`INVALID_TIME`] if it cannot be parsed.
#[must_use]
pub fn format_timestamp(timestamp: &str) -> String {
    match parse_clock_time(timestamp) {
        Some((hours, minutes)) => format!("{hours}h{minutes}m"),
        None => INVALID_TIME.to_string(),
    }
}

fn is_two_digits(s: &str) -> bool {
    s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit())
}

/// Text of one dashboard field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadingLabel {
    /// The reading has not resolved yet.
    #[default]
    Loading,
    /// The reading resolved to this text (a value or a sentinel).
    Ready(String),
}

impl ReadingLabel {
    /// Returns the label for an exhausted sequence.
    #[must_use]
    pub fn not_available() -> Self {
        Self::Ready(NOT_AVAILABLE.to_string())
    }

    /// Returns true while the reading is still loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns the text to display.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Loading => LOADING,
            Self::Ready(text) => text,
        }
    }
}

impl fmt::Display for ReadingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_two_decimals() {
        assert_eq!(format_temperature(23.456), "23.46");
        assert_eq!(format_temperature(18.2), "18.20");
        assert_eq!(format_temperature(-3.0), "-3.00");
    }

    #[test]
    fn temperature_label_has_unit() {
        assert_eq!(temperature_label(18.2), "18.20 °C");
    }

    #[test]
    fn decimal_hours_half() {
        assert_eq!(format_decimal_hours(6.5), "6h30m");
    }

    #[test]
    fn decimal_hours_pads_minutes() {
        assert_eq!(format_decimal_hours(6.083), "6h05m");
        assert_eq!(format_decimal_hours(20.0), "20h00m");
    }

    #[test]
    fn decimal_hours_rounding_carries() {
        assert_eq!(format_decimal_hours(6.999), "7h00m");
    }

    #[test]
    fn timestamp_utc() {
        assert_eq!(format_timestamp("2024-05-01T06:07:00Z"), "06h07m");
    }

    #[test]
    fn timestamp_zoned() {
        assert_eq!(
            format_timestamp("2024-05-01T20:41:12.5+01:00[Europe/Lisbon]"),
            "20h41m"
        );
        assert_eq!(
            format_timestamp("2024-05-01T06:07+01:00[Europe/Lisbon]"),
            "06h07m"
        );
    }

    #[test]
    fn timestamp_missing_t_is_invalid() {
        assert_eq!(format_timestamp("2024-05-01 06:07:00"), INVALID_TIME);
        assert_eq!(format_timestamp("Error"), INVALID_TIME);
        assert_eq!(format_timestamp(""), INVALID_TIME);
    }

    #[test]
    fn timestamp_bad_fields_are_invalid() {
        assert_eq!(format_timestamp("2024-05-01T0607"), INVALID_TIME);
        assert_eq!(format_timestamp("2024-05-01Tab:cd"), INVALID_TIME);
        assert_eq!(format_timestamp("2024-05-01T25:00"), INVALID_TIME);
        assert_eq!(format_timestamp("2024-05-01T06:7"), INVALID_TIME);
    }

    #[test]
    fn label_rendering() {
        assert_eq!(ReadingLabel::Loading.to_string(), "Loading...");
        assert_eq!(ReadingLabel::not_available().to_string(), "N/A");
        assert_eq!(ReadingLabel::Ready("6h30m".into()).as_str(), "6h30m");
        assert!(ReadingLabel::default().is_loading());
    }
}
