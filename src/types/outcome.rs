// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Requests and outcomes of one fallback sequence.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Coordinates, MetricKind};
use crate::format;

/// One request for a reading, created per invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    /// The metric to fetch.
    pub kind: MetricKind,
    /// Where to fetch it for.
    pub coordinates: Coordinates,
    /// Wall-clock budget for the primary tier.
    pub deadline: Duration,
}

impl FetchRequest {
    /// Creates a request.
    #[must_use]
    pub const fn new(kind: MetricKind, coordinates: Coordinates, deadline: Duration) -> Self {
        Self {
            kind,
            coordinates,
            deadline,
        }
    }
}

/// The tier that produced a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// The purpose-built measurement service.
    Primary,
    /// The backend's cached sensor reading.
    BackendFallback,
    /// The third-party weather service.
    ExternalFallback,
    /// No tier produced a usable value.
    None,
}

/// The result of one sequence: a value, if any, and where it came from.
///
/// An outcome is produced exactly once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome<T> {
    value: Option<T>,
    source: Source,
}

impl<T> FetchOutcome<T> {
    /// Creates an outcome carrying a value from `source`.
    #[must_use]
    pub const fn from_source(value: T, source: Source) -> Self {
        Self {
            value: Some(value),
            source,
        }
    }

    /// Creates the outcome of an exhausted sequence.
    #[must_use]
    pub const fn exhausted() -> Self {
        Self {
            value: None,
            source: Source::None,
        }
    }

    /// Returns the value, if any tier produced one.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns the tier that produced the value.
    #[must_use]
    pub const fn source(&self) -> Source {
        self.source
    }

    /// Returns true if a tier produced a value.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.value.is_some()
    }

    /// Converts the value, keeping the source.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        FetchOutcome {
            value: self.value.map(f),
            source: self.source,
        }
    }
}

impl FetchOutcome<f64> {
    /// Returns the dashboard text: `"<value> °C"` or `"N/A"`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.value {
            Some(value) => format::temperature_label(value),
            None => format::NOT_AVAILABLE.to_string(),
        }
    }
}

impl FetchOutcome<SunTime> {
    /// Returns the dashboard text: `"<H>h<MM>m"` or `"Invalid time"`.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.value {
            Some(time) => time.to_string(),
            None => format::INVALID_TIME.to_string(),
        }
    }
}

impl FetchOutcome<Reading> {
    /// Returns the dashboard text for whichever metric this is.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.value {
            Some(reading) => reading.to_string(),
            None => format::NOT_AVAILABLE.to_string(),
        }
    }
}

/// A measurement decoded from the primary service.
///
/// The primary service reports an unavailable value as the literal text
/// `NaN`, which is kept distinct from a legitimate `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// A numeric reading.
    Value(f64),
    /// The service answered `NaN`.
    NotANumber,
}

impl Measurement {
    /// Returns the numeric reading, treating `NaN` as absent.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) if v.is_finite() => Some(v),
            Self::Value(_) | Self::NotANumber => None,
        }
    }
}

/// A sunrise or sunset time.
#[derive(Debug, Clone, PartialEq)]
pub enum SunTime {
    /// Decimal hours from the primary service, e.g. `6.5` for 06:30.
    Decimal(f64),
    /// Hour and minute fields taken from a backend timestamp.
    Clock {
        /// Two-digit hours.
        hours: String,
        /// Two-digit minutes.
        minutes: String,
    },
}

impl SunTime {
    /// Parses the time of day out of an ISO 8601 timestamp.
    #[must_use]
    pub fn from_timestamp(timestamp: &str) -> Option<Self> {
        format::parse_clock_time(timestamp).map(|(hours, minutes)| Self::Clock { hours, minutes })
    }
}

impl fmt::Display for SunTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decimal(time) => f.write_str(&format::format_decimal_hours(*time)),
            Self::Clock { hours, minutes } => write!(f, "{hours}h{minutes}m"),
        }
    }
}

/// Sunrise and sunset outcomes of one sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SunTimes {
    /// Today's sunrise.
    pub sunrise: FetchOutcome<SunTime>,
    /// Today's sunset.
    pub sunset: FetchOutcome<SunTime>,
}

/// A reading of any metric.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    /// Degrees Celsius.
    Temperature(f64),
    /// A sunrise or sunset time.
    SunTime(SunTime),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature(value) => f.write_str(&format::temperature_label(*value)),
            Self::SunTime(time) => write!(f, "{time}"),
        }
    }
}
