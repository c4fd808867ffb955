// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Metric kinds and the hour selector of the temperature service.

use std::fmt;

use chrono::Timelike;
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// An environmental metric the dashboard displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Time of sunrise today.
    Sunrise,
    /// Time of sunset today.
    Sunset,
    /// Current outdoor temperature.
    Temperature,
}

impl MetricKind {
    /// Returns the `option` selector the primary service expects for sun
    /// times, or `None` for temperature (which is selected by hour).
    #[must_use]
    pub const fn sun_option(self) -> Option<&'static str> {
        match self {
            Self::Sunrise => Some("sunrise"),
            Self::Sunset => Some("sunset"),
            Self::Temperature => None,
        }
    }

    /// Returns the backend sensor type id holding cached readings of this
    /// metric, if the backend keeps any.
    #[must_use]
    pub const fn sensor_type_id(self) -> Option<&'static str> {
        match self {
            Self::Sunrise => Some("SunriseSensor"),
            Self::Sunset => Some("SunsetSensor"),
            Self::Temperature => None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sunrise => "sunrise",
            Self::Sunset => "sunset",
            Self::Temperature => "temperature",
        };
        f.write_str(name)
    }
}

/// Hour of the day (0-23) used to select an instantaneous temperature.
///
/// # Examples
///
/// ```
/// use smarthome_readings::types::Hour;
///
/// let hour = Hour::new(14).unwrap();
/// assert_eq!(hour.value(), 14);
/// assert!(Hour::new(24).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hour(u8);

impl Hour {
    /// Creates an hour value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHour` if `value` exceeds 23.
    pub fn new(value: u32) -> Result<Self, ValueError> {
        u8::try_from(value)
            .ok()
            .filter(|h| *h < 24)
            .map(Self)
            .ok_or(ValueError::InvalidHour(value))
    }

    /// Returns the current local hour.
    #[must_use]
    pub fn now() -> Self {
        let hour = chrono::Local::now().hour();
        // chrono guarantees 0..=23
        Self(u8::try_from(hour).unwrap_or(0))
    }

    /// Returns the hour value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
