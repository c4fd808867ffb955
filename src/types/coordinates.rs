// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geographic coordinates of the house.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A validated latitude/longitude pair in decimal degrees.
///
/// # Examples
///
/// ```
/// use smarthome_readings::types::Coordinates;
///
/// let porto = Coordinates::new(41.1579, -8.6291).unwrap();
/// assert_eq!(porto.latitude(), 41.1579);
///
/// assert!(Coordinates::new(91.0, 0.0).is_err());
/// assert!(Coordinates::new(0.0, -181.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidLatitude` if the latitude is outside
    /// [-90, 90] or not finite, and `ValueError::InvalidLongitude` if the
    /// longitude is outside [-180, 180] or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValueError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValueError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValueError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Returns the latitude in decimal degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in decimal degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_bounds_accepted() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn latitude_out_of_range() {
        assert_eq!(
            Coordinates::new(90.5, 0.0),
            Err(ValueError::InvalidLatitude(90.5))
        );
    }

    #[test]
    fn longitude_out_of_range() {
        assert_eq!(
            Coordinates::new(0.0, 200.0),
            Err(ValueError::InvalidLongitude(200.0))
        );
    }

    #[test]
    fn non_finite_rejected() {
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn display_joins_with_colon() {
        let coords = Coordinates::new(41.5, -8.25).unwrap();
        assert_eq!(coords.to_string(), "41.5:-8.25");
    }
}
