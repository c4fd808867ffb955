// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for environmental readings.
//!
//! # Types
//!
//! - [`Coordinates`] - Validated latitude/longitude
//! - [`MetricKind`] - Sunrise, sunset or temperature
//! - [`Hour`] - Hour of the day (0-23) for the temperature service
//! - [`FetchRequest`] / [`FetchOutcome`] - One invocation and its result
//! - [`Source`] - The tier that produced a value
//! - [`Measurement`] - A primary-service value or its `NaN` sentinel
//! - [`SunTime`] - Decimal-hour or clock-field sun time

mod coordinates;
mod metric;
mod outcome;

pub use coordinates::Coordinates;
pub use metric::{Hour, MetricKind};
pub use outcome::{FetchOutcome, FetchRequest, Measurement, Reading, Source, SunTime, SunTimes};
