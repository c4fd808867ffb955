// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Smart-home environmental readings with deadline-bounded fallbacks.
//!
//! This library fetches the outdoor temperature and today's sunrise/sunset
//! times for a house. Each reading first asks a purpose-built measurement
//! service under a wall-clock budget, and degrades to a fallback tier when
//! that service times out, fails, or answers `NaN`:
//!
//! | Metric        | Primary budget | Fallback                              |
//! |---------------|----------------|---------------------------------------|
//! | Temperature   | 2 s            | third-party weather service           |
//! | Sunrise       | 3 s (shared)   | backend's cached `SunriseSensor` log  |
//! | Sunset        | what is left   | backend's cached `SunsetSensor` log   |
//!
//! Failures never reach the caller as errors: an exhausted sequence renders
//! as `"N/A"` (temperature) or `"Invalid time"` (sun times).
//!
//! [`BackendClient`] also exposes the rest of the house: rooms, devices,
//! sensors, actuators, reading logs and actuator commands.
//!
//! # Quick Start
//!
//! ```no_run
//! use smarthome_readings::ReadingsConfig;
//!
//! #[tokio::main]
//! async fn main() -> smarthome_readings::Result<()> {
//!     let config = ReadingsConfig::new("http://measurements.local", "http://localhost:8080")
//!         .with_weather_app_id("my-key");
//!
//!     let house = config.backend_client()?.house().await?;
//!     let coordinates = house.coordinates()?;
//!     let sequencer = config.into_sequencer()?;
//!
//!     let temperature = sequencer.temperature(coordinates).await;
//!     println!("{} (from {:?})", temperature.label(), temperature.source());
//!
//!     let sun = sequencer.sun_times(coordinates).await;
//!     println!("sunrise {} sunset {}", sun.sunrise.label(), sun.sunset.label());
//!     Ok(())
//! }
//! ```
//!
//! ## Periodic refresh
//!
//! [`RefreshHandle`] keeps the labels of a dashboard view current and stops
//! when the view drops it:
//!
//! ```no_run
//! use std::sync::Arc;
//! use smarthome_readings::{ReadingsConfig, RefreshHandle};
//! use smarthome_readings::types::Coordinates;
//!
//! # async fn example() -> smarthome_readings::Result<()> {
//! let config = ReadingsConfig::from_env()?;
//! let interval = config.refresh_interval();
//! let sequencer = Arc::new(config.into_sequencer()?);
//!
//! let handle = RefreshHandle::spawn(sequencer, Coordinates::new(41.15, -8.61)?, interval);
//! println!("{}", handle.current().temperature);
//! handle.stop().await;
//! # Ok(())
//! # }
//! ```

mod config;
pub mod deadline;
pub mod error;
pub mod format;
pub mod protocol;
pub mod refresh;
pub mod sequencer;
pub mod types;

pub use config::ReadingsConfig;
pub use deadline::DeadlineBudget;
pub use error::{Error, ParseError, ProtocolError, Result, ValueError};
pub use format::ReadingLabel;
pub use protocol::{
    Actuator, ActuatorType, BackendClient, Device, House, Log, NewActuator, NewDevice, NewSensor,
    PrimaryClient, PrimaryQuery, PrimarySource, Room, Sensor, SensorType, SunReadingSource,
    WeatherClient, WeatherSource, fetch_primary,
};
pub use refresh::{DashboardReadings, RefreshHandle};
pub use sequencer::{FallbackPacing, FallbackSequencer, HttpSequencer};
pub use types::{
    Coordinates, FetchOutcome, FetchRequest, Hour, Measurement, MetricKind, Reading, Source,
    SunTime, SunTimes,
};
