// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Service clients and the cancellable primary request.
//!
//! Each data source sits behind a trait so the sequencers do not depend on a
//! particular HTTP client:
//!
//! - [`PrimarySource`]: the purpose-built measurement service ([`PrimaryClient`])
//! - [`SunReadingSource`]: cached sun readings kept by the backend ([`BackendClient`])
//! - [`WeatherSource`]: third-party current weather ([`WeatherClient`])
//!
//! # Cancellation
//!
//! A primary request receives an explicit [`CancellationToken`]. The request
//! must resolve to [`ProtocolError::Cancelled`] promptly once the token is
//! cancelled and must not issue a request if it already is. [`fetch_primary`]
//! arms the token with a deadline.

mod backend;
mod http;
mod primary;
mod resources;
mod weather;

pub use backend::BackendClient;
pub use resources::{
    Actuator, ActuatorType, Device, House, Log, NewActuator, NewDevice, NewSensor, Room, Sensor,
    SensorType,
};
pub use primary::PrimaryClient;
pub use weather::WeatherClient;

use std::future::Future;
use std::time::Duration;

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::error::ProtocolError;
use crate::types::{Coordinates, Hour, Measurement, MetricKind};

/// A request to the primary measurement service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimaryQuery {
    /// Instantaneous temperature at a given hour.
    Temperature {
        /// Location of the reading.
        coordinates: Coordinates,
        /// Hour of the day to read.
        hour: Hour,
    },
    /// Today's sunrise time in decimal hours.
    Sunrise {
        /// Location of the reading.
        coordinates: Coordinates,
    },
    /// Today's sunset time in decimal hours.
    Sunset {
        /// Location of the reading.
        coordinates: Coordinates,
    },
}

impl PrimaryQuery {
    /// Returns the query for a sun event, or `None` for temperature.
    #[must_use]
    pub const fn sun_time(kind: MetricKind, coordinates: Coordinates) -> Option<Self> {
        match kind {
            MetricKind::Sunrise => Some(Self::Sunrise { coordinates }),
            MetricKind::Sunset => Some(Self::Sunset { coordinates }),
            MetricKind::Temperature => None,
        }
    }

    /// Returns the metric this query reads.
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Temperature { .. } => MetricKind::Temperature,
            Self::Sunrise { .. } => MetricKind::Sunrise,
            Self::Sunset { .. } => MetricKind::Sunset,
        }
    }

    /// Returns the location of the reading.
    #[must_use]
    pub const fn coordinates(&self) -> Coordinates {
        match self {
            Self::Temperature { coordinates, .. }
            | Self::Sunrise { coordinates }
            | Self::Sunset { coordinates } => *coordinates,
        }
    }

    /// Returns the endpoint path of the query.
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Temperature { .. } => "InstantaneousTemperature",
            Self::Sunrise { .. } | Self::Sunset { .. } => "SunriseOrSunsetTime",
        }
    }
}

/// A source of primary measurements.
pub trait PrimarySource {
    /// Reads one measurement.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Cancelled` once `cancel` fires, or any
    /// transport or decoding error.
    fn measurement(
        &self,
        query: &PrimaryQuery,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Measurement, ProtocolError>> + Send;
}

/// A source of cached sunrise/sunset readings.
pub trait SunReadingSource {
    /// Returns the ISO 8601 timestamp of the sun event on `date`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the reading cannot be fetched.
    fn sun_reading(
        &self,
        kind: MetricKind,
        coordinates: Coordinates,
        date: NaiveDate,
    ) -> impl Future<Output = Result<String, ProtocolError>> + Send;
}

/// A source of current outdoor temperature.
pub trait WeatherSource {
    /// Returns the current temperature in degrees Celsius.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError` if the reading cannot be fetched.
    fn current_temperature(
        &self,
        coordinates: Coordinates,
    ) -> impl Future<Output = Result<f64, ProtocolError>> + Send;
}

/// Reads a primary measurement within `timeout`.
///
/// The request and its deadline run on the calling task. When the deadline
/// elapses the request's token is cancelled and the request is awaited until
/// it observes the cancellation. A zero timeout cancels the token up front,
/// so no request is issued.
///
/// Resolves to `None` on timeout, on any error and on the `NaN` sentinel;
/// none of these are surfaced to the caller.
pub async fn fetch_primary<P>(source: &P, query: &PrimaryQuery, timeout: Duration) -> Option<f64>
where
    P: PrimarySource + ?Sized,
{
    let cancel = CancellationToken::new();
    if timeout.is_zero() {
        cancel.cancel();
    }

    let request = source.measurement(query, &cancel);
    tokio::pin!(request);

    let deadline = async {
        tokio::time::sleep(timeout).await;
        cancel.cancel();
    };

    let result = tokio::select! {
        biased;
        result = &mut request => result,
        () = deadline => request.await,
    };

    let kind = query.kind();
    match result {
        Ok(measurement) => {
            let value = measurement.value();
            if value.is_none() {
                tracing::debug!(%kind, "Primary service reported NaN");
            }
            value
        }
        Err(ProtocolError::Cancelled) => {
            tracing::debug!(
                %kind,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "Primary request abandoned at deadline"
            );
            None
        }
        Err(e) => {
            tracing::debug!(%kind, error = %e, "Primary request failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers after `delay` unless cancelled first.
    struct SlowPrimary {
        delay: Duration,
        answer: Measurement,
        issued: AtomicUsize,
    }

    impl SlowPrimary {
        fn new(delay: Duration, answer: Measurement) -> Self {
            Self {
                delay,
                answer,
                issued: AtomicUsize::new(0),
            }
        }
    }

    impl PrimarySource for SlowPrimary {
        async fn measurement(
            &self,
            _query: &PrimaryQuery,
            cancel: &CancellationToken,
        ) -> Result<Measurement, ProtocolError> {
            if cancel.is_cancelled() {
                return Err(ProtocolError::Cancelled);
            }
            self.issued.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                biased;
                () = cancel.cancelled() => Err(ProtocolError::Cancelled),
                () = tokio::time::sleep(self.delay) => Ok(self.answer),
            }
        }
    }

    fn query() -> PrimaryQuery {
        PrimaryQuery::Sunrise {
            coordinates: Coordinates::new(41.5, -8.25).unwrap(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn answer_within_deadline() {
        let source = SlowPrimary::new(Duration::from_millis(100), Measurement::Value(6.5));
        let value = fetch_primary(&source, &query(), Duration::from_millis(3000)).await;
        assert_eq!(value, Some(6.5));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_cancels_request() {
        let source = SlowPrimary::new(Duration::from_millis(5000), Measurement::Value(6.5));
        let start = tokio::time::Instant::now();

        let value = fetch_primary(&source, &query(), Duration::from_millis(2000)).await;

        assert_eq!(value, None);
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_issues_nothing() {
        let source = SlowPrimary::new(Duration::ZERO, Measurement::Value(6.5));
        let start = tokio::time::Instant::now();

        let value = fetch_primary(&source, &query(), Duration::ZERO).await;

        assert_eq!(value, None);
        assert_eq!(source.issued.load(Ordering::SeqCst), 0);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn nan_resolves_to_none() {
        let source = SlowPrimary::new(Duration::from_millis(10), Measurement::NotANumber);
        let value = fetch_primary(&source, &query(), Duration::from_millis(3000)).await;
        assert_eq!(value, None);
    }

    #[test]
    fn sun_time_queries() {
        let coordinates = Coordinates::new(0.0, 0.0).unwrap();
        assert_eq!(
            PrimaryQuery::sun_time(MetricKind::Sunset, coordinates).map(|q| q.kind()),
            Some(MetricKind::Sunset)
        );
        assert!(PrimaryQuery::sun_time(MetricKind::Temperature, coordinates).is_none());
    }
}
