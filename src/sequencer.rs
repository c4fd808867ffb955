// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primary/fallback sequences for temperature and sun times.
//!
//! # Temperature
//!
//! 1. Start the temperature budget and ask the primary service for the
//!    current hour with the full budget as timeout.
//! 2. On a value, stop ([`Source::Primary`]).
//! 3. Otherwise, with [`FallbackPacing::WaitOutBudget`], wait out what is
//!    left of the budget, then ask the weather service
//!    ([`Source::ExternalFallback`]).
//! 4. Otherwise the outcome is exhausted ([`Source::None`]).
//!
//! # Sunrise and sunset
//!
//! Both share one budget and run strictly in order. Each asks the primary
//! service with whatever is left of the budget and falls back to the
//! backend's cached reading for today ([`Source::BackendFallback`]). Sunset
//! therefore gets `total - elapsed` after the whole sunrise step, and a
//! primary call with nothing left is not issued at all.
//!
//! Fallback tiers have no deadline of their own. No state is shared between
//! invocations, so sequences for different metrics may run concurrently.

use std::time::Duration;

use chrono::NaiveDate;

use crate::deadline::DeadlineBudget;
use crate::protocol::{
    BackendClient, PrimaryClient, PrimaryQuery, PrimarySource, SunReadingSource, WeatherClient,
    WeatherSource, fetch_primary,
};
use crate::types::{
    Coordinates, FetchOutcome, FetchRequest, Hour, MetricKind, Reading, Source, SunTime, SunTimes,
};

/// What the temperature sequence does between a failed primary call and
/// the weather fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPacing {
    /// Wait until the whole budget has elapsed, even after a fast failure.
    #[default]
    WaitOutBudget,
    /// Call the fallback as soon as the primary call fails.
    Immediate,
}

/// Sequencer over the HTTP service clients.
pub type HttpSequencer = FallbackSequencer<PrimaryClient, BackendClient, WeatherClient>;

/// Runs primary/fallback sequences against three sources.
///
/// # Examples
///
/// ```no_run
/// use smarthome_readings::ReadingsConfig;
/// use smarthome_readings::types::Coordinates;
///
/// # async fn example() -> smarthome_readings::Result<()> {
/// let sequencer = ReadingsConfig::new("http://measurements.local", "http://localhost:8080")
///     .into_sequencer()?;
/// let coordinates = Coordinates::new(41.15, -8.61)?;
///
/// let temperature = sequencer.temperature(coordinates).await;
/// println!("{}", temperature.label());
///
/// let sun = sequencer.sun_times(coordinates).await;
/// println!("{} / {}", sun.sunrise.label(), sun.sunset.label());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FallbackSequencer<P, B, W> {
    primary: P,
    backend: B,
    weather: W,
    temperature_budget: Duration,
    sun_budget: Duration,
    pacing: FallbackPacing,
}

impl<P, B, W> FallbackSequencer<P, B, W>
where
    P: PrimarySource,
    B: SunReadingSource,
    W: WeatherSource,
{
    /// Creates a sequencer with the default budgets (2 s for temperature,
    /// 3 s for sun times) and [`FallbackPacing::WaitOutBudget`].
    #[must_use]
    pub fn new(primary: P, backend: B, weather: W) -> Self {
        Self {
            primary,
            backend,
            weather,
            temperature_budget: Duration::from_millis(2000),
            sun_budget: Duration::from_millis(3000),
            pacing: FallbackPacing::default(),
        }
    }

    /// Sets the temperature budget.
    #[must_use]
    pub fn with_temperature_budget(mut self, budget: Duration) -> Self {
        self.temperature_budget = budget;
        self
    }

    /// Sets the budget shared by sunrise and sunset.
    #[must_use]
    pub fn with_sun_budget(mut self, budget: Duration) -> Self {
        self.sun_budget = budget;
        self
    }

    /// Sets the temperature fallback pacing.
    #[must_use]
    pub fn with_pacing(mut self, pacing: FallbackPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Returns the temperature budget.
    #[must_use]
    pub fn temperature_budget(&self) -> Duration {
        self.temperature_budget
    }

    /// Returns the sun times budget.
    #[must_use]
    pub fn sun_budget(&self) -> Duration {
        self.sun_budget
    }

    /// Returns the temperature fallback pacing.
    #[must_use]
    pub fn pacing(&self) -> FallbackPacing {
        self.pacing
    }

    /// Fetches the temperature for the current local hour.
    pub async fn temperature(&self, coordinates: Coordinates) -> FetchOutcome<f64> {
        self.temperature_at_hour(coordinates, Hour::now()).await
    }

    /// Fetches the temperature for the given hour.
    pub async fn temperature_at_hour(
        &self,
        coordinates: Coordinates,
        hour: Hour,
    ) -> FetchOutcome<f64> {
        self.run_temperature(coordinates, hour, self.temperature_budget)
            .await
    }

    /// Fetches today's sunrise and sunset.
    ///
    /// The backend fallback is asked for readings logged on the current UTC
    /// date, which is how the backend keys them.
    pub async fn sun_times(&self, coordinates: Coordinates) -> SunTimes {
        self.sun_times_on(coordinates, backend_date()).await
    }

    /// Fetches sunrise and sunset, using backend readings logged on `date`
    /// as fallback.
    pub async fn sun_times_on(&self, coordinates: Coordinates, date: NaiveDate) -> SunTimes {
        let budget = DeadlineBudget::start(self.sun_budget);

        let sunrise = self
            .run_sun_time(MetricKind::Sunrise, coordinates, date, &budget)
            .await;
        tracing::debug!(
            elapsed_ms = u64::try_from(budget.elapsed().as_millis()).unwrap_or(u64::MAX),
            remaining_ms = budget.remaining_ms(),
            "Sunrise resolved"
        );
        let sunset = self
            .run_sun_time(MetricKind::Sunset, coordinates, date, &budget)
            .await;

        SunTimes { sunrise, sunset }
    }

    /// Fetches a single metric with the request's own deadline.
    pub async fn fetch(&self, request: &FetchRequest) -> FetchOutcome<Reading> {
        match request.kind {
            MetricKind::Temperature => self
                .run_temperature(request.coordinates, Hour::now(), request.deadline)
                .await
                .map(Reading::Temperature),
            kind @ (MetricKind::Sunrise | MetricKind::Sunset) => {
                let budget = DeadlineBudget::start(request.deadline);
                self.run_sun_time(kind, request.coordinates, backend_date(), &budget)
                    .await
                    .map(Reading::SunTime)
            }
        }
    }

    async fn run_temperature(
        &self,
        coordinates: Coordinates,
        hour: Hour,
        total: Duration,
    ) -> FetchOutcome<f64> {
        let budget = DeadlineBudget::start(total);
        let query = PrimaryQuery::Temperature { coordinates, hour };

        if let Some(value) = fetch_primary(&self.primary, &query, budget.remaining()).await {
            tracing::debug!(value, "Temperature from primary service");
            return FetchOutcome::from_source(value, Source::Primary);
        }

        if self.pacing == FallbackPacing::WaitOutBudget {
            let remaining = budget.remaining();
            if !remaining.is_zero() {
                tracing::debug!(
                    remaining_ms = budget.remaining_ms(),
                    "Waiting out temperature budget"
                );
                tokio::time::sleep(remaining).await;
            }
        }

        tracing::debug!(%coordinates, "Using fallback weather service");
        match self.weather.current_temperature(coordinates).await {
            Ok(value) if value.is_finite() => {
                tracing::debug!(value, "Temperature from fallback service");
                FetchOutcome::from_source(value, Source::ExternalFallback)
            }
            Ok(value) => {
                tracing::warn!(value, "Fallback weather service returned a non-finite value");
                FetchOutcome::exhausted()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Temperature unavailable from both services");
                FetchOutcome::exhausted()
            }
        }
    }

    async fn run_sun_time(
        &self,
        kind: MetricKind,
        coordinates: Coordinates,
        date: NaiveDate,
        budget: &DeadlineBudget,
    ) -> FetchOutcome<SunTime> {
        if let Some(query) = PrimaryQuery::sun_time(kind, coordinates)
            && let Some(value) = fetch_primary(&self.primary, &query, budget.remaining()).await
        {
            tracing::debug!(%kind, value, "Sun time from primary service");
            return FetchOutcome::from_source(SunTime::Decimal(value), Source::Primary);
        }

        match self.backend.sun_reading(kind, coordinates, date).await {
            Ok(timestamp) => match SunTime::from_timestamp(&timestamp) {
                Some(time) => {
                    tracing::debug!(%kind, timestamp = %timestamp, "Sun time from backend");
                    FetchOutcome::from_source(time, Source::BackendFallback)
                }
                None => {
                    tracing::warn!(%kind, timestamp = %timestamp, "Unparsable backend sun reading");
                    FetchOutcome::exhausted()
                }
            },
            Err(e) => {
                tracing::warn!(%kind, error = %e, "Backend sun reading failed");
                FetchOutcome::exhausted()
            }
        }
    }
}

/// Date under which the backend logs today's sun readings.
fn backend_date() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
