// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration of the reading services and their budgets.

use std::time::Duration;

use crate::error::ProtocolError;
use crate::protocol::{BackendClient, PrimaryClient, WeatherClient};
use crate::sequencer::{FallbackPacing, FallbackSequencer, HttpSequencer};

/// Connection and timing configuration for the readings.
///
/// # Examples
///
/// ```
/// use smarthome_readings::ReadingsConfig;
/// use std::time::Duration;
///
/// let config = ReadingsConfig::new("http://measurements.local", "http://localhost:8080")
///     .with_weather_app_id("secret")
///     .with_temperature_budget(Duration::from_millis(1500));
///
/// assert_eq!(config.group_number(), 4);
/// assert_eq!(config.sun_budget(), Duration::from_millis(3000));
/// ```
#[derive(Debug, Clone)]
pub struct ReadingsConfig {
    primary_url: String,
    backend_url: String,
    weather_url: String,
    weather_app_id: Option<String>,
    group_number: u32,
    temperature_budget: Duration,
    sun_budget: Duration,
    pacing: FallbackPacing,
    refresh_interval: Duration,
    http_timeout: Option<Duration>,
}

impl ReadingsConfig {
    /// Default budget of the temperature sequence.
    pub const DEFAULT_TEMPERATURE_BUDGET: Duration = Duration::from_millis(2000);
    /// Default budget shared by the sunrise and sunset sequence.
    pub const DEFAULT_SUN_BUDGET: Duration = Duration::from_millis(3000);
    /// Default interval between temperature refreshes.
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

    /// Environment variable overriding the primary service URL.
    pub const ENV_PRIMARY_URL: &'static str = "SMARTHOME_PRIMARY_API_URL";
    /// Environment variable overriding the backend URL.
    pub const ENV_BACKEND_URL: &'static str = "SMARTHOME_BACKEND_API_URL";
    /// Environment variable overriding the weather service URL.
    pub const ENV_WEATHER_URL: &'static str = "SMARTHOME_WEATHER_API_URL";
    /// Environment variable holding the weather service key.
    pub const ENV_WEATHER_APP_ID: &'static str = "SMARTHOME_WEATHER_APP_ID";

    /// Creates a configuration for the given primary service and backend.
    #[must_use]
    pub fn new(primary_url: impl Into<String>, backend_url: impl Into<String>) -> Self {
        Self {
            primary_url: primary_url.into(),
            backend_url: backend_url.into(),
            weather_url: WeatherClient::DEFAULT_BASE_URL.to_string(),
            weather_app_id: None,
            group_number: PrimaryClient::DEFAULT_GROUP_NUMBER,
            temperature_budget: Self::DEFAULT_TEMPERATURE_BUDGET,
            sun_budget: Self::DEFAULT_SUN_BUDGET,
            pacing: FallbackPacing::default(),
            refresh_interval: Self::DEFAULT_REFRESH_INTERVAL,
            http_timeout: None,
        }
    }

    /// Creates a configuration from environment variables.
    ///
    /// The primary and backend URLs are required; the weather URL falls back
    /// to [`WeatherClient::DEFAULT_BASE_URL`].
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` naming the missing variable.
    pub fn from_env() -> Result<Self, ProtocolError> {
        let required = |name: &str| {
            std::env::var(name)
                .map_err(|_| ProtocolError::InvalidAddress(format!("{name} is not set")))
        };

        let mut config = Self::new(
            required(Self::ENV_PRIMARY_URL)?,
            required(Self::ENV_BACKEND_URL)?,
        );
        if let Ok(url) = std::env::var(Self::ENV_WEATHER_URL) {
            config = config.with_weather_url(url);
        }
        if let Ok(app_id) = std::env::var(Self::ENV_WEATHER_APP_ID) {
            config = config.with_weather_app_id(app_id);
        }
        Ok(config)
    }

    /// Sets the weather service URL.
    #[must_use]
    pub fn with_weather_url(mut self, url: impl Into<String>) -> Self {
        self.weather_url = url.into();
        self
    }

    /// Sets the weather service key.
    #[must_use]
    pub fn with_weather_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.weather_app_id = Some(app_id.into());
        self
    }

    /// Sets the station group number sent to the primary service.
    #[must_use]
    pub fn with_group_number(mut self, group_number: u32) -> Self {
        self.group_number = group_number;
        self
    }

    /// Sets the temperature sequence budget.
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

    /// Sets how the temperature fallback is paced.
    #[must_use]
    pub fn with_pacing(mut self, pacing: FallbackPacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Sets the interval between temperature refreshes.
    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Sets a transport-level timeout on every client.
    ///
    /// Unset by default: the fallback tiers run to completion or failure.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Returns the primary service URL.
    #[must_use]
    pub fn primary_url(&self) -> &str {
        &self.primary_url
    }

    /// Returns the backend URL.
    #[must_use]
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Returns the weather service URL.
    #[must_use]
    pub fn weather_url(&self) -> &str {
        &self.weather_url
    }

    /// Returns the weather service key, if set.
    #[must_use]
    pub fn weather_app_id(&self) -> Option<&str> {
        self.weather_app_id.as_deref()
    }

    /// Returns the station group number.
    #[must_use]
    pub fn group_number(&self) -> u32 {
        self.group_number
    }

    /// Returns the temperature sequence budget.
    #[must_use]
    pub fn temperature_budget(&self) -> Duration {
        self.temperature_budget
    }

    /// Returns the sunrise/sunset budget.
    #[must_use]
    pub fn sun_budget(&self) -> Duration {
        self.sun_budget
    }

    /// Returns the temperature fallback pacing.
    #[must_use]
    pub fn pacing(&self) -> FallbackPacing {
        self.pacing
    }

    /// Returns the temperature refresh interval.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Returns the transport-level timeout, if set.
    #[must_use]
    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout
    }

    /// Creates the backend client alone, e.g. to look up the house.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the client cannot be created.
    pub fn backend_client(&self) -> Result<BackendClient, ProtocolError> {
        let client = BackendClient::new(self.backend_url.clone())?;
        match self.http_timeout {
            Some(timeout) => client.with_http_timeout(timeout),
            None => Ok(client),
        }
    }

    /// Creates a sequencer over the HTTP clients described by this
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a URL is invalid or a client cannot be created.
    pub fn into_sequencer(self) -> Result<HttpSequencer, ProtocolError> {
        let backend = self.backend_client()?;

        let mut primary =
            PrimaryClient::new(self.primary_url)?.with_group_number(self.group_number);
        let mut weather = WeatherClient::new(self.weather_url)?;
        if let Some(app_id) = self.weather_app_id {
            weather = weather.with_app_id(app_id);
        }
        if let Some(timeout) = self.http_timeout {
            primary = primary.with_http_timeout(timeout)?;
            weather = weather.with_http_timeout(timeout)?;
        }

        Ok(FallbackSequencer::new(primary, backend, weather)
            .with_temperature_budget(self.temperature_budget)
            .with_sun_budget(self.sun_budget)
            .with_pacing(self.pacing))
    }
}
