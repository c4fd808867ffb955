// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the third-party weather service used as the temperature
//! fallback (`GET /data/2.5/weather?lat=&lon=&units=metric&appid=`).

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::WeatherSource;
use super::http::{build_client, normalize_base_url, read_body};
use crate::error::{ParseError, ProtocolError};
use crate::types::Coordinates;

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    main: MainReadings,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

/// HTTP client for the weather service.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: String,
    app_id: Option<String>,
    client: Client,
}

impl WeatherClient {
    /// Public weather service endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openweathermap.org";

    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is empty or the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProtocolError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            app_id: None,
            client: build_client(None)?,
        })
    }

    /// Sets the application key sent as `appid`.
    #[must_use]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Sets a transport-level timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be rebuilt.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Result<Self, ProtocolError> {
        self.client = build_client(Some(timeout))?;
        Ok(self)
    }

    fn build_url(&self, coordinates: Coordinates) -> String {
        let url = format!(
            "{}/data/2.5/weather?lat={}&lon={}&units=metric",
            self.base_url,
            coordinates.latitude(),
            coordinates.longitude()
        );
        match &self.app_id {
            Some(app_id) => format!("{url}&appid={}", urlencoding::encode(app_id)),
            None => url,
        }
    }
}

impl WeatherSource for WeatherClient {
    async fn current_temperature(&self, coordinates: Coordinates) -> Result<f64, ProtocolError> {
        let url = self.build_url(coordinates);
        // The app id is a secret; log the coordinates only
        tracing::debug!(%coordinates, "Requesting fallback weather");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let body = read_body(response).await?;

        let weather: WeatherResponse = serde_json::from_str(&body).map_err(ParseError::Json)?;
        Ok(weather.main.temp)
    }
}
