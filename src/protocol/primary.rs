// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the primary measurement service.
//!
//! The service exposes two endpoints, both answering `{"measurement": <x>}`:
//!
//! - `GET /InstantaneousTemperature?groupNumber=&latitude=&longitude=&hour=`
//! - `GET /SunriseOrSunsetTime?groupNumber=&latitude=&longitude=&option=sunrise|sunset`
//!
//! When it has no value it answers with the literal text `NaN`, either as
//! the whole body or in place of the number.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::http::{build_client, normalize_base_url, read_body};
use super::{PrimaryQuery, PrimarySource};
use crate::error::{ParseError, ProtocolError};
use crate::types::Measurement;

/// HTTP client for the primary measurement service.
///
/// # Examples
///
/// ```no_run
/// use smarthome_readings::protocol::{PrimaryClient, PrimaryQuery, fetch_primary};
/// use smarthome_readings::types::{Coordinates, Hour};
/// use std::time::Duration;
///
/// # async fn example() -> smarthome_readings::Result<()> {
/// let client = PrimaryClient::new("http://measurements.local:8080")?;
/// let coordinates = Coordinates::new(41.15, -8.61)?;
/// let query = PrimaryQuery::Temperature { coordinates, hour: Hour::new(14)? };
///
/// let temperature = fetch_primary(&client, &query, Duration::from_secs(2)).await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PrimaryClient {
    base_url: String,
    group_number: u32,
    client: Client,
}

impl PrimaryClient {
    /// Group number identifying the measurement station.
    pub const DEFAULT_GROUP_NUMBER: u32 = 4;

    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is empty or the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProtocolError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            group_number: Self::DEFAULT_GROUP_NUMBER,
            client: build_client(None)?,
        })
    }

    /// Sets the group number sent with every request.
    #[must_use]
    pub fn with_group_number(mut self, group_number: u32) -> Self {
        self.group_number = group_number;
        self
    }

    /// Sets a transport-level timeout on top of the caller's deadline.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be rebuilt.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Result<Self, ProtocolError> {
        self.client = build_client(Some(timeout))?;
        Ok(self)
    }

    /// Returns the base URL of the service.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the group number.
    #[must_use]
    pub fn group_number(&self) -> u32 {
        self.group_number
    }

    /// Builds the request URL for a query.
    fn build_url(&self, query: &PrimaryQuery) -> String {
        let coordinates = query.coordinates();
        let prefix = format!(
            "{}/{}?groupNumber={}&latitude={}&longitude={}",
            self.base_url,
            query.path(),
            self.group_number,
            coordinates.latitude(),
            coordinates.longitude()
        );

        match query {
            PrimaryQuery::Temperature { hour, .. } => format!("{prefix}&hour={hour}"),
            PrimaryQuery::Sunrise { .. } | PrimaryQuery::Sunset { .. } => {
                let option = query.kind().sun_option().unwrap_or_default();
                format!("{prefix}&option={}", urlencoding::encode(option))
            }
        }
    }

    async fn get_measurement(&self, url: &str) -> Result<Measurement, ProtocolError> {
        tracing::debug!(url = %url, "Requesting primary measurement");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let body = read_body(response).await?;

        Ok(decode_measurement(&body)?)
    }
}

impl PrimarySource for PrimaryClient {
    async fn measurement(
        &self,
        query: &PrimaryQuery,
        cancel: &CancellationToken,
    ) -> Result<Measurement, ProtocolError> {
        let url = self.build_url(query);

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(url = %url, "Primary request cancelled");
                Err(ProtocolError::Cancelled)
            }
            result = self.get_measurement(&url) => result,
        }
    }
}

/// Decodes a primary-service body into a [`Measurement`].
pub(crate) fn decode_measurement(body: &str) -> Result<Measurement, ParseError> {
    let trimmed = body.trim();
    if is_nan_text(trimmed) {
        return Ok(Measurement::NotANumber);
    }

    let value: Value = match serde_json::from_str(trimmed) {
        Ok(value) => value,
        // Some serializers emit a bare NaN token, which is not valid JSON
        Err(_) if trimmed.contains("NaN") => return Ok(Measurement::NotANumber),
        Err(e) => return Err(ParseError::Json(e)),
    };

    let measurement = value
        .get("measurement")
        .ok_or_else(|| ParseError::MissingField("measurement".to_string()))?;

    match measurement {
        Value::Number(number) => number.as_f64().map(Measurement::Value).ok_or_else(|| {
            ParseError::InvalidValue {
                field: "measurement".to_string(),
                message: format!("{number} is not representable as f64"),
            }
        }),
        Value::String(text) if is_nan_text(text.trim()) => Ok(Measurement::NotANumber),
        Value::String(text) => {
            text.trim()
                .parse::<f64>()
                .map(Measurement::Value)
                .map_err(|e| ParseError::InvalidValue {
                    field: "measurement".to_string(),
                    message: e.to_string(),
                })
        }
        Value::Null => Ok(Measurement::NotANumber),
        other => Err(ParseError::UnexpectedFormat(format!(
            "measurement is {other}"
        ))),
    }
}

fn is_nan_text(text: &str) -> bool {
    text == "NaN" || text == "\"NaN\""
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinates, Hour};

    fn coordinates() -> Coordinates {
        Coordinates::new(41.5, -8.25).unwrap()
    }

    #[test]
    fn temperature_url() {
        let client = PrimaryClient::new("http://measurements.local").unwrap();
        let query = PrimaryQuery::Temperature {
            coordinates: coordinates(),
            hour: Hour::new(14).unwrap(),
        };
        assert_eq!(
            client.build_url(&query),
            "http://measurements.local/InstantaneousTemperature?groupNumber=4&latitude=41.5&longitude=-8.25&hour=14"
        );
    }

    #[test]
    fn sunset_url() {
        let client = PrimaryClient::new("measurements.local/api/")
            .unwrap()
            .with_group_number(7);
        let query = PrimaryQuery::Sunset {
            coordinates: coordinates(),
        };
        assert_eq!(
            client.build_url(&query),
            "http://measurements.local/api/SunriseOrSunsetTime?groupNumber=7&latitude=41.5&longitude=-8.25&option=sunset"
        );
    }

    #[test]
    fn decode_number() {
        let m = decode_measurement(r#"{"measurement": 23.456}"#).unwrap();
        assert_eq!(m, Measurement::Value(23.456));
    }

    #[test]
    fn decode_zero_is_a_value() {
        let m = decode_measurement(r#"{"measurement": 0}"#).unwrap();
        assert_eq!(m, Measurement::Value(0.0));
    }

    #[test]
    fn decode_nan_variants() {
        assert_eq!(decode_measurement("NaN").unwrap(), Measurement::NotANumber);
        assert_eq!(
            decode_measurement(r#""NaN""#).unwrap(),
            Measurement::NotANumber
        );
        assert_eq!(
            decode_measurement(r#"{"measurement": "NaN"}"#).unwrap(),
            Measurement::NotANumber
        );
        assert_eq!(
            decode_measurement(r#"{"measurement": NaN}"#).unwrap(),
            Measurement::NotANumber
        );
    }

    #[test]
    fn decode_numeric_string() {
        assert_eq!(
            decode_measurement(r#"{"measurement": "6.5"}"#).unwrap(),
            Measurement::Value(6.5)
        );
    }

    #[test]
    fn decode_missing_field() {
        let err = decode_measurement(r#"{"value": 1}"#).unwrap_err();
        assert!(matches!(err, ParseError::MissingField(_)));
    }

    #[test]
    fn decode_garbage() {
        assert!(decode_measurement("<html>").is_err());
        assert!(decode_measurement(r#"{"measurement": [1]}"#).is_err());
    }
}
