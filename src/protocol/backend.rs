// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client for the smart-home backend.
//!
//! Besides the cached sun readings used as a fallback tier, the backend
//! serves the house record (whose location feeds the sequencers), the rooms
//! with their devices, sensors, actuators and reading logs, and forwards
//! actuator commands.

use chrono::NaiveDate;
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use super::SunReadingSource;
use super::http::{build_client, normalize_base_url, read_body};
use super::resources::{
    Actuator, ActuatorType, Device, House, Log, NewActuator, NewDevice, NewSensor, Room, Sensor,
    SensorType, decode_collection,
};
use crate::error::{Error, ParseError, ProtocolError};
use crate::types::{Coordinates, MetricKind};

/// HTTP client for the smart-home backend.
///
/// # Examples
///
/// ```no_run
/// use smarthome_readings::protocol::BackendClient;
///
/// # async fn example() -> smarthome_readings::Result<()> {
/// let backend = BackendClient::new("http://localhost:8080")?;
/// let house = backend.house().await?;
/// let coordinates = house.coordinates()?;
///
/// for room in backend.rooms().await? {
///     for device in backend.devices(&room.id).await? {
///         println!("{}: {} ({})", room.room_name, device.device_name, device.is_active());
///     }
/// }
///
/// // Move roller blind "blind-1" to 50%
/// let status = backend.act("blind-1", 50.0).await?;
/// assert_eq!(status, 50);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    client: Client,
}

impl BackendClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is empty or the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProtocolError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            client: build_client(None)?,
        })
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

    /// Returns the base URL of the backend.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/smarthome/{path}", self.base_url)
    }

    /// Builds the cached sun reading URL.
    fn sun_reading_url(
        &self,
        sensor_type_id: &str,
        coordinates: Coordinates,
        date: NaiveDate,
    ) -> String {
        self.url(&format!(
            "logs/get-sun-reading?date={}&latitude={}&longitude={}&sensorTypeId={}",
            date.format("%Y-%m-%d"),
            coordinates.latitude(),
            coordinates.longitude(),
            urlencoding::encode(sensor_type_id)
        ))
    }

    /// Builds the actuator command URL.
    fn act_url(&self, actuator_id: &str, command: f64) -> String {
        self.url(&format!(
            "actuators/{}/act?command={command}",
            urlencoding::encode(actuator_id)
        ))
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<String, Error> {
        tracing::debug!(%method, url = %url, "Calling backend");

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(ProtocolError::Http)?;
        Ok(read_body(response).await?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let body = self.send(Method::GET, url, None).await?;
        Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
    }

    async fn get_collection<T: DeserializeOwned>(
        &self,
        url: &str,
        key: &str,
    ) -> Result<Vec<T>, Error> {
        let body = self.send(Method::GET, url, None).await?;
        Ok(decode_collection(&body, key)?)
    }

    async fn write_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        payload: &impl Serialize,
    ) -> Result<T, Error> {
        let payload = serde_json::to_value(payload).map_err(ParseError::Json)?;
        let body = self.send(method, url, Some(&payload)).await?;
        Ok(serde_json::from_str(&body).map_err(ParseError::Json)?)
    }

    /// Fetches the house record.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a house record.
    pub async fn house(&self) -> Result<House, Error> {
        self.get_json(&self.url("house")).await
    }

    /// Lists the rooms of the house.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a room list.
    pub async fn rooms(&self) -> Result<Vec<Room>, Error> {
        self.get_collection(&self.url("rooms"), "roomDTOList").await
    }

    /// Fetches one room.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Status(404)` for an unknown room, or error if
    /// the request fails.
    pub async fn room(&self, room_id: &str) -> Result<Room, Error> {
        let url = self.url(&format!("rooms/{}", urlencoding::encode(room_id)));
        self.get_json(&url).await
    }

    /// Lists the devices installed in a room.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a device list.
    pub async fn devices(&self, room_id: &str) -> Result<Vec<Device>, Error> {
        let url = self.url(&format!("devices?roomID={}", urlencoding::encode(room_id)));
        self.get_collection(&url, "deviceDTOList").await
    }

    /// Fetches one device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a device.
    pub async fn device(&self, device_id: &str) -> Result<Device, Error> {
        let url = self.url(&format!("devices/{}", urlencoding::encode(device_id)));
        self.get_json(&url).await
    }

    /// Installs a new device and returns it as stored.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the device.
    pub async fn add_device(&self, device: &NewDevice) -> Result<Device, Error> {
        let created: Device = self
            .write_json(Method::POST, &self.url("devices"), device)
            .await?;
        tracing::info!(device_id = %created.device_id, room_id = %device.room_id, "Device added");
        Ok(created)
    }

    /// Deactivates a device and returns its updated record.
    ///
    /// # Errors
    ///
    /// Returns error if the device is unknown or already inactive.
    pub async fn deactivate_device(&self, device_id: &str) -> Result<Device, Error> {
        let url = self.url(&format!("devices/{}", urlencoding::encode(device_id)));
        let device: Device = self
            .write_json(Method::PATCH, &url, &serde_json::json!({}))
            .await?;
        tracing::info!(device_id, "Device deactivated");
        Ok(device)
    }

    /// Lists the sensors of a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a sensor list.
    pub async fn sensors(&self, device_id: &str) -> Result<Vec<Sensor>, Error> {
        let url = self.url(&format!("sensors?deviceId={}", urlencoding::encode(device_id)));
        self.get_collection(&url, "sensorDTOList").await
    }

    /// Lists the actuators of a device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not an actuator list.
    pub async fn actuators(&self, device_id: &str) -> Result<Vec<Actuator>, Error> {
        let url = self.url(&format!("actuators?deviceId={}", urlencoding::encode(device_id)));
        self.get_collection(&url, "actuatorDTOList").await
    }

    /// Attaches a new sensor to a device.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the sensor.
    pub async fn add_sensor(&self, sensor: &NewSensor) -> Result<Sensor, Error> {
        let created: Sensor = self
            .write_json(Method::POST, &self.url("sensors"), sensor)
            .await?;
        tracing::info!(sensor_id = %created.sensor_id, device_id = %sensor.device_id, "Sensor added");
        Ok(created)
    }

    /// Attaches a new actuator to a device.
    ///
    /// # Errors
    ///
    /// Returns error if the backend rejects the actuator.
    pub async fn add_actuator(&self, actuator: &NewActuator) -> Result<Actuator, Error> {
        let created: Actuator = self
            .write_json(Method::POST, &self.url("actuators"), actuator)
            .await?;
        tracing::info!(
            actuator_id = %created.actuator_id,
            device_id = %actuator.device_id,
            "Actuator added"
        );
        Ok(created)
    }

    /// Lists the logged readings of a device's sensors.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a log list.
    pub async fn logs(&self, device_id: &str) -> Result<Vec<Log>, Error> {
        let url = self.url(&format!("logs?deviceId={}", urlencoding::encode(device_id)));
        self.get_collection(&url, "logDTOList").await
    }

    /// Lists the supported sensor types.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a type list.
    pub async fn sensor_types(&self) -> Result<Vec<SensorType>, Error> {
        self.get_collection(&self.url("sensortypes"), "sensorTypeDTOList")
            .await
    }

    /// Lists the supported actuator types.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a type list.
    pub async fn actuator_types(&self) -> Result<Vec<ActuatorType>, Error> {
        self.get_collection(&self.url("actuatortypes"), "actuatorTypeDTOList")
            .await
    }

    /// Forwards a numeric command to an actuator and returns the status it
    /// echoes back.
    ///
    /// The command is opaque here; for a roller blind it is the target
    /// position.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the echoed status is not an
    /// integer.
    pub async fn act(&self, actuator_id: &str, command: f64) -> Result<i64, Error> {
        let url = self.act_url(actuator_id, command);
        tracing::debug!(actuator_id, command, "Sending actuator command");

        let response = self
            .client
            .patch(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let body = read_body(response).await?;

        let status = decode_status(&body)?;
        tracing::info!(actuator_id, status, "Actuator acknowledged command");
        Ok(status)
    }
}

impl SunReadingSource for BackendClient {
    async fn sun_reading(
        &self,
        kind: MetricKind,
        coordinates: Coordinates,
        date: NaiveDate,
    ) -> Result<String, ProtocolError> {
        let sensor_type_id = kind.sensor_type_id().ok_or_else(|| {
            ProtocolError::Parse(ParseError::InvalidValue {
                field: "sensorTypeId".to_string(),
                message: format!("no cached readings for {kind}"),
            })
        })?;
        let url = self.sun_reading_url(sensor_type_id, coordinates, date);
        tracing::debug!(url = %url, "Requesting cached sun reading");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(ProtocolError::Http)?;
        let body = read_body(response).await?;

        Ok(extract_timestamp(&body)?)
    }
}

/// Extracts the timestamp from a cached sun reading body.
///
/// The backend answers with plain text; a JSON string or an object with a
/// `value`, `reading` or `timestamp` field is accepted too.
pub(crate) fn extract_timestamp(body: &str) -> Result<String, ParseError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(ParseError::UnexpectedFormat("empty body".to_string()));
    }

    if trimmed.starts_with('"') {
        return Ok(serde_json::from_str::<String>(trimmed)?);
    }

    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)?;
        return ["value", "reading", "timestamp"]
            .iter()
            .find_map(|field| value.get(field).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| ParseError::MissingField("value".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Decodes the `status` echoed by an actuator.
///
/// Leading integer digits are kept, so `"50.7"` reads as `50`.
#[allow(clippy::cast_possible_truncation)]
fn decode_status(body: &str) -> Result<i64, ParseError> {
    let value: Value = serde_json::from_str(body.trim())?;
    let status = value
        .get("status")
        .ok_or_else(|| ParseError::MissingField("status".to_string()))?;

    let parsed = match status {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| {
                text.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    };

    parsed.ok_or_else(|| ParseError::InvalidValue {
        field: "status".to_string(),
        message: format!("{status} is not an integer"),
    })
}
