// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Records served by the smart-home backend.
//!
//! Single records are plain JSON objects. Lists are HAL collections of the
//! form `{"_embedded": {"roomDTOList": [...]}, "_links": {...}}`; an empty
//! list omits `_embedded` altogether. Hypermedia links are ignored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ParseError, ValueError};
use crate::types::Coordinates;

/// The house record as served by `GET /smarthome/house`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct House {
    /// House identifier.
    #[serde(rename = "houseID")]
    pub house_id: String,
    /// Door number.
    #[serde(default)]
    pub door: String,
    /// Street name.
    #[serde(default)]
    pub street: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// Country.
    #[serde(default)]
    pub country: String,
    /// Postal code.
    #[serde(default)]
    pub postal_code: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl House {
    /// Returns the validated location of the house.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the stored location is out of range.
    pub fn coordinates(&self) -> Result<Coordinates, ValueError> {
        Coordinates::new(self.latitude, self.longitude)
    }
}

/// A room of the house.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Room identifier.
    pub id: String,
    /// Display name.
    pub room_name: String,
    /// Floor number.
    #[serde(default)]
    pub floor: i32,
    /// Height in meters.
    #[serde(default)]
    pub room_height: f64,
    /// Length in meters.
    #[serde(default)]
    pub room_length: f64,
    /// Width in meters.
    #[serde(default)]
    pub room_width: f64,
    /// Owning house.
    #[serde(rename = "houseID", default)]
    pub house_id: Option<String>,
}

/// A device installed in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Device identifier.
    #[serde(rename = "deviceID")]
    pub device_id: String,
    /// Display name.
    pub device_name: String,
    /// Model designation.
    #[serde(default)]
    pub device_model: String,
    /// `"true"` while the device is active.
    #[serde(default)]
    pub device_status: String,
    /// Room the device is installed in.
    #[serde(rename = "roomID", default)]
    pub room_id: Option<String>,
}

impl Device {
    /// Returns true if the device has not been deactivated.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.device_status.eq_ignore_ascii_case("true")
    }
}

/// Body of `POST /smarthome/devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDevice {
    /// Display name.
    pub device_name: String,
    /// Model designation.
    pub device_model: String,
    /// Room to install the device in.
    #[serde(rename = "roomID")]
    pub room_id: String,
}

/// A sensor attached to a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    /// Sensor identifier.
    #[serde(rename = "sensorID")]
    pub sensor_id: String,
    /// Display name.
    pub sensor_name: String,
    /// Owning device.
    #[serde(rename = "deviceID")]
    pub device_id: String,
    /// Kind of sensor, e.g. `TemperatureSensor`.
    #[serde(rename = "sensorTypeID")]
    pub sensor_type_id: String,
}

/// Body of `POST /smarthome/sensors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSensor {
    /// Display name.
    pub sensor_name: String,
    /// Kind of sensor.
    #[serde(rename = "sensorTypeID")]
    pub sensor_type_id: String,
    /// Device to attach the sensor to.
    #[serde(rename = "deviceID")]
    pub device_id: String,
}

/// An actuator attached to a device.
///
/// Limits and status travel as text; which of them are set depends on the
/// actuator type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actuator {
    /// Actuator identifier.
    pub actuator_id: String,
    /// Display name.
    pub actuator_name: String,
    /// Kind of actuator, e.g. `RollerBlindActuator`.
    #[serde(rename = "actuatorTypeID")]
    pub actuator_type_id: String,
    /// Owning device.
    #[serde(rename = "deviceID")]
    pub device_id: String,
    /// Lowest accepted command.
    #[serde(default)]
    pub lower_limit: Option<String>,
    /// Highest accepted command.
    #[serde(default)]
    pub upper_limit: Option<String>,
    /// Command precision for decimal actuators.
    #[serde(default)]
    pub precision: Option<String>,
    /// Last acknowledged command.
    #[serde(default)]
    pub status: Option<String>,
}

/// Body of `POST /smarthome/actuators`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActuator {
    /// Display name.
    pub actuator_name: String,
    /// Kind of actuator.
    #[serde(rename = "actuatorTypeID")]
    pub actuator_type_id: String,
    /// Device to attach the actuator to.
    #[serde(rename = "deviceID")]
    pub device_id: String,
    /// Lowest accepted command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_limit: Option<String>,
    /// Highest accepted command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_limit: Option<String>,
    /// Command precision for decimal actuators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<String>,
}

/// One logged sensor reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Log entry identifier.
    #[serde(rename = "logID")]
    pub log_id: String,
    /// When the reading was taken (ISO 8601).
    pub time: String,
    /// The reading as text.
    pub reading: String,
    /// Sensor that took the reading.
    #[serde(rename = "sensorID")]
    pub sensor_id: String,
    /// Device the sensor belongs to.
    #[serde(rename = "deviceID")]
    pub device_id: String,
    /// Kind of sensor.
    #[serde(rename = "sensorTypeID")]
    pub sensor_type_id: String,
}

/// A supported sensor type and its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorType {
    /// Type identifier, e.g. `TemperatureSensor`.
    #[serde(rename = "sensorTypeID")]
    pub sensor_type_id: String,
    /// Unit of its readings, e.g. `C`.
    #[serde(default)]
    pub unit: String,
}

/// A supported actuator type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuatorType {
    /// Type identifier, e.g. `SwitchActuator`.
    #[serde(rename = "actuatorTypeID")]
    pub actuator_type_id: String,
}

/// Decodes the records listed under `_embedded.<key>` of a HAL collection.
pub(crate) fn decode_collection<T: DeserializeOwned>(
    body: &str,
    key: &str,
) -> Result<Vec<T>, ParseError> {
    let mut value: Value = serde_json::from_str(body.trim())?;
    if !value.is_object() {
        return Err(ParseError::UnexpectedFormat(format!(
            "expected a collection object, got {value}"
        )));
    }

    match value.pointer_mut(&format!("/_embedded/{key}")) {
        Some(list) => Ok(serde_json::from_value(list.take())?),
        None => Ok(Vec::new()),
    }
}
