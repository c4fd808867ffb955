// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the readings library.
//!
//! The fallback sequencers never return these errors: every failure there
//! degrades to the next tier and finally to a display sentinel. They are
//! returned by the individual service clients and by the backend helpers
//! ([`BackendClient::house`](crate::protocol::BackendClient::house),
//! [`BackendClient::act`](crate::protocol::BackendClient::act)).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A latitude is outside [-90, 90] or not finite.
    #[error("latitude {0} is out of range [-90, 90]")]
    InvalidLatitude(f64),

    /// A longitude is outside [-180, 180] or not finite.
    #[error("longitude {0} is out of range [-180, 180]")]
    InvalidLongitude(f64),

    /// An hour of the day is outside [0, 23].
    #[error("hour {0} is out of range [0, 23]")]
    InvalidHour(u32),
}

/// Errors related to HTTP communication with the reading services.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status code.
    #[error("HTTP {0}")]
    Status(u16),

    /// The request was cancelled before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The response could not be decoded.
    #[error("invalid response: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to parsing service responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
