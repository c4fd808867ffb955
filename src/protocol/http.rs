// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP plumbing shared by the service clients.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::error::ProtocolError;

/// Normalizes a service base URL.
///
/// A bare host gets an `http://` scheme and trailing slashes are removed so
/// paths can be appended with `format!("{base}/path")`.
pub(crate) fn normalize_base_url(base: impl Into<String>) -> Result<String, ProtocolError> {
    let base = base.into();
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ProtocolError::InvalidAddress(base));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{trimmed}"))
    }
}

/// Builds a `reqwest` client.
///
/// `timeout` is a transport-level limit; `None` leaves requests unbounded so
/// only the caller's deadline (if any) applies.
pub(crate) fn build_client(timeout: Option<Duration>) -> Result<Client, ProtocolError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(ProtocolError::Http)
}

/// Checks the status of a response and reads its body as text.
pub(crate) async fn read_body(response: Response) -> Result<String, ProtocolError> {
    let status = response.status();
    if !status.is_success() {
        tracing::debug!(
            status = status.as_u16(),
            reason = status.canonical_reason().unwrap_or("Unknown"),
            "Service answered with error status"
        );
        return Err(ProtocolError::Status(status.as_u16()));
    }

    let body = response.text().await.map_err(ProtocolError::Http)?;
    tracing::debug!(body = %body, "Received HTTP response");
    Ok(body)
}
