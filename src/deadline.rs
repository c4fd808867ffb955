// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall-clock budget shared across the steps of one fallback sequence.
//!
//! A [`DeadlineBudget`] is started once per sequencer invocation and only
//! ever read afterwards: each step asks for the [`remaining`] time and uses
//! it as the timeout of its primary request.
//!
//! [`remaining`]: DeadlineBudget::remaining

use std::time::Duration;

use tokio::time::Instant;

/// A total time allowance and the instant it started counting down.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use smarthome_readings::deadline::DeadlineBudget;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let budget = DeadlineBudget::start(Duration::from_millis(3000));
/// assert!(budget.remaining() <= Duration::from_millis(3000));
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DeadlineBudget {
    total: Duration,
    started_at: Instant,
}

impl DeadlineBudget {
    /// Starts a budget of `total` at the current instant.
    #[must_use]
    pub fn start(total: Duration) -> Self {
        Self {
            total,
            started_at: Instant::now(),
        }
    }

    /// Returns the total allowance.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.total
    }

    /// Returns the time elapsed since the budget started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns `max(0, total - elapsed)`.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.total.saturating_sub(self.elapsed())
    }

    /// Returns the remaining time in whole milliseconds.
    #[must_use]
    pub fn remaining_ms(&self) -> u64 {
        u64::try_from(self.remaining().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns true once nothing of the budget is left.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }
}
