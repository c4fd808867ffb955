// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic refresh of the dashboard readings.
//!
//! A [`RefreshHandle`] owns one background task tied to the lifetime of the
//! view that shows the readings. Sun times are fetched once; the temperature
//! is fetched immediately and then at a fixed rate of one fetch per refresh
//! interval, measured from the start of each fetch. Labels are published
//! over a [`watch`] channel.
//!
//! Dropping the handle (or calling [`RefreshHandle::stop`]) cancels the task,
//! including any fetch in flight.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::format::ReadingLabel;
use crate::protocol::{PrimarySource, SunReadingSource, WeatherSource};
use crate::sequencer::FallbackSequencer;
use crate::types::Coordinates;

/// Shortest accepted refresh interval.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Labels of the three environmental fields of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardReadings {
    /// Outdoor temperature, e.g. `"18.20 °C"`.
    pub temperature: ReadingLabel,
    /// Today's sunrise, e.g. `"6h30m"`.
    pub sunrise: ReadingLabel,
    /// Today's sunset, e.g. `"20h41m"`.
    pub sunset: ReadingLabel,
}

/// Owner of a running refresh task.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use smarthome_readings::{ReadingsConfig, RefreshHandle};
///
/// # async fn example() -> smarthome_readings::Result<()> {
/// let config = ReadingsConfig::new("http://measurements.local", "http://localhost:8080");
/// let interval = config.refresh_interval();
/// let house = config.backend_client()?.house().await?;
/// let sequencer = Arc::new(config.into_sequencer()?);
///
/// let handle = RefreshHandle::spawn(sequencer, house.coordinates()?, interval);
/// let mut readings = handle.subscribe();
/// while readings.changed().await.is_ok() {
///     let current = readings.borrow_and_update().clone();
///     println!("{} | {} | {}", current.temperature, current.sunrise, current.sunset);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct RefreshHandle {
    cancel: CancellationToken,
    readings: watch::Receiver<DashboardReadings>,
    task: JoinHandle<()>,
    _guard: DropGuard,
}

impl RefreshHandle {
    /// Spawns the refresh task on the current tokio runtime.
    ///
    /// Intervals shorter than one second are raised to one second.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn<P, B, W>(
        sequencer: Arc<FallbackSequencer<P, B, W>>,
        coordinates: Coordinates,
        interval: Duration,
    ) -> Self
    where
        P: PrimarySource + Send + Sync + 'static,
        B: SunReadingSource + Send + Sync + 'static,
        W: WeatherSource + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let (tx, readings) = watch::channel(DashboardReadings::default());

        let task = tokio::spawn(run(
            sequencer,
            coordinates,
            interval,
            tx,
            cancel.clone(),
        ));
        tracing::debug!(%coordinates, interval_secs = interval.as_secs(), "Readings refresh started");

        Self {
            _guard: cancel.clone().drop_guard(),
            cancel,
            readings,
            task,
        }
    }

    /// Returns a receiver notified on every label change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardReadings> {
        self.readings.clone()
    }

    /// Returns the current labels.
    #[must_use]
    pub fn current(&self) -> DashboardReadings {
        self.readings.borrow().clone()
    }

    /// Returns true once the task has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the task and waits for it to stop.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Readings refresh task ended abnormally");
        }
        tracing::debug!("Readings refresh stopped");
    }
}

async fn run<P, B, W>(
    sequencer: Arc<FallbackSequencer<P, B, W>>,
    coordinates: Coordinates,
    interval: Duration,
    tx: watch::Sender<DashboardReadings>,
    cancel: CancellationToken,
) where
    P: PrimarySource + Send + Sync + 'static,
    B: SunReadingSource + Send + Sync + 'static,
    W: WeatherSource + Send + Sync + 'static,
{
    tokio::join!(
        refresh_sun_times(Arc::clone(&sequencer), coordinates, &tx, &cancel),
        refresh_temperature(sequencer, coordinates, interval, &tx, &cancel),
    );
}

async fn refresh_sun_times<P, B, W>(
    sequencer: Arc<FallbackSequencer<P, B, W>>,
    coordinates: Coordinates,
    tx: &watch::Sender<DashboardReadings>,
    cancel: &CancellationToken,
) where
    P: PrimarySource + Send + Sync + 'static,
    B: SunReadingSource + Send + Sync + 'static,
    W: WeatherSource + Send + Sync + 'static,
{
    // Each fetch runs in its own task so a panic degrades the labels only
    let task = tokio::spawn(async move { sequencer.sun_times(coordinates).await });
    let abort = task.abort_handle();

    let (sunrise, sunset) = tokio::select! {
        () = cancel.cancelled() => {
            abort.abort();
            return;
        }
        result = task => match result {
            Ok(sun) => (
                ReadingLabel::Ready(sun.sunrise.label()),
                ReadingLabel::Ready(sun.sunset.label()),
            ),
            Err(e) => {
                tracing::error!(error = %e, "Sun times fetch failed");
                (ReadingLabel::not_available(), ReadingLabel::not_available())
            }
        },
    };

    tx.send_modify(|readings| {
        readings.sunrise = sunrise;
        readings.sunset = sunset;
    });
}

async fn refresh_temperature<P, B, W>(
    sequencer: Arc<FallbackSequencer<P, B, W>>,
    coordinates: Coordinates,
    interval: Duration,
    tx: &watch::Sender<DashboardReadings>,
    cancel: &CancellationToken,
) where
    P: PrimarySource + Send + Sync + 'static,
    B: SunReadingSource + Send + Sync + 'static,
    W: WeatherSource + Send + Sync + 'static,
{
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        tx.send_if_modified(|readings| {
            let changed = !readings.temperature.is_loading();
            readings.temperature = ReadingLabel::Loading;
            changed
        });

        let sequencer = Arc::clone(&sequencer);
        let task = tokio::spawn(async move { sequencer.temperature(coordinates).await });
        let abort = task.abort_handle();

        let label = tokio::select! {
            () = cancel.cancelled() => {
                abort.abort();
                return;
            }
            result = task => match result {
                Ok(outcome) => ReadingLabel::Ready(outcome.label()),
                Err(e) => {
                    tracing::error!(error = %e, "Temperature fetch failed");
                    ReadingLabel::not_available()
                }
            },
        };
        tx.send_modify(|readings| readings.temperature = label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;
    use crate::protocol::PrimaryQuery;
    use crate::sequencer::tests::{FakeBackend, FakeWeather, ScriptedPrimary, Step, coordinates};
    use crate::types::{Measurement, MetricKind};

    async fn wait_until_ready(handle: &RefreshHandle) -> DashboardReadings {
        let mut rx = handle.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if !current.temperature.is_loading()
                && !current.sunrise.is_loading()
                && !current.sunset.is_loading()
            {
                return current;
            }
            rx.changed().await.unwrap();
        }
    }

    fn sequencer() -> Arc<FallbackSequencer<ScriptedPrimary, FakeBackend, FakeWeather>> {
        let primary = ScriptedPrimary::default()
            .with(
                MetricKind::Temperature,
                Step::Answer(Duration::from_millis(100), Measurement::Value(23.456)),
            )
            .with(
                MetricKind::Sunrise,
                Step::Answer(Duration::from_millis(100), Measurement::Value(6.5)),
            )
            .with(
                MetricKind::Sunset,
                Step::Answer(Duration::from_millis(100), Measurement::Value(20.083)),
            );
        Arc::new(FallbackSequencer::new(
            primary,
            FakeBackend::new(Duration::ZERO),
            FakeWeather::new(None),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_all_labels() {
        let handle = RefreshHandle::spawn(sequencer(), coordinates(), Duration::from_secs(900));
        assert!(handle.current().temperature.is_loading());

        let readings = wait_until_ready(&handle).await;

        assert_eq!(readings.temperature.as_str(), "23.46 °C");
        assert_eq!(readings.sunrise.as_str(), "6h30m");
        assert_eq!(readings.sunset.as_str(), "20h05m");
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_temperature_every_interval() {
        let sequencer = sequencer();
        let handle = RefreshHandle::spawn(
            Arc::clone(&sequencer),
            coordinates(),
            Duration::from_secs(900),
        );
        wait_until_ready(&handle).await;
        // sunrise + sunset + first temperature
        assert_eq!(sequencer.primary_calls(), 3);

        tokio::time::sleep(Duration::from_secs(901)).await;
        assert_eq!(sequencer.primary_calls(), 4);

        handle.stop().await;
    }

    fn temperature_windows(
        sequencer: &FallbackSequencer<ScriptedPrimary, FakeBackend, FakeWeather>,
    ) -> Vec<Duration> {
        sequencer
            .primary_windows()
            .into_iter()
            .filter(|(kind, _)| *kind == MetricKind::Temperature)
            .map(|(_, window)| window)
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_do_not_shift_schedule() {
        // Every temperature fetch takes the full 2 s budget before the
        // weather service answers
        let primary = ScriptedPrimary::default()
            .with(MetricKind::Temperature, Step::Hang)
            .with(MetricKind::Sunrise, Step::Hang)
            .with(MetricKind::Sunset, Step::Hang);
        let sequencer = Arc::new(FallbackSequencer::new(
            primary,
            FakeBackend::new(Duration::ZERO),
            FakeWeather::new(Some(18.2)),
        ));
        let handle = RefreshHandle::spawn(
            Arc::clone(&sequencer),
            coordinates(),
            Duration::from_secs(900),
        );

        // Fetches start at 0 s, 900 s and 1800 s and each gives up after 2 s
        tokio::time::sleep(Duration::from_secs(1803)).await;

        assert_eq!(
            temperature_windows(&sequencer),
            vec![Duration::from_secs(2); 3]
        );
        assert_eq!(handle.current().temperature.as_str(), "18.20 °C");
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_raised() {
        let sequencer = sequencer();
        let handle = RefreshHandle::spawn(Arc::clone(&sequencer), coordinates(), Duration::ZERO);
        wait_until_ready(&handle).await;

        tokio::time::sleep(Duration::from_millis(1500)).await;

        // sunrise + sunset + temperature at 0 s and 1 s
        assert_eq!(sequencer.primary_calls(), 4);
        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn drop_stops_refreshing() {
        let sequencer = sequencer();
        let handle = RefreshHandle::spawn(
            Arc::clone(&sequencer),
            coordinates(),
            Duration::from_secs(900),
        );
        wait_until_ready(&handle).await;
        let calls = sequencer.primary_calls();

        drop(handle);
        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(sequencer.primary_calls(), calls);
    }

    /// Primary source that panics on every request.
    struct PanickingPrimary;

    impl PrimarySource for PanickingPrimary {
        async fn measurement(
            &self,
            _query: &PrimaryQuery,
            _cancel: &CancellationToken,
        ) -> Result<Measurement, ProtocolError> {
            panic!("primary exploded")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_fetch_shows_not_available() {
        let sequencer = Arc::new(FallbackSequencer::new(
            PanickingPrimary,
            FakeBackend::new(Duration::ZERO),
            FakeWeather::new(Some(18.2)),
        ));
        let handle = RefreshHandle::spawn(sequencer, coordinates(), Duration::from_secs(900));

        let readings = wait_until_ready(&handle).await;

        assert_eq!(readings.temperature.as_str(), "N/A");
        assert_eq!(readings.sunrise.as_str(), "N/A");
        assert_eq!(readings.sunset.as_str(), "N/A");
        handle.stop().await;
    }
}
