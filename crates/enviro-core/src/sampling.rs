//! The sampling loop.
//!
//! A [`Sampler`] takes one [`Reading`] per sample interval, keeps the most
//! recent ones in a [`Window`], and on aggregation boundaries writes the
//! window average through its [`AggregateStore`].
//!
//! ## Boundary rule
//!
//! An aggregate is written on a tick at time `t` only when both hold:
//!
//! - `t % aggregate_interval_secs == 0` (exact, no tolerance for late wakeups)
//! - the window holds at least half of its target size
//!
//! A tick that wakes up a second late simply skips that boundary.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, TimeZone, Utc};
use log::{debug, error, info, warn};
use thiserror::Error;

use crate::config::SamplingConfig;
use crate::sensors::{EnvironmentSensors, SensorError};
use crate::shutdown::ShutdownListener;
use crate::storage::{AggregateStore, Measurements, Reading, StorageError, Window};

#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("sensor error: {0}")]
    Sensor(#[from] SensorError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// Shutdown was requested while waiting on a sensor retry.
    #[error("sampler stopped")]
    Stopped,
}

pub struct Sampler<S, Tz: TimeZone = Local> {
    sensors: S,
    store: AggregateStore<Tz>,
    window: Window,
    sample_interval: Duration,
    aggregate_interval_secs: i64,
    shutdown: ShutdownListener,
}

impl<S, Tz> Sampler<S, Tz>
where
    S: EnvironmentSensors,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    pub fn new(
        sensors: S,
        store: AggregateStore<Tz>,
        config: &SamplingConfig,
        shutdown: ShutdownListener,
    ) -> Self {
        Self {
            sensors,
            store,
            window: Window::new(config.target_size()),
            sample_interval: config.sample_interval(),
            aggregate_interval_secs: config.aggregate_interval_secs.max(1) as i64,
            shutdown,
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// True if `now` falls exactly on an aggregation boundary.
    pub fn is_boundary(&self, now: i64) -> bool {
        now.rem_euclid(self.aggregate_interval_secs) == 0
    }

    /// Sleep one sample interval. Returns false if shutdown cut the wait short.
    async fn pause(&mut self) -> bool {
        let interval = self.sample_interval;
        tokio::select! {
            _ = tokio::time::sleep(interval) => true,
            _ = self.shutdown.triggered() => false,
        }
    }

    /// Query every sensor once and build a reading stamped with `now`.
    ///
    /// A failed particulate read resets that sensor, waits one sample interval
    /// and tries again, for as long as it takes. Any other failure is returned.
    pub async fn acquire(&mut self, now: i64) -> Result<Reading, SamplerError> {
        let climate = self.sensors.read_climate().await?;
        let gas = self.sensors.read_gas().await?;

        let particles = loop {
            match self.sensors.read_particulates().await {
                Ok(particles) => break particles,
                Err(e) => {
                    warn!("Particle sensor error: {e}");
                    self.sensors.reset_particulate_sensor().await?;
                    if !self.pause().await {
                        return Err(SamplerError::Stopped);
                    }
                }
            }
        };

        Ok(Reading::new(
            now,
            Measurements::from_sensors(&climate, &gas, &particles),
        ))
    }

    /// Take one reading at `now` and write an aggregate if this is a boundary.
    ///
    /// Returns the path of the written file, if any.
    pub async fn tick(&mut self, now: i64) -> Result<Option<PathBuf>, SamplerError> {
        let reading = self.acquire(now).await?;
        self.window.push(reading);

        debug!(
            "Sampled at {now}: {} of {} readings in window",
            self.window.len(),
            self.window.capacity()
        );

        if !self.is_boundary(now) || !self.window.is_half_full() {
            return Ok(None);
        }

        let Some(aggregate) = self.window.aggregate() else {
            return Ok(None);
        };

        let path = self.store.persist(&aggregate, now).await?;
        info!("saved: {}", path.display());

        Ok(Some(path))
    }

    /// Sample until shutdown is triggered.
    ///
    /// Any error other than [`SamplerError::Stopped`] ends the loop and is
    /// returned.
    pub async fn run(&mut self) -> Result<(), SamplerError> {
        info!(
            "Sampler started: one reading every {}s, aggregates every {}s into {}",
            self.sample_interval.as_secs(),
            self.aggregate_interval_secs,
            self.store.dir().display()
        );

        while !self.shutdown.is_triggered() {
            let now = Utc::now().timestamp();

            match self.tick(now).await {
                Ok(_) => {}
                Err(SamplerError::Stopped) => break,
                Err(e) => {
                    error!("Sampler failed: {e}");
                    return Err(e);
                }
            }

            if !self.pause().await {
                break;
            }
        }

        info!("Sampler stopped");
        Ok(())
    }
}
