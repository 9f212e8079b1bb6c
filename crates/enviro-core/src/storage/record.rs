//! Sample and aggregate records.
//!
//! A [`Reading`] is one composite sample taken at a single instant. An
//! [`Aggregate`] is the per-field mean over a window of readings and is the
//! only record that is ever written to disk.

use serde::Serialize;

use crate::sensors::{ClimateReadings, GasReadings, ParticleCounts};

/// Number of numeric values carried by every record.
pub const FIELD_COUNT: usize = 12;

/// Round to `decimals` places.
///
/// Rounds the exact binary value of `value`, so 21.05 (stored as
/// 21.0500000000000007..) goes up and 0.15 (0.1499999999999999944..) goes
/// down. Only exact binary ties such as 1013.25 go to the even digit.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// The numeric payload shared by readings and aggregates.
///
/// Field order is the on-disk key order. Keep [`Measurements::to_array`] and
/// [`Measurements::from_array`] in sync with it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Measurements {
    /// Degrees Celsius
    #[serde(rename = "temp")]
    pub temperature: f64,
    /// Relative humidity in percent
    #[serde(rename = "humi")]
    pub humidity: f64,
    /// Hectopascal
    #[serde(rename = "pres")]
    pub pressure: f64,
    /// Oxidising gas resistance in kOhm
    #[serde(rename = "oxi")]
    pub oxidising: f64,
    /// Reducing gas resistance in kOhm
    #[serde(rename = "red")]
    pub reducing: f64,
    /// NH3 resistance in kOhm
    pub nh3: f64,
    /// Particles per litre between 0.3um and 0.5um
    pub pm03: f64,
    /// Particles per litre between 0.5um and 1.0um
    pub pm05: f64,
    /// Particles per litre between 1.0um and 2.5um
    pub pm10: f64,
    /// Particles per litre between 2.5um and 5.0um
    pub pm25: f64,
    /// Particles per litre between 5.0um and 10um
    pub pm50: f64,
    /// Particles per litre of 10um and above
    pub pm100: f64,
}

impl Measurements {
    /// Build measurements from raw sensor output.
    ///
    /// Climate values are kept to one decimal. Gas resistances are converted
    /// from Ohms to kOhms, oxidising to one decimal and the other two to whole
    /// numbers. Particle counts are cumulative (at or above each size) and are
    /// split into exclusive size bands.
    pub fn from_sensors(
        climate: &ClimateReadings,
        gas: &GasReadings,
        particles: &ParticleCounts,
    ) -> Self {
        let [pm03, pm05, pm10, pm25, pm50, pm100] = particles.size_bands();

        Self {
            temperature: round_to(climate.temperature_celsius, 1),
            humidity: round_to(climate.humidity_percent, 1),
            pressure: round_to(climate.pressure_hpa, 1),
            oxidising: round_to(gas.oxidising_ohms / 1000.0, 1),
            reducing: round_to(gas.reducing_ohms / 1000.0, 0),
            nh3: round_to(gas.nh3_ohms / 1000.0, 0),
            pm03,
            pm05,
            pm10,
            pm25,
            pm50,
            pm100,
        }
    }

    /// Flatten into an array in record order.
    pub fn to_array(&self) -> [f64; FIELD_COUNT] {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.oxidising,
            self.reducing,
            self.nh3,
            self.pm03,
            self.pm05,
            self.pm10,
            self.pm25,
            self.pm50,
            self.pm100,
        ]
    }

    /// Inverse of [`Measurements::to_array`].
    pub fn from_array(values: [f64; FIELD_COUNT]) -> Self {
        let [
            temperature,
            humidity,
            pressure,
            oxidising,
            reducing,
            nh3,
            pm03,
            pm05,
            pm10,
            pm25,
            pm50,
            pm100,
        ] = values;

        Self {
            temperature,
            humidity,
            pressure,
            oxidising,
            reducing,
            nh3,
            pm03,
            pm05,
            pm10,
            pm25,
            pm50,
            pm100,
        }
    }
}

/// One composite sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Seconds since the Unix epoch, whole seconds
    pub timestamp: i64,
    pub values: Measurements,
}

impl Reading {
    pub fn new(timestamp: i64, values: Measurements) -> Self {
        Self { timestamp, values }
    }
}

/// Per-field mean over a window of readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Timestamp of the first reading in the window
    pub start_ts: i64,
    /// Number of readings that went into the mean
    pub count: usize,
    /// Means rounded to one decimal place
    pub mean: Measurements,
}

impl Aggregate {
    /// Average a slice of readings.
    ///
    /// Returns None if the slice is empty.
    pub fn from_readings<'a, I>(readings: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut readings = readings.into_iter();
        let first = readings.next()?;

        let mut sum = first.values.to_array();
        let mut count = 1usize;

        for reading in readings {
            for (total, value) in sum.iter_mut().zip(reading.values.to_array()) {
                *total += value;
            }
            count += 1;
        }

        let mean = sum.map(|total| round_to(total / count as f64, 1));

        Some(Self {
            start_ts: first.timestamp,
            count,
            mean: Measurements::from_array(mean),
        })
    }
}
