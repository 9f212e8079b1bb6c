//! Sensor capability interface.
//!
//! The sampling loop only ever sees [`EnvironmentSensors`]. Concrete drivers
//! (or the simulator) live in the host binary.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("{sensor}: {operation} failed: {details}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
        details: String,
    },
    #[error("{sensor}: timed out during {operation}")]
    Timeout {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: reset failed: {details}")]
    ResetFailed {
        sensor: &'static str,
        details: String,
    },
}

/// Temperature, humidity and pressure from the climate sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimateReadings {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub pressure_hpa: f64,
}

/// Gas sensor resistances in Ohms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GasReadings {
    pub oxidising_ohms: f64,
    pub reducing_ohms: f64,
    pub nh3_ohms: f64,
}

/// Cumulative particle counts per litre of air.
///
/// Each field counts particles at or above the given diameter, so the values
/// are non-increasing from `um_0_3` to `um_10` on a healthy sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParticleCounts {
    pub um_0_3: u32,
    pub um_0_5: u32,
    pub um_1_0: u32,
    pub um_2_5: u32,
    pub um_5_0: u32,
    pub um_10: u32,
}

impl ParticleCounts {
    /// Split the cumulative counts into exclusive size bands, smallest first:
    /// 0.3-0.5, 0.5-1.0, 1.0-2.5, 2.5-5.0, 5.0-10, 10+.
    ///
    /// Bands are plain differences and go negative if the sensor ever reports
    /// a larger count for a larger size.
    pub fn size_bands(&self) -> [f64; 6] {
        let cumulative = [
            self.um_0_3,
            self.um_0_5,
            self.um_1_0,
            self.um_2_5,
            self.um_5_0,
            self.um_10,
        ]
        .map(f64::from);

        let mut bands = [0.0; 6];
        for i in 0..6 {
            let next = cumulative.get(i + 1).copied().unwrap_or(0.0);
            bands[i] = cumulative[i] - next;
        }
        bands
    }
}

/// Everything the sampler needs from the hardware.
///
/// Implementations must be `Send` so the sampler can run on a spawned task.
pub trait EnvironmentSensors: Send {
    /// Read temperature, humidity and pressure.
    fn read_climate(&mut self) -> impl Future<Output = Result<ClimateReadings, SensorError>> + Send;

    /// Read the three gas channels.
    fn read_gas(&mut self) -> impl Future<Output = Result<GasReadings, SensorError>> + Send;

    /// Read one particulate frame. Failures here are treated as transient.
    fn read_particulates(
        &mut self,
    ) -> impl Future<Output = Result<ParticleCounts, SensorError>> + Send;

    /// Reset the particulate sensor after a failed read.
    fn reset_particulate_sensor(&mut self) -> impl Future<Output = Result<(), SensorError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_bands() {
        let counts = ParticleCounts {
            um_0_3: 100,
            um_0_5: 60,
            um_1_0: 30,
            um_2_5: 10,
            um_5_0: 3,
            um_10: 1,
        };

        assert_eq!(counts.size_bands(), [40.0, 30.0, 20.0, 7.0, 2.0, 1.0]);
    }

    #[test]
    fn test_size_bands_keep_inconsistent_counts() {
        let counts = ParticleCounts {
            um_2_5: 1,
            um_5_0: 4,
            ..Default::default()
        };

        let bands = counts.size_bands();
        assert_eq!(bands[2], -1.0);
        assert_eq!(bands[3], -3.0);
        assert_eq!(bands[4], 4.0);
    }

    #[test]
    fn test_error_display() {
        let err = SensorError::ReadFailed {
            sensor: "PMS5003",
            operation: "read frame",
            details: "checksum mismatch".into(),
        };
        assert_eq!(err.to_string(), "PMS5003: read frame failed: checksum mismatch");
    }
}
