//! Synthetic sensor backend.
//!
//! Produces slowly varying values so the whole station can run on a desktop
//! host without any hardware attached.

use enviro_core::sensors::{
    ClimateReadings, EnvironmentSensors, GasReadings, ParticleCounts, SensorError,
};
use log::info;

/// Generates synthetic readings that vary over time.
pub struct SimulatedSensors {
    /// Seconds of simulated time, advanced once per climate read
    elapsed_secs: f64,
    step_secs: f64,
    /// Fail every Nth particulate read, to exercise the reset path
    particulate_fault_every: Option<u32>,
    particulate_reads: u32,
}

impl SimulatedSensors {
    pub fn new(step_secs: u64) -> Self {
        Self {
            elapsed_secs: 0.0,
            step_secs: step_secs as f64,
            particulate_fault_every: None,
            particulate_reads: 0,
        }
    }

    pub fn with_particulate_faults(mut self, every: Option<u32>) -> Self {
        self.particulate_fault_every = every.filter(|n| *n > 0);
        self
    }
}

impl EnvironmentSensors for SimulatedSensors {
    async fn read_climate(&mut self) -> Result<ClimateReadings, SensorError> {
        self.elapsed_secs += self.step_secs;
        let t = self.elapsed_secs;

        // Temperature: 17-23 C with slow drift
        let temperature_celsius = 20.0 + 3.0 * (t / 1200.0).sin() + 0.3 * (t / 97.0).cos();
        // Humidity: 40-60 % on a different period
        let humidity_percent = 50.0 + 10.0 * (t / 1800.0).sin() + 1.5 * (t / 53.0).cos();
        // Pressure: a few hPa around standard
        let pressure_hpa = 1013.25 + 4.0 * (t / 3600.0).sin();

        Ok(ClimateReadings {
            temperature_celsius,
            humidity_percent,
            pressure_hpa,
        })
    }

    async fn read_gas(&mut self) -> Result<GasReadings, SensorError> {
        let t = self.elapsed_secs;

        Ok(GasReadings {
            oxidising_ohms: 20_000.0 + 5_000.0 * (t / 900.0).sin(),
            reducing_ohms: 350_000.0 + 60_000.0 * (t / 1500.0).cos(),
            nh3_ohms: 90_000.0 + 15_000.0 * (t / 700.0).sin(),
        })
    }

    async fn read_particulates(&mut self) -> Result<ParticleCounts, SensorError> {
        self.particulate_reads = self.particulate_reads.wrapping_add(1);
        if let Some(every) = self.particulate_fault_every {
            if self.particulate_reads % every == 0 {
                return Err(SensorError::ReadFailed {
                    sensor: "simulated particulate sensor",
                    operation: "read frame",
                    details: "injected fault".into(),
                });
            }
        }

        let t = self.elapsed_secs;
        let level = 1.0 + 0.5 * (t / 2400.0).sin();
        let count = |base: f64| (base * level).round() as u32;

        Ok(ParticleCounts {
            um_0_3: count(1500.0),
            um_0_5: count(420.0),
            um_1_0: count(90.0),
            um_2_5: count(12.0),
            um_5_0: count(3.0),
            um_10: count(1.0),
        })
    }

    async fn reset_particulate_sensor(&mut self) -> Result<(), SensorError> {
        info!("Resetting simulated particulate sensor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_stay_in_plausible_ranges() {
        let mut sensors = SimulatedSensors::new(10);

        for _ in 0..500 {
            let climate = sensors.read_climate().await.unwrap();
            assert!((15.0..=25.0).contains(&climate.temperature_celsius));
            assert!((35.0..=65.0).contains(&climate.humidity_percent));

            let particles = sensors.read_particulates().await.unwrap();
            assert!(particles.um_0_3 >= particles.um_0_5);
            assert!(particles.um_0_5 >= particles.um_1_0);
            assert!(particles.um_2_5 >= particles.um_10);
        }
    }

    #[tokio::test]
    async fn test_injected_particulate_faults() {
        let mut sensors = SimulatedSensors::new(10).with_particulate_faults(Some(3));

        assert!(sensors.read_particulates().await.is_ok());
        assert!(sensors.read_particulates().await.is_ok());
        assert!(sensors.read_particulates().await.is_err());
        assert!(sensors.read_particulates().await.is_ok());
        assert!(sensors.reset_particulate_sensor().await.is_ok());
    }

    #[tokio::test]
    async fn test_zero_fault_interval_is_ignored() {
        let mut sensors = SimulatedSensors::new(10).with_particulate_faults(Some(0));
        for _ in 0..10 {
            assert!(sensors.read_particulates().await.is_ok());
        }
    }
}
