//! Hardware-independent core library for enviro-rs
//!
//! This crate contains all platform-agnostic logic for the enviro air quality
//! station: the sample/aggregate data model, the sensor capability trait, the
//! on-disk aggregate store and the sampling loop that ties them together.
//!
//! Nothing here talks to real hardware. The host binary plugs a concrete
//! [`sensors::EnvironmentSensors`] implementation into a [`sampling::Sampler`].

pub mod config;
pub mod sampling;
pub mod sensors;
pub mod shutdown;
pub mod storage;

pub use config::Config;
pub use sampling::{Sampler, SamplerError};
pub use shutdown::{Shutdown, ShutdownListener};
pub use storage::{Aggregate, AggregateStore, Measurements, Reading, Window};
