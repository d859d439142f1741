//! Sensor simulation
//!
//! Temperature and humidity follow a bounded random walk; the button is
//! pressed now and then.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{MAX_SENSOR_STEP, SensorConfig};

/// One set of readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorReading {
    pub temperature: i32,
    pub humidity: i32,
    pub button_pressed: bool,
}

pub struct SensorSimulator {
    config: SensorConfig,
    temperature: f64,
    humidity: f64,
    rng: StdRng,
}

impl SensorSimulator {
    pub fn new(config: SensorConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create with a specific seed for reproducible runs
    pub fn with_seed(config: SensorConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SensorConfig, rng: StdRng) -> Self {
        Self {
            temperature: config.initial_temperature,
            humidity: config.initial_humidity.clamp(0.0, 100.0),
            config,
            rng,
        }
    }

    /// Advance the walk and take a reading
    pub fn next_reading(&mut self) -> SensorReading {
        self.temperature += self.step(self.config.temperature_step);
        self.humidity = (self.humidity + self.step(self.config.humidity_step)).clamp(0.0, 100.0);
        let button_pressed = self.rng.gen_bool(self.config.button_probability.clamp(0.0, 1.0));

        SensorReading {
            temperature: self.temperature.round() as i32,
            humidity: self.humidity.round() as i32,
            button_pressed,
        }
    }

    fn step(&mut self, max: f64) -> f64 {
        if !max.is_finite() {
            return 0.0;
        }
        let max = max.clamp(0.0, MAX_SENSOR_STEP);
        if max > 0.0 {
            self.rng.gen_range(-max..=max)
        } else {
            0.0
        }
    }
}
