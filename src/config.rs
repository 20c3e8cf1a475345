//! Configuration of the membrane simulations.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::core::model::{MembraneParameters, MembraneState};
use crate::core::{RATE_SCALE, SPIKE_THRESHOLD, VOLTAGE_SCALE};
use crate::error::NeuronError;

/// The default simulated duration of a single run (in ms).
pub const DEFAULT_DURATION: f64 = 1e2;
/// The default simulated duration of every Monte Carlo run (in ms).
pub const DEFAULT_MONTE_CARLO_DURATION: f64 = 1e3;
/// The default sampling step (in ms).
pub const DEFAULT_TIME_STEP: f64 = 1e-1;

/// Everything needed to simulate the membrane and count its spikes, except the forcing current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// The membrane model constants.
    pub parameters: MembraneParameters,
    /// The initial membrane state.
    pub initial_state: MembraneState,
    /// The simulated duration (in ms).
    pub duration: f64,
    /// The sampling step (in ms).
    pub time_step: f64,
    /// The factor converting the raw voltage into mV before detection.
    pub voltage_scale: f64,
    /// The spike detection threshold (in mV).
    pub spike_threshold: f64,
    /// The factor converting spikes per ms into Hz.
    pub rate_scale: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            parameters: MembraneParameters::default(),
            initial_state: MembraneState::default(),
            duration: DEFAULT_DURATION,
            time_step: DEFAULT_TIME_STEP,
            voltage_scale: VOLTAGE_SCALE,
            spike_threshold: SPIKE_THRESHOLD,
            rate_scale: RATE_SCALE,
        }
    }
}

impl SimulationConfig {
    /// Returns the same configuration with another simulated duration.
    pub fn with_duration(self, duration: f64) -> Self {
        SimulationConfig { duration, ..self }
    }

    /// Returns an error if the configuration cannot be simulated.
    pub fn validate(&self) -> Result<(), NeuronError> {
        self.parameters.validate()?;

        if !(self.duration > 0.0 && self.duration.is_finite()) {
            return Err(NeuronError::InvalidParameter(format!(
                "the duration must be positive and finite, got {}",
                self.duration
            )));
        }
        if !(self.time_step > 0.0) || self.time_step > self.duration {
            return Err(NeuronError::InvalidParameter(format!(
                "the time step must be positive and at most the duration, got {}",
                self.time_step
            )));
        }
        if [
            self.initial_state.v,
            self.initial_state.w,
            self.voltage_scale,
            self.spike_threshold,
            self.rate_scale,
        ]
        .iter()
        .any(|x| !x.is_finite())
        {
            return Err(NeuronError::InvalidParameter(
                "initial state, scales and threshold must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Save the configuration to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NeuronError> {
        let file = File::create(path).map_err(|e| NeuronError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| NeuronError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| NeuronError::IOError(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    /// Missing fields take their value in [`SimulationConfig::default`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, NeuronError> {
        Self::load_with_defaults(path, Self::default())
    }

    /// Load a configuration from a JSON file.
    /// Missing fields, including those of nested objects, take their value in `defaults`.
    pub fn load_with_defaults<P: AsRef<Path>>(
        path: P,
        defaults: SimulationConfig,
    ) -> Result<Self, NeuronError> {
        let file = File::open(path).map_err(|e| NeuronError::IOError(e.to_string()))?;
        let reader = BufReader::new(file);
        let overrides: Value =
            serde_json::from_reader(reader).map_err(|e| NeuronError::IOError(e.to_string()))?;
        if !overrides.is_object() {
            return Err(NeuronError::IOError(
                "a simulation configuration must be a JSON object".to_string(),
            ));
        }

        let mut merged =
            serde_json::to_value(defaults).map_err(|e| NeuronError::IOError(e.to_string()))?;
        merge_into(&mut merged, overrides);
        let config: Self =
            serde_json::from_value(merged).map_err(|e| NeuronError::IOError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Recursively overwrite `base` with the fields present in `overrides`.
fn merge_into(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge_into(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}
