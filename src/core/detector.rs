//! Spike detection on a voltage trace.
//!
//! A spike is an excursion that rises through the threshold and then falls back below the
//! [`SPIKE_BASELINE`]. Falling below the threshold alone does not complete a spike, which keeps a
//! trace hovering around the threshold from being counted several times.
//! An excursion still in progress at the end of the trace is not counted.
use itertools::Itertools;

use crate::core::SPIKE_BASELINE;

/// The state of the spike detector between two consecutive samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorState {
    /// Waiting for the voltage to rise through the threshold.
    #[default]
    Idle,
    /// The voltage rose through the threshold and has not yet returned below the baseline.
    Armed,
}

impl DetectorState {
    /// Returns the next state given two consecutive voltage samples, together with a flag
    /// set when the transition completes a spike.
    pub fn step(self, previous: f64, voltage: f64, threshold: f64) -> (Self, bool) {
        if voltage > threshold && previous < threshold {
            // Rising again while armed has no effect.
            (DetectorState::Armed, false)
        } else if self == DetectorState::Armed && voltage < SPIKE_BASELINE {
            (DetectorState::Idle, true)
        } else {
            (self, false)
        }
    }
}

/// Returns the number of complete spikes in the voltage trace.
/// Traces with less than two samples contain no spike.
pub fn count_spikes(voltages: &[f64], threshold: f64) -> usize {
    voltages
        .iter()
        .tuple_windows()
        .fold(
            (DetectorState::Idle, 0_usize),
            |(state, num_spikes), (&previous, &voltage)| {
                let (state, completed) = state.step(previous, voltage, threshold);
                (state, num_spikes + completed as usize)
            },
        )
        .1
}

/// Returns the times at which the complete spikes of the trace rose through the threshold.
/// The times and voltages must have the same length; extra samples of the longer one are ignored.
pub fn spike_onsets(times: &[f64], voltages: &[f64], threshold: f64) -> Vec<f64> {
    let mut state = DetectorState::Idle;
    let mut onset = None;
    let mut onsets = vec![];

    for ((_, &previous), (&time, &voltage)) in times.iter().zip(voltages.iter()).tuple_windows() {
        let (next_state, completed) = state.step(previous, voltage, threshold);
        if state == DetectorState::Idle && next_state == DetectorState::Armed {
            onset = Some(time);
        }
        if completed {
            onsets.extend(onset.take());
        }
        state = next_state;
    }

    onsets
}

/// Returns the spike frequency, i.e., the number of spikes per unit of time multiplied by `rate_scale`.
/// The frequency is exactly zero when there is no spike.
pub fn spike_frequency(num_spikes: usize, duration: f64, rate_scale: f64) -> f64 {
    if num_spikes == 0 {
        0.0
    } else {
        num_spikes as f64 / duration * rate_scale
    }
}
