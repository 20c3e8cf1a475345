//! Single simulation runs.
use log;
use std::fmt;

use crate::config::SimulationConfig;
use crate::core::current::Current;
use crate::core::detector::{count_spikes, spike_frequency, spike_onsets};
use crate::core::model::{Integrator, RungeKutta4, Trajectory};
use crate::error::NeuronError;
use crate::plot::Plotter;

/// The outcome of integrating the membrane once and counting its spikes.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub trajectory: Trajectory,
    pub num_spikes: usize,
    /// The spike frequency (in Hz with the default configuration).
    pub frequency: f64,
}

/// The report of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleRunReport<F> {
    pub num_spikes: usize,
    pub frequency: f64,
    /// The times at which the counted spikes rose through the threshold.
    pub spike_onsets: Vec<f64>,
    /// The figure produced by the plotter.
    pub figure: F,
}

impl<F> fmt::Display for SingleRunReport<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Number of spikes = {}", self.num_spikes)?;
        write!(f, "Spike frequency = {:.1} Hz", self.frequency)
    }
}

/// Drives the membrane model with a configuration and an integrator.
#[derive(Debug, Clone, PartialEq)]
pub struct Simulator<I: Integrator = RungeKutta4> {
    config: SimulationConfig,
    integrator: I,
}

impl<I: Integrator> Simulator<I> {
    /// Create a new simulator.
    /// Returns an error if the configuration is invalid.
    pub fn build(config: SimulationConfig, integrator: I) -> Result<Self, NeuronError> {
        config.validate()?;
        Ok(Simulator { config, integrator })
    }

    /// Returns the simulation configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Integrate the membrane from the initial state under the current, then count the spikes.
    /// Integration failures are returned as is.
    pub fn simulate(&self, current: &mut dyn Current) -> Result<RunOutcome, NeuronError> {
        let trajectory = self.integrator.integrate(
            self.config.initial_state,
            self.config.duration,
            self.config.time_step,
            &self.config.parameters,
            current,
        )?;

        let voltages = trajectory.scaled_voltages(self.config.voltage_scale);
        let num_spikes = count_spikes(&voltages, self.config.spike_threshold);
        let frequency = spike_frequency(num_spikes, self.config.duration, self.config.rate_scale);

        Ok(RunOutcome {
            trajectory,
            num_spikes,
            frequency,
        })
    }

    /// Simulate the membrane once, plot its trace, and report its spikes.
    pub fn single_run<P: Plotter>(
        &self,
        current: &mut dyn Current,
        plotter: &mut P,
        title: &str,
    ) -> Result<SingleRunReport<P::Figure>, NeuronError> {
        log::info!("Starting single run ({})...", title);

        let outcome = self.simulate(current)?;
        let figure = plotter.plot_trace(&outcome.trajectory, self.config.voltage_scale, title)?;
        let onsets = spike_onsets(
            outcome.trajectory.times(),
            &outcome.trajectory.scaled_voltages(self.config.voltage_scale),
            self.config.spike_threshold,
        );

        log::info!(
            "Single run completed: {} spikes ({:.1} Hz)",
            outcome.num_spikes,
            outcome.frequency
        );

        Ok(SingleRunReport {
            num_spikes: outcome.num_spikes,
            frequency: outcome.frequency,
            spike_onsets: onsets,
            figure,
        })
    }
}
