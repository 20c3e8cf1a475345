//! Two-variable excitable membrane model and its numerical integration.
//!
//! The membrane voltage `V` and the recovery variable `W` evolve as
//!
//! ```text
//! dV/dt = (V (1 - V) (V - Vs) - W) / tauV + I(t)
//! dW/dt = (alpha V - W) / tauW
//! ```
//!
//! where `I(t)` is a forcing [`Current`].
use log;
use serde::{Deserialize, Serialize};

use crate::core::current::Current;
use crate::error::NeuronError;

/// The default number of Runge-Kutta substeps per output step.
pub const DEFAULT_SUBSTEPS: usize = 10;

/// The constants of the membrane model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MembraneParameters {
    /// The reference voltage of the cubic nonlinearity.
    pub v_s: f64,
    /// The time constant of the membrane voltage (in ms).
    pub tau_v: f64,
    /// The time constant of the recovery variable (in ms).
    pub tau_w: f64,
    /// The coupling from the voltage to the recovery variable.
    pub alpha: f64,
}

impl Default for MembraneParameters {
    fn default() -> Self {
        MembraneParameters {
            v_s: 0.25,
            tau_v: 5e-2,
            tau_w: 1e1,
            alpha: 1.25,
        }
    }
}

impl MembraneParameters {
    /// Returns an error if any constant is not finite or if a time constant is not positive.
    pub fn validate(&self) -> Result<(), NeuronError> {
        if [self.v_s, self.tau_v, self.tau_w, self.alpha]
            .iter()
            .any(|x| !x.is_finite())
        {
            return Err(NeuronError::InvalidParameter(
                "membrane parameters must be finite".to_string(),
            ));
        }
        if self.tau_v <= 0.0 || self.tau_w <= 0.0 {
            return Err(NeuronError::InvalidParameter(format!(
                "time constants must be positive, got tau_v = {} and tau_w = {}",
                self.tau_v, self.tau_w
            )));
        }
        Ok(())
    }

    /// Returns the time derivatives of the state under the given current.
    pub fn derivatives(&self, state: &MembraneState, current: f64) -> MembraneState {
        let MembraneState { v, w } = *state;
        MembraneState {
            v: (v * (1.0 - v) * (v - self.v_s) - w) / self.tau_v + current,
            w: (self.alpha * v - w) / self.tau_w,
        }
    }
}

/// The state of the membrane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MembraneState {
    /// The membrane voltage.
    pub v: f64,
    /// The recovery variable.
    pub w: f64,
}

impl MembraneState {
    pub fn new(v: f64, w: f64) -> Self {
        MembraneState { v, w }
    }

    fn add_scaled(&self, other: &MembraneState, h: f64) -> MembraneState {
        MembraneState {
            v: self.v + h * other.v,
            w: self.w + h * other.w,
        }
    }

    fn is_finite(&self) -> bool {
        self.v.is_finite() && self.w.is_finite()
    }
}

/// A uniformly sampled solution of the membrane model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    voltages: Vec<f64>,
    recoveries: Vec<f64>,
}

impl Trajectory {
    /// Create a new trajectory.
    /// Returns an error if the three series do not have the same length.
    pub fn build(
        times: Vec<f64>,
        voltages: Vec<f64>,
        recoveries: Vec<f64>,
    ) -> Result<Self, NeuronError> {
        if times.len() != voltages.len() || times.len() != recoveries.len() {
            return Err(NeuronError::InvalidParameter(format!(
                "trajectory series must have the same length, got {}, {} and {}",
                times.len(),
                voltages.len(),
                recoveries.len()
            )));
        }
        Ok(Trajectory {
            times,
            voltages,
            recoveries,
        })
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Returns the sampling times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Returns the membrane voltages.
    pub fn voltages(&self) -> &[f64] {
        &self.voltages
    }

    /// Returns the recovery variables.
    pub fn recoveries(&self) -> &[f64] {
        &self.recoveries
    }

    /// Returns the membrane voltages multiplied by `scale`.
    pub fn scaled_voltages(&self, scale: f64) -> Vec<f64> {
        self.voltages.iter().map(|v| v * scale).collect()
    }

    /// Returns the recovery variables multiplied by `scale`.
    pub fn scaled_recoveries(&self, scale: f64) -> Vec<f64> {
        self.recoveries.iter().map(|w| w * scale).collect()
    }
}

/// Solves the membrane model over a time horizon.
pub trait Integrator {
    /// Returns the trajectory starting from `initial` and sampled every `step` up to `duration`.
    /// Calling it with a stochastic current advances the current once per sample.
    fn integrate(
        &self,
        initial: MembraneState,
        duration: f64,
        step: f64,
        parameters: &MembraneParameters,
        current: &mut dyn Current,
    ) -> Result<Trajectory, NeuronError>;
}

/// A fixed-step fourth order Runge-Kutta integrator.
/// The current is evaluated once at the start of every output step and held over the step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RungeKutta4 {
    substeps: usize,
}

impl Default for RungeKutta4 {
    fn default() -> Self {
        RungeKutta4 {
            substeps: DEFAULT_SUBSTEPS,
        }
    }
}

impl RungeKutta4 {
    /// Create a new integrator splitting every output step into `substeps` Runge-Kutta steps.
    /// Returns an error if the number of substeps is zero.
    pub fn build(substeps: usize) -> Result<Self, NeuronError> {
        if substeps == 0 {
            return Err(NeuronError::InvalidParameter(
                "the number of substeps must be positive".to_string(),
            ));
        }
        Ok(RungeKutta4 { substeps })
    }

    /// Returns the number of substeps per output step.
    pub fn substeps(&self) -> usize {
        self.substeps
    }

    fn advance(
        state: &MembraneState,
        h: f64,
        parameters: &MembraneParameters,
        current: f64,
    ) -> MembraneState {
        let k1 = parameters.derivatives(state, current);
        let k2 = parameters.derivatives(&state.add_scaled(&k1, h / 2.0), current);
        let k3 = parameters.derivatives(&state.add_scaled(&k2, h / 2.0), current);
        let k4 = parameters.derivatives(&state.add_scaled(&k3, h), current);
        MembraneState {
            v: state.v + h / 6.0 * (k1.v + 2.0 * k2.v + 2.0 * k3.v + k4.v),
            w: state.w + h / 6.0 * (k1.w + 2.0 * k2.w + 2.0 * k3.w + k4.w),
        }
    }
}

impl Integrator for RungeKutta4 {
    fn integrate(
        &self,
        initial: MembraneState,
        duration: f64,
        step: f64,
        parameters: &MembraneParameters,
        current: &mut dyn Current,
    ) -> Result<Trajectory, NeuronError> {
        if !(duration > 0.0 && duration.is_finite()) || !(step > 0.0) || step > duration {
            return Err(NeuronError::InvalidParameter(format!(
                "invalid time horizon: duration = {} and step = {}",
                duration, step
            )));
        }
        parameters.validate()?;

        let num_steps = (duration / step).round() as usize;
        let h = step / self.substeps as f64;

        let mut times = Vec::with_capacity(num_steps + 1);
        let mut voltages = Vec::with_capacity(num_steps + 1);
        let mut recoveries = Vec::with_capacity(num_steps + 1);

        let mut state = initial;
        times.push(0.0);
        voltages.push(state.v);
        recoveries.push(state.w);

        for n in 0..num_steps {
            let t = n as f64 * step;
            let i = current.current(t);
            for _ in 0..self.substeps {
                state = Self::advance(&state, h, parameters, i);
            }
            if !state.is_finite() {
                return Err(NeuronError::NumericalInstability(format!(
                    "non-finite membrane state at t = {} (V = {}, W = {})",
                    t + step,
                    state.v,
                    state.w
                )));
            }
            times.push((n + 1) as f64 * step);
            voltages.push(state.v);
            recoveries.push(state.w);
        }

        log::trace!(
            "Integrated {} steps of {} ms ({} substeps each)",
            num_steps,
            step,
            self.substeps
        );

        Trajectory::build(times, voltages, recoveries)
    }
}
