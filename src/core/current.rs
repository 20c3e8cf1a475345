//! Forcing currents driving the membrane model.
//!
//! Every current implements [`Current`], i.e., it maps a simulated time to a current value (in nA).
//! Only [`NoisyCurrent`] carries mutable state: the stream position of its own random number generator.
use derivative::Derivative;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::NeuronError;

/// A time-indexed forcing current.
pub trait Current {
    /// Returns the current at time `t`.
    /// Stochastic currents advance their internal generator on every call.
    fn current(&mut self, t: f64) -> f64;
}

/// A current with a fixed amplitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantCurrent {
    amplitude: f64,
}

impl ConstantCurrent {
    pub fn new(amplitude: f64) -> Self {
        ConstantCurrent { amplitude }
    }

    /// Returns the amplitude of the current.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }
}

impl Current for ConstantCurrent {
    fn current(&mut self, _t: f64) -> f64 {
        self.amplitude
    }
}

/// A sinusoidal current `amplitude * sin(2 pi t / period)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodicCurrent {
    amplitude: f64,
    period: f64,
}

impl PeriodicCurrent {
    /// Create a new sinusoidal current.
    /// Returns an error if the period is zero or not finite.
    pub fn build(amplitude: f64, period: f64) -> Result<Self, NeuronError> {
        if !period.is_finite() || period == 0.0 {
            return Err(NeuronError::InvalidParameter(format!(
                "the period of a periodic current must be finite and nonzero, got {}",
                period
            )));
        }

        Ok(PeriodicCurrent { amplitude, period })
    }

    /// Returns the amplitude of the current.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Returns the period of the current.
    pub fn period(&self) -> f64 {
        self.period
    }
}

impl Current for PeriodicCurrent {
    fn current(&mut self, t: f64) -> f64 {
        self.amplitude * (2.0 * PI * t / self.period).sin()
    }
}

/// A constant current corrupted by Gaussian white noise.
/// Each instance owns its random number generator, so two noisy currents never share a stream.
#[derive(Derivative)]
#[derivative(Debug, PartialEq)]
pub struct NoisyCurrent {
    mean: f64,
    sigma: f64,
    /// The Gaussian sampler.
    #[derivative(PartialEq = "ignore")]
    sampler: Normal<f64>,
    /// The random number generator.
    #[derivative(Debug = "ignore", PartialEq = "ignore")]
    rng: ChaCha8Rng,
}

impl NoisyCurrent {
    /// Create a new noisy current whose generator is seeded with `seed`.
    /// Returns an error if the standard deviation is negative or not finite.
    pub fn build(mean: f64, sigma: f64, seed: u64) -> Result<Self, NeuronError> {
        Self::build_with_rng(mean, sigma, ChaCha8Rng::seed_from_u64(seed))
    }

    /// Create a new noisy current whose generator is seeded from the operating system entropy.
    pub fn build_from_entropy(mean: f64, sigma: f64) -> Result<Self, NeuronError> {
        Self::build_with_rng(mean, sigma, ChaCha8Rng::from_entropy())
    }

    /// Check the parameters of a noisy current without building one.
    /// Returns an error if the mean is not finite or if the standard deviation is negative or not finite.
    pub fn check_parameters(mean: f64, sigma: f64) -> Result<(), NeuronError> {
        if !mean.is_finite() {
            return Err(NeuronError::InvalidParameter(format!(
                "the mean of a noisy current must be finite, got {}",
                mean
            )));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(NeuronError::InvalidParameter(format!(
                "the standard deviation of a noisy current must be finite and non-negative, got {}",
                sigma
            )));
        }
        Ok(())
    }

    fn build_with_rng(mean: f64, sigma: f64, rng: ChaCha8Rng) -> Result<Self, NeuronError> {
        Self::check_parameters(mean, sigma)?;
        let sampler =
            Normal::new(mean, sigma).map_err(|e| NeuronError::InvalidParameter(e.to_string()))?;

        Ok(NoisyCurrent {
            mean,
            sigma,
            sampler,
            rng,
        })
    }

    /// Returns the mean of the current.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Returns the standard deviation of the noise.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
}

impl Current for NoisyCurrent {
    fn current(&mut self, _t: f64) -> f64 {
        self.sampler.sample(&mut self.rng)
    }
}

/// A serializable description of a forcing current.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurrentConfig {
    Constant { amplitude: f64 },
    Periodic { amplitude: f64, period: f64 },
    Noisy { mean: f64, sigma: f64, seed: Option<u64> },
}

impl CurrentConfig {
    /// Build the described current.
    pub fn build(&self) -> Result<Box<dyn Current>, NeuronError> {
        let current: Box<dyn Current> = match *self {
            CurrentConfig::Constant { amplitude } => Box::new(ConstantCurrent::new(amplitude)),
            CurrentConfig::Periodic { amplitude, period } => {
                Box::new(PeriodicCurrent::build(amplitude, period)?)
            }
            CurrentConfig::Noisy { mean, sigma, seed } => match seed {
                Some(seed) => Box::new(NoisyCurrent::build(mean, sigma, seed)?),
                None => Box::new(NoisyCurrent::build_from_entropy(mean, sigma)?),
            },
        };
        Ok(current)
    }

    /// A short human-readable label, e.g., for figure titles.
    pub fn label(&self) -> String {
        match self {
            CurrentConfig::Constant { amplitude } => format!("Iamp = {:.3} nA", amplitude),
            CurrentConfig::Periodic { amplitude, period } => {
                format!("Iamp = {:.3} nA, Iperiod = {:.3} ms", amplitude, period)
            }
            CurrentConfig::Noisy { mean, sigma, .. } => {
                format!("Iamp = {:.3} nA, Isig = {:.3} nA", mean, sigma)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constant_current() {
        let mut current = ConstantCurrent::new(3.3);
        assert_eq!(current.current(0.0), 3.3);
        assert_eq!(current.current(-12.0), 3.3);
        assert_eq!(current.current(1e6), 3.3);
    }

    #[test]
    fn test_periodic_current() {
        let mut current = PeriodicCurrent::build(2.0, 8.0).unwrap();
        assert_relative_eq!(current.current(0.0), 0.0);
        assert_relative_eq!(current.current(2.0), 2.0);
        assert_relative_eq!(current.current(6.0), -2.0);
        assert!(current.current(4.0).abs() < 1e-12);
        assert!(current.current(8.0).abs() < 1e-12);
    }

    #[test]
    fn test_periodic_current_invalid_period() {
        assert!(matches!(
            PeriodicCurrent::build(1.0, 0.0),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            PeriodicCurrent::build(1.0, f64::NAN),
            Err(NeuronError::InvalidParameter(_))
        ));
        // A negative period only flips the phase.
        assert!(PeriodicCurrent::build(1.0, -4.0).is_ok());
    }

    #[test]
    fn test_noisy_current_invalid_sigma() {
        assert!(matches!(
            NoisyCurrent::build(1.0, -0.1, 0),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            NoisyCurrent::build(1.0, f64::INFINITY, 0),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            NoisyCurrent::build(f64::NAN, 1.0, 0),
            Err(NeuronError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_noisy_current_check_parameters() {
        assert!(NoisyCurrent::check_parameters(3.3, 0.0).is_ok());
        assert!(NoisyCurrent::check_parameters(-1.0, 2.0).is_ok());
        assert!(matches!(
            NoisyCurrent::check_parameters(f64::NAN, 1.0),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            NoisyCurrent::check_parameters(1.0, -1e-9),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            NoisyCurrent::check_parameters(1.0, f64::NAN),
            Err(NeuronError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_noisy_current_zero_sigma() {
        let mut current = NoisyCurrent::build(3.3, 0.0, 7).unwrap();
        for i in 0..100 {
            assert_eq!(current.current(i as f64), 3.3);
        }
    }

    #[test]
    fn test_noisy_current_seeded_reproducibility() {
        let mut current_1 = NoisyCurrent::build(0.0, 1.0, 42).unwrap();
        let mut current_2 = NoisyCurrent::build(0.0, 1.0, 42).unwrap();
        let samples_1: Vec<f64> = (0..50).map(|i| current_1.current(i as f64)).collect();
        let samples_2: Vec<f64> = (0..50).map(|i| current_2.current(i as f64)).collect();
        assert_eq!(samples_1, samples_2);
    }

    #[test]
    fn test_noisy_current_independent_streams() {
        let mut current_1 = NoisyCurrent::build(0.0, 1.0, 1).unwrap();
        let mut current_2 = NoisyCurrent::build(0.0, 1.0, 2).unwrap();
        let samples_1: Vec<f64> = (0..50).map(|i| current_1.current(i as f64)).collect();
        let samples_2: Vec<f64> = (0..50).map(|i| current_2.current(i as f64)).collect();
        assert_ne!(samples_1, samples_2);

        // Drawing from one instance does not advance the other.
        let mut current_3 = NoisyCurrent::build(0.0, 1.0, 1).unwrap();
        let mut current_4 = NoisyCurrent::build(0.0, 1.0, 1).unwrap();
        (0..10).for_each(|i| {
            current_3.current(i as f64);
        });
        let first = current_4.current(0.0);
        assert_eq!(first, samples_1[0]);
    }

    #[test]
    fn test_noisy_current_statistics() {
        let (mean, sigma) = (100.0, 4.0);
        let num_samples = 100_000;
        let mut current = NoisyCurrent::build(mean, sigma, 17).unwrap();
        let samples: Vec<f64> = (0..num_samples).map(|i| current.current(i as f64)).collect();

        let n = num_samples as f64;
        let empirical_mean = samples.iter().sum::<f64>() / n;
        let empirical_var = samples
            .iter()
            .map(|x| (x - empirical_mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);

        // Within three standard errors of the mean and of the unbiased variance.
        assert!((empirical_mean - mean).abs() < 3.0 * sigma / n.sqrt());
        let var = sigma * sigma;
        assert!((empirical_var - var).abs() < 3.0 * var * (2.0 / (n - 1.0)).sqrt());
    }

    #[test]
    fn test_current_config_build() {
        let mut current = CurrentConfig::Constant { amplitude: 0.5 }.build().unwrap();
        assert_eq!(current.current(10.0), 0.5);

        let mut current = CurrentConfig::Noisy {
            mean: 1.0,
            sigma: 0.0,
            seed: None,
        }
        .build()
        .unwrap();
        assert_eq!(current.current(10.0), 1.0);

        assert!(CurrentConfig::Periodic {
            amplitude: 1.0,
            period: 0.0
        }
        .build()
        .is_err());
    }

    #[test]
    fn test_current_config_serde() {
        let config: CurrentConfig =
            serde_json::from_str(r#"{"kind": "noisy", "mean": 3.3, "sigma": 0.1, "seed": 42}"#)
                .unwrap();
        assert_eq!(
            config,
            CurrentConfig::Noisy {
                mean: 3.3,
                sigma: 0.1,
                seed: Some(42)
            }
        );
        assert_eq!(config.label(), "Iamp = 3.300 nA, Isig = 0.100 nA");
    }
}
