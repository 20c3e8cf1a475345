//! Self-tests of the spike detector and of the noisy current.
use log;
use std::fmt;

use crate::core::current::{Current, NoisyCurrent};
use crate::core::detector::count_spikes;
use crate::error::NeuronError;

/// The reference trace of the spike detector self-test, with a threshold of 10.
pub const REFERENCE_TRACE: [f64; 14] = [
    0.0, 11.0, 9.0, 11.0, 9.0, 11.0, 1.0, 0.0, -1.0, 0.0, 10.5, 1.0, -1.0, 0.0,
];
/// The threshold of the spike detector self-test.
pub const REFERENCE_THRESHOLD: f64 = 10.0;
/// The number of spikes in the reference trace.
pub const REFERENCE_NUM_SPIKES: usize = 2;

/// The number of standard errors accepted around the expected mean and variance.
const NUM_STANDARD_ERRORS: f64 = 3.0;

/// The outcome of the spike detector self-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorCheck {
    pub num_spikes: usize,
    pub expected: usize,
}

impl DetectorCheck {
    pub fn passed(&self) -> bool {
        self.num_spikes == self.expected
    }
}

impl fmt::Display for DetectorCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Testing count_spikes:")?;
        writeln!(f, "   nSpikes = {}", self.num_spikes)?;
        if self.passed() {
            write!(f, "   Result is correct!")
        } else {
            write!(
                f,
                "   Result is incorrect: answer should be {}",
                self.expected
            )
        }
    }
}

/// Count the spikes of the reference trace.
pub fn check_count_spikes() -> DetectorCheck {
    let check = DetectorCheck {
        num_spikes: count_spikes(&REFERENCE_TRACE, REFERENCE_THRESHOLD),
        expected: REFERENCE_NUM_SPIKES,
    };
    log::info!("Spike detector self-test: {} spikes counted", check.num_spikes);
    check
}

/// An observed value together with its acceptance interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalCheck {
    pub observed: f64,
    pub low: f64,
    pub high: f64,
}

impl IntervalCheck {
    pub fn passed(&self) -> bool {
        self.low < self.observed && self.observed < self.high
    }
}

/// The outcome of the noisy current self-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseCheck {
    pub mean: IntervalCheck,
    pub variance: IntervalCheck,
}

impl NoiseCheck {
    pub fn passed(&self) -> bool {
        self.mean.passed() && self.variance.passed()
    }
}

impl fmt::Display for NoiseCheck {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, check) in [("mean", &self.mean), ("var", &self.variance)] {
            writeln!(
                f,
                "Testing if observed {} of the noisy current is within 99.7% confidence",
                name
            )?;
            writeln!(
                f,
                "Confidence interval = [{:.5e}, {:.5e}]",
                check.low, check.high
            )?;
            writeln!(f, "Observed {} I = {:.5e}", name, check.observed)?;
            if check.passed() {
                writeln!(f, "PASSED TEST")?;
            } else {
                writeln!(f, "FAILED TEST")?;
            }
        }
        Ok(())
    }
}

/// Sample a noisy current `num_samples` times and check that the empirical mean and the unbiased
/// empirical variance fall within three standard errors of their expected values.
pub fn check_noisy_current(
    mean: f64,
    sigma: f64,
    num_samples: usize,
    seed: u64,
) -> Result<NoiseCheck, NeuronError> {
    if num_samples < 2 {
        return Err(NeuronError::InvalidParameter(
            "the noisy current self-test requires at least two samples".to_string(),
        ));
    }
    let mut current = NoisyCurrent::build(mean, sigma, seed)?;
    let samples: Vec<f64> = (0..num_samples)
        .map(|i| current.current(i as f64))
        .collect();

    let n = num_samples as f64;
    let observed_mean = samples.iter().sum::<f64>() / n;
    let observed_variance = samples
        .iter()
        .map(|x| (x - observed_mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);

    let mean_error = NUM_STANDARD_ERRORS * sigma / n.sqrt();
    let variance = sigma * sigma;
    let variance_error = NUM_STANDARD_ERRORS * variance * (2.0 / (n - 1.0)).sqrt();

    let check = NoiseCheck {
        mean: IntervalCheck {
            observed: observed_mean,
            low: mean - mean_error,
            high: mean + mean_error,
        },
        variance: IntervalCheck {
            observed: observed_variance,
            low: variance - variance_error,
            high: variance + variance_error,
        },
    };
    log::info!(
        "Noisy current self-test over {} samples: mean {} and variance {}",
        num_samples,
        observed_mean,
        observed_variance
    );
    Ok(check)
}
