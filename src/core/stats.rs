//! Summary statistics of spike frequency ensembles.
use itertools::{Itertools, MinMaxResult};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NeuronError;

/// Statistics of an ensemble of spike frequencies.
///
/// The standard deviation is the population one (normalized by the number of samples).
/// The confidence interval is `mean +/- k std`: it describes the spread of the individual samples,
/// not the uncertainty on the mean, hence it does not shrink with the ensemble size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnsembleStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    /// The lower and upper bounds of the confidence interval.
    pub confidence_interval: (f64, f64),
}

impl EnsembleStatistics {
    /// Compute the statistics of the samples, with a confidence interval of `multiplier` standard deviations.
    /// Returns an error if there is no sample, if a sample is not finite, or if the multiplier is negative.
    pub fn build(samples: &[f64], multiplier: f64) -> Result<Self, NeuronError> {
        if !(multiplier >= 0.0 && multiplier.is_finite()) {
            return Err(NeuronError::InvalidParameter(format!(
                "the confidence multiplier must be finite and non-negative, got {}",
                multiplier
            )));
        }
        if samples.iter().any(|x| !x.is_finite()) {
            return Err(NeuronError::InvalidParameter(
                "ensemble samples must be finite".to_string(),
            ));
        }

        let (min, max) = match samples.iter().copied().minmax() {
            MinMaxResult::NoElements => return Err(NeuronError::EmptyEnsemble),
            MinMaxResult::OneElement(x) => (x, x),
            MinMaxResult::MinMax(min, max) => (min, max),
        };

        let n = samples.len() as f64;
        // Clamp against rounding so that min <= mean <= max always holds.
        let mean = (samples.iter().sum::<f64>() / n).clamp(min, max);
        let std = (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();

        Ok(EnsembleStatistics {
            min,
            max,
            mean,
            std,
            confidence_interval: (mean - multiplier * std, mean + multiplier * std),
        })
    }
}

impl fmt::Display for EnsembleStatistics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Min spike frequency = {:.1} Hz", self.min)?;
        writeln!(f, "Max spike frequency = {:.1} Hz", self.max)?;
        writeln!(f, "Mean spike frequency = {:.1} Hz", self.mean)?;
        write!(
            f,
            "Confidence interval = [{:.1}, {:.1}] Hz",
            self.confidence_interval.0, self.confidence_interval.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_statistics() {
        let stats = EnsembleStatistics::build(&[80.0, 84.0, 82.0, 86.0], 2.0).unwrap();
        assert_eq!(stats.min, 80.0);
        assert_eq!(stats.max, 86.0);
        assert_relative_eq!(stats.mean, 83.0);
        assert_relative_eq!(stats.std, 5_f64.sqrt());
        assert_relative_eq!(stats.confidence_interval.0, 83.0 - 2.0 * 5_f64.sqrt());
        assert_relative_eq!(stats.confidence_interval.1, 83.0 + 2.0 * 5_f64.sqrt());
    }

    #[test]
    fn test_statistics_single_sample() {
        let stats = EnsembleStatistics::build(&[42.0], 2.0).unwrap();
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std, 0.0);
        assert_eq!(stats.confidence_interval, (42.0, 42.0));
    }

    #[test]
    fn test_statistics_constant_samples() {
        let samples = vec![0.1; 7];
        let stats = EnsembleStatistics::build(&samples, 2.0).unwrap();
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert_eq!(stats.mean, 0.1);
    }

    #[test]
    fn test_statistics_symmetric_interval() {
        let stats = EnsembleStatistics::build(&[1.0, 7.0, 2.5, 30.0, 11.0], 3.0).unwrap();
        assert_relative_eq!(
            stats.mean - stats.confidence_interval.0,
            stats.confidence_interval.1 - stats.mean
        );
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
    }

    #[test]
    fn test_statistics_invalid() {
        assert_eq!(
            EnsembleStatistics::build(&[], 2.0),
            Err(NeuronError::EmptyEnsemble)
        );
        assert!(matches!(
            EnsembleStatistics::build(&[1.0], -1.0),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            EnsembleStatistics::build(&[1.0, f64::NAN], 2.0),
            Err(NeuronError::InvalidParameter(_))
        ));
    }
}
