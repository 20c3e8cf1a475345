//! Monte Carlo ensembles of membrane simulations under a noisy forcing current.
use log;
use std::fmt;

use crate::core::current::NoisyCurrent;
use crate::core::model::Integrator;
use crate::core::stats::EnsembleStatistics;
use crate::core::CONFIDENCE_MULTIPLIER;
use crate::error::NeuronError;
use crate::plot::Plotter;
use crate::simulator::driver::Simulator;

/// The report of a Monte Carlo ensemble.
#[derive(Debug, Clone, PartialEq)]
pub struct MonteCarloReport<F> {
    /// The spike frequency of every run, in the order of the runs.
    pub samples: Vec<f64>,
    pub statistics: EnsembleStatistics,
    /// The histogram figure produced by the plotter.
    pub histogram: F,
}

impl<F> fmt::Display for MonteCarloReport<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Number of runs = {}", self.samples.len())?;
        write!(f, "{}", self.statistics)
    }
}

/// A Monte Carlo ensemble of runs driven by one noisy current.
///
/// All runs share the same [`NoisyCurrent`]: its generator is not reset between runs, so a seeded
/// ensemble is reproducible as a whole while every run sees a different noise realization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarlo {
    mean: f64,
    sigma: f64,
    num_runs: usize,
    seed: Option<u64>,
    multiplier: f64,
}

impl MonteCarlo {
    /// Create a new Monte Carlo ensemble of `num_runs` runs around the mean current `mean` with noise
    /// level `sigma`. Without seed, the noise is seeded from the operating system entropy.
    /// Returns an error if there is no run or if the noise parameters are invalid.
    pub fn build(
        mean: f64,
        sigma: f64,
        num_runs: usize,
        seed: Option<u64>,
    ) -> Result<Self, NeuronError> {
        if num_runs < 1 {
            return Err(NeuronError::InvalidParameter(
                "a Monte Carlo ensemble requires at least one run".to_string(),
            ));
        }
        NoisyCurrent::check_parameters(mean, sigma)?;

        Ok(MonteCarlo {
            mean,
            sigma,
            num_runs,
            seed,
            multiplier: CONFIDENCE_MULTIPLIER,
        })
    }

    /// Returns the same ensemble with a confidence interval of `multiplier` standard deviations.
    pub fn with_multiplier(self, multiplier: f64) -> Result<Self, NeuronError> {
        if !(multiplier >= 0.0 && multiplier.is_finite()) {
            return Err(NeuronError::InvalidParameter(format!(
                "the confidence multiplier must be finite and non-negative, got {}",
                multiplier
            )));
        }
        Ok(MonteCarlo { multiplier, ..self })
    }

    /// Returns the number of runs.
    pub fn num_runs(&self) -> usize {
        self.num_runs
    }

    /// Returns the confidence multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Returns the title of the ensemble figures.
    pub fn title(&self) -> String {
        format!("Iamp = {:.3} nA, Isig = {:.3} nA", self.mean, self.sigma)
    }

    /// Run the ensemble sequentially, then summarize and plot the spike frequencies.
    /// The first failing run aborts the whole ensemble.
    pub fn run<I: Integrator, P: Plotter>(
        &self,
        simulator: &Simulator<I>,
        plotter: &mut P,
    ) -> Result<MonteCarloReport<P::Figure>, NeuronError> {
        let mut current = match self.seed {
            Some(seed) => NoisyCurrent::build(self.mean, self.sigma, seed)?,
            None => NoisyCurrent::build_from_entropy(self.mean, self.sigma)?,
        };

        log::info!(
            "Starting Monte Carlo ensemble of {} runs ({})...",
            self.num_runs,
            self.title()
        );

        let mut samples = Vec::with_capacity(self.num_runs);
        for run in 0..self.num_runs {
            let outcome = simulator.simulate(&mut current)?;
            log::debug!(
                "Run {}/{}: {} spikes ({:.1} Hz)",
                run + 1,
                self.num_runs,
                outcome.num_spikes,
                outcome.frequency
            );
            samples.push(outcome.frequency);
        }

        let statistics = EnsembleStatistics::build(&samples, self.multiplier)?;
        let histogram = plotter.plot_histogram(&samples, &self.title())?;

        log::info!(
            "Monte Carlo ensemble completed: mean spike frequency is {:.1} Hz",
            statistics.mean
        );

        Ok(MonteCarloReport {
            samples,
            statistics,
            histogram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::core::current::Current;
    use crate::core::model::{MembraneParameters, MembraneState, RungeKutta4, Trajectory};
    use crate::plot::{Figure, FigureRecorder, NoPlotter};
    use approx::assert_relative_eq;

    /// An integrator spiking once per unit of current above 1.0, sampling the current once.
    struct CurrentToSpikes;

    impl Integrator for CurrentToSpikes {
        fn integrate(
            &self,
            _: MembraneState,
            _: f64,
            step: f64,
            _: &MembraneParameters,
            current: &mut dyn Current,
        ) -> Result<Trajectory, NeuronError> {
            let num_spikes = current.current(0.0).max(0.0).floor() as usize;
            let voltages: Vec<f64> = std::iter::once(0.0)
                .chain((0..num_spikes).flat_map(|_| [1.0, -0.1]))
                .collect();
            let times = (0..voltages.len()).map(|n| n as f64 * step).collect();
            let len = voltages.len();
            Trajectory::build(times, voltages, vec![0.0; len])
        }
    }

    /// An integrator failing on its third call.
    struct FailingOnThirdCall {
        calls: std::cell::Cell<usize>,
    }

    impl Integrator for FailingOnThirdCall {
        fn integrate(
            &self,
            _: MembraneState,
            _: f64,
            step: f64,
            _: &MembraneParameters,
            _: &mut dyn Current,
        ) -> Result<Trajectory, NeuronError> {
            self.calls.set(self.calls.get() + 1);
            if self.calls.get() == 3 {
                return Err(NeuronError::NumericalInstability("diverged".to_string()));
            }
            Trajectory::build(vec![0.0, step], vec![0.0, 0.0], vec![0.0, 0.0])
        }
    }

    #[test]
    fn test_build_invalid() {
        assert!(matches!(
            MonteCarlo::build(3.3, 0.1, 0, Some(0)),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            MonteCarlo::build(3.3, -0.1, 10, Some(0)),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            MonteCarlo::build(f64::NAN, 0.1, 10, None),
            Err(NeuronError::InvalidParameter(_))
        ));
        assert!(matches!(
            MonteCarlo::build(3.3, f64::INFINITY, 10, None),
            Err(NeuronError::InvalidParameter(_))
        ));
        let monte_carlo = MonteCarlo::build(3.3, 0.1, 10, Some(0)).unwrap();
        assert_eq!(monte_carlo.multiplier(), CONFIDENCE_MULTIPLIER);
        assert!(monte_carlo.with_multiplier(-2.0).is_err());
        assert_eq!(monte_carlo.with_multiplier(3.0).unwrap().multiplier(), 3.0);
    }

    #[test]
    fn test_run_shares_one_noise_stream() {
        let config = SimulationConfig::default();
        let simulator = Simulator::build(config, CurrentToSpikes).unwrap();
        let report = MonteCarlo::build(10.0, 3.0, 20, Some(5))
            .unwrap()
            .run(&simulator, &mut NoPlotter)
            .unwrap();

        // The same frequencies are obtained by feeding one noisy current to every run.
        let mut current = NoisyCurrent::build(10.0, 3.0, 5).unwrap();
        let expected: Vec<f64> = (0..20)
            .map(|_| simulator.simulate(&mut current).unwrap().frequency)
            .collect();
        assert_eq!(report.samples, expected);

        // A fresh generator per run would have produced 20 identical samples.
        assert!(report.samples.iter().any(|&x| x != report.samples[0]));
    }

    #[test]
    fn test_run_seeded_reproducibility() {
        let simulator = Simulator::build(SimulationConfig::default(), CurrentToSpikes).unwrap();
        let monte_carlo = MonteCarlo::build(10.0, 3.0, 15, Some(11)).unwrap();
        let report_1 = monte_carlo.run(&simulator, &mut NoPlotter).unwrap();
        let report_2 = monte_carlo.run(&simulator, &mut NoPlotter).unwrap();
        assert_eq!(report_1, report_2);
    }

    #[test]
    fn test_run_statistics() {
        let simulator = Simulator::build(SimulationConfig::default(), CurrentToSpikes).unwrap();
        let mut recorder = FigureRecorder::new();
        let report = MonteCarlo::build(10.0, 3.0, 50, Some(3))
            .unwrap()
            .run(&simulator, &mut recorder)
            .unwrap();
        let stats = report.statistics;

        assert_eq!(report.samples.len(), 50);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert_relative_eq!(
            stats.mean - stats.confidence_interval.0,
            stats.confidence_interval.1 - stats.mean,
            epsilon = 1e-9
        );
        assert_relative_eq!(
            stats.confidence_interval.1 - stats.mean,
            2.0 * stats.std,
            epsilon = 1e-9
        );

        match report.histogram {
            Figure::Histogram {
                title, histogram, ..
            } => {
                assert_eq!(title, "Iamp = 10.000 nA, Isig = 3.000 nA");
                assert_eq!(histogram.counts.iter().sum::<usize>(), 50);
            }
            _ => panic!("expected a histogram figure"),
        }
    }

    #[test]
    fn test_run_single_sample() {
        let simulator = Simulator::build(SimulationConfig::default(), CurrentToSpikes).unwrap();
        let report = MonteCarlo::build(10.0, 3.0, 1, Some(3))
            .unwrap()
            .run(&simulator, &mut NoPlotter)
            .unwrap();
        let stats = report.statistics;
        assert_eq!(stats.min, stats.max);
        assert_eq!(stats.min, stats.mean);
        assert_eq!(stats.confidence_interval, (stats.mean, stats.mean));
    }

    #[test]
    fn test_run_aborts_on_failure() {
        let integrator = FailingOnThirdCall {
            calls: std::cell::Cell::new(0),
        };
        let simulator = Simulator::build(SimulationConfig::default(), integrator).unwrap();
        let result = MonteCarlo::build(3.3, 0.1, 10, Some(0))
            .unwrap()
            .run(&simulator, &mut NoPlotter);
        assert_eq!(
            result,
            Err(NeuronError::NumericalInstability("diverged".to_string()))
        );
    }

    #[test]
    fn test_run_membrane_model() {
        let config = SimulationConfig::default().with_duration(200.0);
        let simulator = Simulator::build(config, RungeKutta4::default()).unwrap();
        let report = MonteCarlo::build(5.0, 0.1, 3, Some(42))
            .unwrap()
            .run(&simulator, &mut NoPlotter)
            .unwrap();
        assert!(report.samples.iter().all(|&f| f > 0.0));
        assert!(report.statistics.min <= report.statistics.mean);
    }
}
