//! Plotting collaborators.
//!
//! The simulations hand their traces and ensembles to a [`Plotter`] and return whatever figure it
//! produces, without relying on it. [`FigureRecorder`] turns them into serializable figure
//! descriptions which can be saved as JSON and rendered by any external tool.
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::model::Trajectory;
use crate::error::NeuronError;

/// The voltage axis limits of trace figures (in mV).
pub const TRACE_VOLTAGE_LIMITS: (f64, f64) = (-30.0, 100.0);

/// Renders simulation outputs.
pub trait Plotter {
    /// The handle returned for every figure.
    type Figure;

    /// Plot the voltage and recovery traces, both multiplied by `scale`.
    fn plot_trace(
        &mut self,
        trajectory: &Trajectory,
        scale: f64,
        title: &str,
    ) -> Result<Self::Figure, NeuronError>;

    /// Plot the histogram of an ensemble of spike frequencies.
    fn plot_histogram(&mut self, samples: &[f64], title: &str)
        -> Result<Self::Figure, NeuronError>;
}

/// A plotter discarding everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlotter;

impl Plotter for NoPlotter {
    type Figure = ();

    fn plot_trace(&mut self, _: &Trajectory, _: f64, _: &str) -> Result<(), NeuronError> {
        Ok(())
    }

    fn plot_histogram(&mut self, _: &[f64], _: &str) -> Result<(), NeuronError> {
        Ok(())
    }
}

/// A histogram with contiguous bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    /// The bin edges, one more than the number of bins.
    pub edges: Vec<f64>,
    /// The number of samples in each bin.
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin the samples automatically.
    ///
    /// The bin width is the smallest of the Sturges and the Freedman-Diaconis widths, the latter
    /// being ignored when the interquartile range vanishes. If all samples are equal, a single
    /// unit-width bin is centered on them.
    pub fn auto(samples: &[f64]) -> Result<Self, NeuronError> {
        if samples.is_empty() {
            return Err(NeuronError::EmptyEnsemble);
        }
        if samples.iter().any(|x| !x.is_finite()) {
            return Err(NeuronError::InvalidParameter(
                "histogram samples must be finite".to_string(),
            ));
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
        let range = max - min;

        if range == 0.0 {
            return Ok(Histogram {
                edges: vec![min - 0.5, min + 0.5],
                counts: vec![samples.len()],
            });
        }

        let n = sorted.len() as f64;
        let sturges_width = range / (n.log2() + 1.0);
        let iqr = quantile(&sorted, 0.75) - quantile(&sorted, 0.25);
        let fd_width = 2.0 * iqr / n.cbrt();
        let width = if fd_width > 0.0 {
            sturges_width.min(fd_width)
        } else {
            sturges_width
        };

        let num_bins = ((range / width).ceil() as usize).max(1);
        let bin_width = range / num_bins as f64;
        let edges: Vec<f64> = (0..=num_bins)
            .map(|i| min + i as f64 * bin_width)
            .collect();

        let mut counts = vec![0; num_bins];
        for x in sorted {
            // The last bin is closed on the right.
            let i = (((x - min) / bin_width) as usize).min(num_bins - 1);
            counts[i] += 1;
        }

        Ok(Histogram { edges, counts })
    }

    /// Returns the number of bins.
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }
}

/// Linear interpolation quantile of sorted samples.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    sorted[lower] + (position - lower as f64) * (sorted[upper] - sorted[lower])
}

/// A serializable figure description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Figure {
    Trace {
        title: String,
        x_label: String,
        y_label: String,
        x_limits: (f64, f64),
        y_limits: (f64, f64),
        times: Vec<f64>,
        voltages: Vec<f64>,
        recoveries: Vec<f64>,
    },
    Histogram {
        title: String,
        x_label: String,
        y_label: String,
        histogram: Histogram,
    },
}

/// A plotter keeping a copy of every produced figure.
#[derive(Debug, Clone, Default)]
pub struct FigureRecorder {
    figures: Vec<Figure>,
}

impl FigureRecorder {
    pub fn new() -> Self {
        FigureRecorder { figures: vec![] }
    }

    /// Returns the recorded figures.
    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    /// Save the recorded figures to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), NeuronError> {
        let file = File::create(path).map_err(|e| NeuronError::IOError(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.figures)
            .map_err(|e| NeuronError::IOError(e.to_string()))?;
        writer.flush().map_err(|e| NeuronError::IOError(e.to_string()))
    }
}

impl Plotter for FigureRecorder {
    type Figure = Figure;

    fn plot_trace(
        &mut self,
        trajectory: &Trajectory,
        scale: f64,
        title: &str,
    ) -> Result<Figure, NeuronError> {
        let end = trajectory.times().last().copied().unwrap_or(0.0);
        let figure = Figure::Trace {
            title: title.to_string(),
            x_label: "t (ms)".to_string(),
            y_label: "mV".to_string(),
            x_limits: (0.0, end),
            y_limits: TRACE_VOLTAGE_LIMITS,
            times: trajectory.times().to_vec(),
            voltages: trajectory.scaled_voltages(scale),
            recoveries: trajectory.scaled_recoveries(scale),
        };
        self.figures.push(figure.clone());
        Ok(figure)
    }

    fn plot_histogram(&mut self, samples: &[f64], title: &str) -> Result<Figure, NeuronError> {
        let figure = Figure::Histogram {
            title: title.to_string(),
            x_label: "fSpike (Hz)".to_string(),
            y_label: "count".to_string(),
            histogram: Histogram::auto(samples)?,
        };
        self.figures.push(figure.clone());
        Ok(figure)
    }
}
