//! Core module defining the building blocks of the membrane simulations.
//!
//! It consists of the following components:
//!
//! - [`current`]: Forcing currents driving the membrane (constant, periodic, and noisy)
//! - [`detector`]: Spike detection on a voltage trace
//! - [`model`]: Membrane parameters, trajectories, and the integrator seam
//! - [`stats`]: Summary statistics of spike frequency ensembles
//!
//! # Examples
//!
//! ```
//! use rusty_membrane::core::current::{Current, PeriodicCurrent};
//! use rusty_membrane::core::detector::count_spikes;
//!
//! let mut current = PeriodicCurrent::build(2.0, 4.0).unwrap();
//! assert!((current.current(1.0) - 2.0).abs() < 1e-12);
//!
//! let voltages = [0.0, 90.0, 20.0, -5.0];
//! assert_eq!(count_spikes(&voltages, 80.0), 1);
//! ```
pub mod current;
pub mod detector;
pub mod model;
pub mod stats;

/// The baseline the voltage must cross back below for an excursion to count as a spike.
pub const SPIKE_BASELINE: f64 = 0.0;
/// The default multiplier of the standard deviation in the ensemble confidence interval.
pub const CONFIDENCE_MULTIPLIER: f64 = 2.0;
/// The default factor converting raw membrane voltage into millivolts.
pub const VOLTAGE_SCALE: f64 = 1e2;
/// The default spike detection threshold (in millivolts).
pub const SPIKE_THRESHOLD: f64 = 80.0;
/// The default factor converting spikes per millisecond into hertz.
pub const RATE_SCALE: f64 = 1e3;
