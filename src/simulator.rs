//! Simulation framework for the excitable membrane.
//!
//! This module provides three components:
//! - [`driver`]: Single simulation runs under a given forcing current.
//! - [`monte_carlo`]: Ensembles of runs under a noisy forcing current.
//! - [`diagnostics`]: Self-tests of the spike detector and of the noisy current.
//!
//! # Example
//! ```rust
//! use rusty_membrane::config::SimulationConfig;
//! use rusty_membrane::core::current::ConstantCurrent;
//! use rusty_membrane::core::model::RungeKutta4;
//! use rusty_membrane::plot::NoPlotter;
//! use rusty_membrane::simulator::driver::Simulator;
//!
//! let simulator = Simulator::build(SimulationConfig::default(), RungeKutta4::default()).unwrap();
//! let mut current = ConstantCurrent::new(0.556);
//! let report = simulator.single_run(&mut current, &mut NoPlotter, "Iamp = 0.556 nA").unwrap();
//! assert_eq!(report.num_spikes, 0);
//! assert_eq!(report.frequency, 0.0);
//! ```

pub mod diagnostics;
pub mod driver;
pub mod monte_carlo;
