//! This crate provides tools for simulating a two-variable excitable membrane in Rust, counting
//! its spikes, and collecting spike statistics under noisy forcing.
//!
//! # Forcing Currents
//!
//! ```rust
//! use rusty_membrane::core::current::{ConstantCurrent, Current, NoisyCurrent};
//!
//! let mut constant = ConstantCurrent::new(3.3);
//! assert_eq!(constant.current(12.0), 3.3);
//!
//! // Every noisy current owns its own seeded generator
//! let mut noisy_1 = NoisyCurrent::build(3.3, 0.1, 42).unwrap();
//! let mut noisy_2 = NoisyCurrent::build(3.3, 0.1, 42).unwrap();
//! assert_eq!(noisy_1.current(0.0), noisy_2.current(0.0));
//! ```
//!
//! # Counting Spikes
//!
//! ```rust
//! use rusty_membrane::core::detector::count_spikes;
//!
//! let voltages = [0.0, 11.0, 9.0, 11.0, 9.0, 11.0, 1.0, 0.0, -1.0, 0.0, 10.5, 1.0, -1.0, 0.0];
//! assert_eq!(count_spikes(&voltages, 10.0), 2);
//! ```
//!
//! # Monte Carlo Ensembles
//!
//! ```rust
//! use rusty_membrane::config::SimulationConfig;
//! use rusty_membrane::core::model::RungeKutta4;
//! use rusty_membrane::plot::NoPlotter;
//! use rusty_membrane::simulator::driver::Simulator;
//! use rusty_membrane::simulator::monte_carlo::MonteCarlo;
//!
//! let config = SimulationConfig::default();
//! let simulator = Simulator::build(config, RungeKutta4::default()).unwrap();
//!
//! // Ten runs driven by a single seeded noisy current
//! let monte_carlo = MonteCarlo::build(5.0, 0.1, 10, Some(42)).unwrap();
//! let report = monte_carlo.run(&simulator, &mut NoPlotter).unwrap();
//!
//! let stats = report.statistics;
//! assert!(stats.min <= stats.mean && stats.mean <= stats.max);
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod plot;
pub mod simulator;
