use clap::{ArgAction, Parser, Subcommand};
use log;
use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::PathBuf;

use rusty_membrane::config::{SimulationConfig, DEFAULT_DURATION, DEFAULT_MONTE_CARLO_DURATION};
use rusty_membrane::core::current::CurrentConfig;
use rusty_membrane::core::model::RungeKutta4;
use rusty_membrane::error::NeuronError;
use rusty_membrane::plot::FigureRecorder;
use rusty_membrane::simulator::diagnostics::{check_count_spikes, check_noisy_current};
use rusty_membrane::simulator::driver::Simulator;
use rusty_membrane::simulator::monte_carlo::MonteCarlo;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Increase the logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Also write the logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// The simulation configuration (JSON); missing fields take their default value
    #[arg(long)]
    config: Option<PathBuf>,
    /// Save the produced figures to this file (JSON)
    #[arg(long)]
    figures: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate the membrane once and count its spikes
    Single {
        /// The current amplitude (or mean, with noise) in nA
        #[arg(long)]
        amplitude: f64,
        /// Make the current sinusoidal with this period in ms
        #[arg(long, conflicts_with = "sigma")]
        period: Option<f64>,
        /// Add Gaussian white noise with this standard deviation in nA
        #[arg(long)]
        sigma: Option<f64>,
        /// The seed of the noise
        #[arg(long, requires = "sigma")]
        seed: Option<u64>,
        /// The simulated duration in ms
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Run a Monte Carlo ensemble under a noisy current
    MonteCarlo {
        /// The mean current in nA
        #[arg(long)]
        amplitude: f64,
        /// The standard deviation of the current noise in nA
        #[arg(long)]
        sigma: f64,
        /// The number of runs
        #[arg(short = 'n', long, default_value = "100")]
        runs: usize,
        /// The seed of the noise
        #[arg(long)]
        seed: Option<u64>,
        /// The number of standard deviations in the confidence interval
        #[arg(long, default_value = "2.0")]
        multiplier: f64,
        /// The simulated duration of every run in ms
        #[arg(long)]
        duration: Option<f64>,
    },
    /// Check the spike detector and the noisy current
    SelfTest {
        /// The number of noisy current samples
        #[arg(long, default_value = "1000000")]
        samples: usize,
        /// The seed of the noise
        #[arg(long, default_value = "0")]
        seed: u64,
    },
}

fn init_logging(verbose: u8, log_file: Option<&PathBuf>) -> Result<(), NeuronError> {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
        .build();
    let mut config =
        Config::builder().appender(Appender::builder().build("stderr", Box::new(stderr)));
    let mut root = Root::builder().appender("stderr");

    if let Some(path) = log_file {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} {l} - {m}\n")))
            .build(path)
            .map_err(|e| NeuronError::IOError(e.to_string()))?;
        config = config.appender(Appender::builder().build("logfile", Box::new(logfile)));
        root = root.appender("logfile");
    }

    let config = config
        .build(root.build(level))
        .map_err(|e| NeuronError::IOError(e.to_string()))?;
    log4rs::init_config(config).map_err(|e| NeuronError::IOError(e.to_string()))?;
    Ok(())
}

/// Resolve the simulation configuration of a subcommand.
/// The duration comes from the command line, else from the file, else from `default_duration`.
fn resolve_config(
    path: Option<&PathBuf>,
    default_duration: f64,
    duration: Option<f64>,
) -> Result<SimulationConfig, NeuronError> {
    let defaults = SimulationConfig::default().with_duration(default_duration);
    let config = match path {
        Some(path) => SimulationConfig::load_with_defaults(path, defaults)?,
        None => defaults,
    };
    Ok(match duration {
        Some(duration) => config.with_duration(duration),
        None => config,
    })
}

fn main() -> Result<(), NeuronError> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_file.as_ref())?;
    log::debug!("{:?}", args);

    let mut recorder = FigureRecorder::new();

    match args.command {
        Command::Single {
            amplitude,
            period,
            sigma,
            seed,
            duration,
        } => {
            let config = resolve_config(args.config.as_ref(), DEFAULT_DURATION, duration)?;
            let current_config = match (period, sigma) {
                (Some(period), _) => CurrentConfig::Periodic { amplitude, period },
                (None, Some(sigma)) => CurrentConfig::Noisy {
                    mean: amplitude,
                    sigma,
                    seed,
                },
                (None, None) => CurrentConfig::Constant { amplitude },
            };
            let mut current = current_config.build()?;

            let simulator = Simulator::build(config, RungeKutta4::default())?;
            let report =
                simulator.single_run(current.as_mut(), &mut recorder, &current_config.label())?;
            println!("{}", report);
        }
        Command::MonteCarlo {
            amplitude,
            sigma,
            runs,
            seed,
            multiplier,
            duration,
        } => {
            let config =
                resolve_config(args.config.as_ref(), DEFAULT_MONTE_CARLO_DURATION, duration)?;

            let simulator = Simulator::build(config, RungeKutta4::default())?;
            let monte_carlo =
                MonteCarlo::build(amplitude, sigma, runs, seed)?.with_multiplier(multiplier)?;
            let report = monte_carlo.run(&simulator, &mut recorder)?;
            println!("{}", report);
        }
        Command::SelfTest { samples, seed } => {
            println!("{}", check_count_spikes());
            println!();
            print!("{}", check_noisy_current(100.0, 4.0, samples, seed)?);
        }
    }

    if let Some(path) = &args.figures {
        recorder.save_to(path)?;
        log::info!("Figures saved to {}", path.display());
    }

    Ok(())
}
