//! Command line entry point.
//!
//! `epicity` runs one headless simulation on the grid city and prints the [`RunSummary`] as JSON
//! on stdout. Diagnostics go through the `log` module and never touch stdout.
use std::path::PathBuf;

use clap::{Args, Command, FromArgMatches as _};
use log::info;

use crate::error::EpiCityError;
use crate::log::{set_log_level, LevelFilter};
use crate::parameters::Parameters;
use crate::simulation::{RunSummary, Simulation};

/// Default time limit of a run, in simulation time units.
pub const DEFAULT_MAX_TIME: f64 = 20.0;

/// Default cli arguments for the epicity runner
#[derive(Args, Debug, Clone, PartialEq)]
pub struct BaseArgs {
    /// Random seed
    #[arg(short, long, default_value = "0")]
    pub random_seed: u64,

    /// Optional path for a JSON parameters file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Simulation time at which the run stops if the epidemic has not settled
    #[arg(short, long, default_value_t = DEFAULT_MAX_TIME)]
    pub max_time: f64,

    /// Enable logging at the given level (error, warn, info, debug, trace)
    #[arg(short, long, value_parser = parse_log_level)]
    pub log_level: Option<LevelFilter>,
}

impl Default for BaseArgs {
    fn default() -> Self {
        BaseArgs {
            random_seed: 0,
            config: None,
            max_time: DEFAULT_MAX_TIME,
            log_level: None,
        }
    }
}

fn parse_log_level(level: &str) -> Result<LevelFilter, String> {
    level
        .parse()
        .map_err(|_| format!("unknown log level `{level}`"))
}

fn create_epicity_cli() -> Command {
    let cli = Command::new("epicity").about("Epidemic spread among agents roaming a grid city");
    BaseArgs::augment_args(cli)
}

/// Parses the process arguments and runs one simulation.
///
/// # Errors
/// Returns an error if argument parsing fails or the run cannot be set up.
pub fn run_with_args() -> Result<RunSummary, Box<dyn std::error::Error>> {
    let matches = create_epicity_cli().get_matches();
    let args = BaseArgs::from_arg_matches(&matches)?;
    Ok(run_with_args_internal(&args)?)
}

/// Runs one simulation configured by `args`.
///
/// # Errors
/// Returns an `EpiCityError` if the parameters file cannot be read or parsed, or if the
/// parameters or the time limit are invalid.
pub fn run_with_args_internal(args: &BaseArgs) -> Result<RunSummary, EpiCityError> {
    if let Some(level) = args.log_level {
        set_log_level(level);
    }

    if !args.max_time.is_finite() || args.max_time < 0.0 {
        return Err(EpiCityError::InvalidParameter(format!(
            "max_time must be a non-negative finite number, got {}",
            args.max_time
        )));
    }

    let parameters = match &args.config {
        Some(path) => Parameters::load_from_json(path)?,
        None => Parameters::default(),
    };

    let mut simulation = Simulation::on_grid_city(parameters, args.random_seed)?;
    info!("Running until t={}", args.max_time);
    Ok(simulation.run_until(args.max_time))
}
