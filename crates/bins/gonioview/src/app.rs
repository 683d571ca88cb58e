use base::error::GonioError;

pub(crate) mod args;
pub mod cli;
mod config;

use args::CliArgs;
pub use config::Config;

/// Parses the command line, sets up logging, loads the configuration and
/// executes the requested command.
pub fn run() -> Result<(), GonioError> {
    let (args, launch_time) = base::cli::parse_args::<CliArgs>("gonioview");
    let log_level = if args.verbose { 4 } else { args.log_level };
    base::cli::setup_logging(args.log_timestamp.then_some(launch_time), log_level, &[]);

    let config = Config::load_config(args.config.as_deref())?;
    cli::run(args.command, config)
}
