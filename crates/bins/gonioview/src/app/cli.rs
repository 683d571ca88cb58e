use crate::app::{
    args::{IncidentOptions, SubCommand},
    Config,
};
use base::{error::GonioError, math::Sph2};
use bsdf::{AnalyticSource, BsdfDataset, HeightScale, SourceError};

pub const BRIGHT_CYAN: &str = "\u{001b}[36m";
pub const BRIGHT_YELLOW: &str = "\u{001b}[33m";
pub const RESET: &str = "\u{001b}[0m";

mod cmd_info;
mod cmd_query;
mod cmd_select;

/// Entry point of gonioview CLI.
pub fn run(cmd: SubCommand, config: Config) -> Result<(), GonioError> {
    match cmd {
        SubCommand::PrintInfo => cmd_info::print_info(config),
        SubCommand::Query(opts) => cmd_query::query(opts, config),
        SubCommand::Select(opts) => cmd_select::select(opts, config),
    }
}

/// Wraps a pipeline error for the command line.
fn pipeline_error(err: SourceError, context: &str) -> GonioError {
    GonioError::new(context, Some(Box::new(err)))
}

/// Builds a dataset on the analytic source, queries the incident direction
/// and activates the requested channel.
fn load_dataset(config: &Config, opts: &IncidentOptions) -> Result<BsdfDataset, GonioError> {
    let mut pipeline = config.pipeline().clone();
    if opts.log_scale {
        pipeline.height_scale = HeightScale::Logarithmic;
    }
    let source = AnalyticSource::new("analytic", config.analytic().clone());
    let mut dataset = BsdfDataset::new(Box::new(source), pipeline);
    let wi = Sph2::new(opts.theta, opts.phi);
    dataset.set_incident_angle(wi).map_err(|err| {
        pipeline_error(err, &format!("Failed to query incident direction {}", wi))
    })?;
    let channel = dataset.set_channel(opts.channel).map_err(|err| {
        pipeline_error(err, &format!("Failed to compute channel {}", opts.channel))
    })?;
    if channel != opts.channel {
        log::warn!(
            "Channel {} out of range, using channel {} instead",
            opts.channel,
            channel
        );
    }
    Ok(dataset)
}

/// Human readable name of a channel.
fn channel_name(dataset: &BsdfDataset, channel: usize) -> String {
    match channel {
        0 => "luminance".to_string(),
        c => dataset
            .metadata()
            .wavelengths
            .get(c - 1)
            .map_or_else(|| format!("channel {}", c), |nm| format!("{} nm", nm)),
    }
}
