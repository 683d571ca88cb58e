use base::units::Degrees;
use bsdf::selection::SelectionMode;
use std::{path::PathBuf, str::FromStr};

/// Gonioview command line interface arguments.
#[derive(clap::Parser, Debug)]
#[clap(
    author,
    version,
    about = "Inspection of directionally sampled reflectance measurements."
)]
pub struct CliArgs {
    /// Whether to print verbose information to stdout.
    #[clap(short, long, help = "Use verbose output (log level = 4)")]
    pub verbose: bool,

    /// Whether to show the timestamp in the log.
    #[clap(
        long,
        help = "Show timestamp for each log message in seconds since\nprogram starts"
    )]
    pub log_timestamp: bool,

    /// Verbosity level for the log.
    #[clap(
        long,
        help = "Setting logging verbosity level (higher for more\ndetails)\n  0 - error\n  1 - \
                warn + error\n  2 - info + warn + error\n  3 - debug + info + warn + error\n  4 - \
                trace + debug + info + warn + error\n\x08",
        default_value_t = 1
    )]
    pub log_level: u8,

    /// Path to the user config file. If not specified, gonioview will
    /// look for `gonioview.toml` in the working directory, then in the
    /// system configuration directory.
    #[clap(short, long, help = "Path to the user config file")]
    pub config: Option<PathBuf>,

    /// Command to execute.
    #[clap(subcommand)]
    pub command: SubCommand,
}

/// Gonioview command.
#[derive(clap::Subcommand, Debug)]
pub enum SubCommand {
    /// Prints the configuration and the channels of the sample source.
    #[clap(name = "info")]
    PrintInfo,

    /// Queries one incident direction and prints the channel statistics.
    Query(QueryOptions),

    /// Queries one incident direction and resolves a screen rectangle into
    /// sample points.
    Select(SelectOptions),
}

/// Two comma separated values, e.g. `800,600`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Pair<T>(pub T, pub T);

impl<T: FromStr> FromStr for Pair<T> {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) => {
                let parse = |v: &str| {
                    v.parse::<T>()
                        .map_err(|_| format!("invalid value \"{}\" in \"{}\"", v, s))
                };
                Ok(Self(parse(a)?, parse(b)?))
            },
            _ => Err(format!("expected two comma separated values, got \"{}\"", s)),
        }
    }
}

/// Incident direction and channel shared by the pipeline commands.
#[derive(clap::Args, Debug, Clone)]
pub struct IncidentOptions {
    /// Polar angle of the incident direction, e.g. `30`, `30deg` or `0.5rad`.
    #[arg(long, allow_hyphen_values = true, default_value = "0deg")]
    pub theta: Degrees,

    /// Azimuthal angle of the incident direction.
    #[arg(long, allow_hyphen_values = true, default_value = "0deg")]
    pub phi: Degrees,

    /// Channel to display: 0 is the luminance, 1.. the wavelengths. Indices
    /// past the last channel select the last one.
    #[arg(short = 'k', long, default_value_t = 0)]
    pub channel: usize,

    /// Use the logarithmic height scale instead of the configured one.
    #[arg(long)]
    pub log_scale: bool,
}

/// Options for the `query` command.
#[derive(clap::Args, Debug)]
pub struct QueryOptions {
    #[command(flatten)]
    pub incident: IncidentOptions,

    /// Compute every channel instead of the luminance and the displayed one.
    #[arg(short, long)]
    pub all: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Write the JSON report to this file. Relative paths are resolved
    /// against the configured output directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Options for the `select` command.
#[derive(clap::Args, Debug)]
pub struct SelectOptions {
    #[command(flatten)]
    pub incident: IncidentOptions,

    /// First corner of the selection rectangle, in pixels.
    #[arg(long, value_name = "X,Y")]
    pub from: Pair<f32>,

    /// Opposite corner of the selection rectangle, in pixels.
    #[arg(long, value_name = "X,Y")]
    pub to: Pair<f32>,

    /// How the rectangle combines with the previous selection.
    #[arg(short, long, default_value_t = SelectionMode::Standard)]
    pub mode: SelectionMode,

    /// Size of the canvas the disk is viewed on, from the top.
    #[arg(long, value_name = "W,H", default_value = "800,800")]
    pub canvas: Pair<u32>,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}
