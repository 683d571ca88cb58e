use crate::app::{
    args::QueryOptions,
    cli::{channel_name, load_dataset, pipeline_error, BRIGHT_CYAN, BRIGHT_YELLOW, RESET},
    Config,
};
use base::error::GonioError;
use bsdf::{channel::ChannelStats, dataset::Metadata, BsdfDataset};
use serde::Serialize;

/// Statistics of one computed channel.
#[derive(Debug, Serialize)]
struct ChannelReport {
    channel: usize,
    name: String,
    stats: ChannelStats,
}

/// Summary of one incident-angle query.
#[derive(Debug, Serialize)]
struct QueryReport {
    metadata: Metadata,
    generation: u64,
    active_channel: usize,
    n_faces: usize,
    n_path_segments: usize,
    channels: Vec<ChannelReport>,
}

impl QueryReport {
    fn new(dataset: &BsdfDataset) -> Self {
        let generation = dataset.generation();
        let channels = (0..dataset.n_channels())
            .filter_map(|c| {
                dataset.channel_data(c).map(|data| ChannelReport {
                    channel: c,
                    name: channel_name(dataset, c),
                    stats: *data.stats(),
                })
            })
            .collect();
        Self {
            metadata: dataset.metadata().clone(),
            generation: dataset.generation_id(),
            active_channel: dataset.active_channel(),
            n_faces: generation.map_or(0, |g| g.faces().len()),
            n_path_segments: generation.map_or(0, |g| g.path_segments().len()),
            channels,
        }
    }

    fn print(&self) {
        println!(
            "{BRIGHT_CYAN}{}{RESET} at incident {} ({} points, {} channels)",
            self.metadata.name,
            self.metadata.incident,
            self.metadata.n_points,
            self.metadata.n_channels
        );
        println!(
            "  faces: {}, path segments: {}, active channel: {}",
            self.n_faces, self.n_path_segments, self.active_channel
        );
        for report in &self.channels {
            let s = &report.stats;
            println!(
                "    {BRIGHT_YELLOW}>{RESET} {:>3} {:<10} min {:.6} (#{}) max {:.6} (#{}) avg {:.6}",
                report.channel,
                report.name,
                s.min,
                s.lowest_point_index,
                s.max,
                s.highest_point_index,
                s.average
            );
        }
    }
}

/// Runs one query and reports the statistics of the computed channels.
pub fn query(opts: QueryOptions, config: Config) -> Result<(), GonioError> {
    let mut dataset = load_dataset(&config, &opts.incident)?;
    if opts.all {
        for c in 0..dataset.n_channels() {
            dataset
                .ensure_channel(c)
                .map_err(|err| pipeline_error(err, "Failed to compute channels"))?;
        }
    }
    let report = QueryReport::new(&dataset);
    if opts.json || opts.output.is_some() {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| GonioError::new("Failed to serialize report.", Some(Box::new(err))))?;
        match &opts.output {
            Some(output) => {
                let path = config.output_path(output);
                std::fs::write(&path, json).map_err(|err| {
                    GonioError::from_io_error(
                        err,
                        format!("Failed to write report to {}", path.display()),
                    )
                })?;
                log::info!("Report written to {}", path.display());
            },
            None => println!("{}", json),
        }
    }
    if !opts.json {
        report.print();
    }
    Ok(())
}
