use crate::app::{
    args::SelectOptions,
    cli::{channel_name, load_dataset, pipeline_error, BRIGHT_CYAN, BRIGHT_YELLOW, RESET},
    Config,
};
use base::{
    error::GonioError,
    math::{Mat4, UVec2, Vec2, Vec3},
};
use bsdf::selection::{SelectionBox, SelectionStats};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SelectionReport {
    active_channel: usize,
    channel_name: String,
    selected: Vec<usize>,
    stats: SelectionStats,
    center: Option<Vec3>,
    /// `(wavelength, value)` pairs at the highest selected point.
    spectrum: Vec<(f32, f32)>,
}

/// View of the unit disk from above, fitted into the canvas.
pub fn top_down_mvp(canvas: UVec2) -> Mat4 {
    let aspect = canvas.x.max(1) as f32 / canvas.y.max(1) as f32;
    let (w, h) = if aspect >= 1.0 {
        (aspect, 1.0)
    } else {
        (1.0, 1.0 / aspect)
    };
    Mat4::orthographic_rh(-w, w, -h, h, -10.0, 10.0)
}

/// Queries one incident direction and resolves a rectangle of a top-down
/// view of the disk into sample points.
pub fn select(opts: SelectOptions, config: Config) -> Result<(), GonioError> {
    let mut dataset = load_dataset(&config, &opts.incident)?;
    let canvas = UVec2::new(opts.canvas.0, opts.canvas.1);
    let rect = SelectionBox::from_corners(
        Vec2::new(opts.from.0, opts.from.1),
        Vec2::new(opts.to.0, opts.to.1),
    );
    let count = dataset
        .select(&rect, &top_down_mvp(canvas), canvas, opts.mode)
        .map_err(|err| pipeline_error(err, "Failed to apply selection"))?;
    log::info!("{} points selected", count);

    let active = dataset.active_channel();
    let report = SelectionReport {
        active_channel: active,
        channel_name: channel_name(&dataset, active),
        selected: dataset.selected_indices(),
        stats: dataset.selection_stats(active).copied().unwrap_or_default(),
        center: dataset.selection_center(),
        spectrum: dataset
            .selection_spectrum()
            .map_err(|err| pipeline_error(err, "Failed to read selection spectrum"))?,
    };

    if opts.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|err| GonioError::new("Failed to serialize report.", Some(Box::new(err))))?;
        println!("{}", json);
        return Ok(());
    }

    println!(
        "{BRIGHT_CYAN}{}{RESET} selection of {} on channel {} ({})",
        opts.mode,
        rect.size,
        report.active_channel,
        report.channel_name
    );
    println!("  selected points: {:?}", report.selected);
    match report.stats.highest_point_index {
        Some(highest) => println!(
            "  min {:.6} max {:.6} avg {:.6}, highest point #{}",
            report.stats.min_intensity,
            report.stats.max_intensity,
            report.stats.average_intensity,
            highest
        ),
        None => println!("  nothing selected"),
    }
    if let Some(center) = report.center {
        println!("  center: {}", center);
    }
    for (nm, value) in &report.spectrum {
        println!("    {BRIGHT_YELLOW}>{RESET} {:>6} nm {:.4}", nm, value);
    }
    Ok(())
}
