use crate::app::{
    cli::{BRIGHT_CYAN, RESET},
    Config,
};
use base::error::GonioError;
use bsdf::{source::SampleSource, AnalyticSource};

/// Prints gonioview's current configuration and the channels of the
/// sample source.
pub fn print_info(config: Config) -> Result<(), GonioError> {
    println!("{BRIGHT_CYAN}Current configurations:{RESET}\n{}\n", config);

    let serialized = toml::to_string_pretty(config.user()).map_err(|err| {
        GonioError::new("Failed to serialize configuration.", Some(Box::new(err)))
    })?;
    println!("{BRIGHT_CYAN}Effective settings:{RESET}\n{}", serialized);

    let source = AnalyticSource::new("analytic", config.analytic().clone());
    println!(
        "{BRIGHT_CYAN}Sample source:{RESET} {}\n  {}\n  {} outgoing samples per query ({} x {})",
        source.name(),
        source.description(),
        config.pipeline().n_theta * config.pipeline().n_phi,
        config.pipeline().n_theta,
        config.pipeline().n_phi,
    );
    println!("{BRIGHT_CYAN}Channels:{RESET}");
    println!("  {:>3}  luminance", 0);
    for (i, nm) in source.wavelengths().iter().enumerate() {
        println!("  {:>3}  {} nm", i + 1, nm);
    }
    log::debug!("Working directory: {}", config.cwd().display());
    Ok(())
}
