use base::error::GonioError;
use bsdf::{source::AnalyticParams, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Name of the configuration file looked up in the working directory and in
/// the system configuration directory.
pub const CONFIG_FILE_NAME: &str = "gonioview.toml";

/// Options can be configured by user.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    /// Path to the user-defined output directory.
    /// If not set, the current working directory is used.
    pub output_dir: Option<PathBuf>,

    /// Tunables of the processing pipeline.
    pub pipeline: PipelineConfig,

    /// Parameters of the analytic sample source.
    pub analytic: AnalyticParams,
}

impl UserConfig {
    /// Load [`UserConfig`] from a .toml file.
    pub fn load(path: &Path) -> Result<Self, GonioError> {
        let string = std::fs::read_to_string(path).map_err(|err| {
            GonioError::from_io_error(
                err,
                format!("Failed to read user configuration file: {}", path.display()),
            )
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&string, base).map_err(|err| {
            GonioError::new(
                format!(
                    "Failed to parse user configuration file: {}",
                    path.display()
                ),
                Some(Box::new(err)),
            )
        })
    }

    /// Parses a configuration, resolving relative paths against `base`.
    pub fn parse(string: &str, base: &Path) -> Result<Self, toml::de::Error> {
        let mut config: UserConfig = toml::from_str(string)?;
        if let Some(output_dir) = config.output_dir {
            config.output_dir = Some(resolve_path(base, &output_dir));
        }
        log::trace!("  - User output directory: {:?}", config.output_dir);
        log::trace!("  - Pipeline: {:?}", config.pipeline);
        Ok(config)
    }
}

/// Joins `path` to `base` unless it is absolute.
pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Gonioview configuration.
#[derive(Debug)]
pub struct Config {
    /// Path to the configuration directory, if the system has one.
    sys_config_dir: Option<PathBuf>,

    /// Current working directory (where the user started the program).
    cwd: PathBuf,

    /// File the user configuration was loaded from.
    loaded_from: Option<PathBuf>,

    /// User-defined configuration.
    user: UserConfig,
}

impl Config {
    /// Loads the configuration.
    ///
    /// The user configuration is read from `filepath` if given, otherwise
    /// from `gonioview.toml` in the current working directory, otherwise from
    /// `gonioview/gonioview.toml` in the system configuration directory.
    /// When none exists the defaults are used.
    ///
    /// # Default configuration directory
    ///
    /// + On *nix system: "$XDG_CONFIG_HOME" or "$HOME/.config"
    ///
    /// + On windows system: `%APPDATA%` which is usually
    /// "C:\Users\username\AppData\Roaming"
    ///
    /// + On macos system: "$HOME/Library/Application Support"
    pub fn load_config(filepath: Option<&Path>) -> Result<Self, GonioError> {
        log::info!("Loading configurations...");
        let sys_config_dir = dirs::config_dir().map(|dir| dir.join("gonioview"));
        match &sys_config_dir {
            Some(dir) => log::info!("  - Sys configuration directory: {}", dir.display()),
            None => log::warn!("  - System configuration directory not found."),
        }
        let cwd = std::env::current_dir().map_err(|err| {
            GonioError::from_io_error(err, "Failed to get current working directory.")
        })?;

        let candidate = match filepath {
            Some(path) if !path.exists() => {
                return Err(GonioError::new(
                    format!("User configuration file not found: {}", path.display()),
                    None,
                ));
            },
            Some(path) => Some(resolve_path(&cwd, path)),
            None => [
                Some(cwd.join(CONFIG_FILE_NAME)),
                sys_config_dir.as_ref().map(|d| d.join(CONFIG_FILE_NAME)),
            ]
            .into_iter()
            .flatten()
            .find(|path| path.exists()),
        };
        let user = match &candidate {
            Some(path) => {
                log::info!("  Load configuration from {}", path.display());
                UserConfig::load(path)?
            },
            None => {
                log::info!("  No configuration file found, using defaults");
                UserConfig::default()
            },
        };
        Ok(Self {
            sys_config_dir,
            cwd,
            loaded_from: candidate,
            user,
        })
    }

    /// Returns the current working directory.
    pub fn cwd(&self) -> &Path { &self.cwd }

    /// Returns the output directory.
    /// If the output directory is not set, the current working directory will
    /// be returned.
    pub fn output_dir(&self) -> &Path { self.user.output_dir.as_deref().unwrap_or(&self.cwd) }

    /// Resolves an output file path against the output directory.
    pub fn output_path(&self, path: &Path) -> PathBuf { resolve_path(self.output_dir(), path) }

    /// Returns the pipeline configuration.
    pub fn pipeline(&self) -> &PipelineConfig { &self.user.pipeline }

    /// Returns the parameters of the analytic sample source.
    pub fn analytic(&self) -> &AnalyticParams { &self.user.analytic }

    /// Returns the user configuration.
    pub fn user(&self) -> &UserConfig { &self.user }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Configuration directory: {}\nConfiguration file: {}\nCurrent working directory: \
             {}\nOutput directory: {}",
            self.sys_config_dir
                .as_ref()
                .map_or("None".to_string(), |d| d.display().to_string()),
            self.loaded_from
                .as_ref()
                .map_or("None (defaults)".to_string(), |p| p.display().to_string()),
            self.cwd.display(),
            self.output_dir().display(),
        )
    }
}
