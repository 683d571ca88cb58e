//! Tunables of the processing pipeline.

use base::{deg, units::Degrees};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How intensities are mapped to heights.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeightScale {
    /// `h = (v - min) / (max - min)`
    #[default]
    Linear,
    /// `h = ln(1 + v - min) / ln(1 + max - min)`
    Logarithmic,
}

impl Display for HeightScale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HeightScale::Linear => write!(f, "linear"),
            HeightScale::Logarithmic => write!(f, "logarithmic"),
        }
    }
}

/// Configuration of the pipeline of one dataset.
///
/// Every field has a default so partial configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of outgoing polar samples requested from the source.
    pub n_theta: u32,
    /// Number of outgoing azimuthal samples requested from the source.
    pub n_phi: u32,
    /// Height normalisation.
    pub height_scale: HeightScale,
    /// Smallest incident polar angle sent to the source.
    pub min_incident_theta: Degrees,
    /// Open wavelength interval (nm) kept in the selection spectrum.
    pub spectrum_band: (f32, f32),
    /// Value the maximum of the selection spectrum is scaled to.
    pub spectrum_ceiling: f32,
    /// Quantisation step used to detect rings and spokes.
    pub path_angular_step: Degrees,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_theta: 32,
            n_phi: 32,
            height_scale: HeightScale::Linear,
            min_incident_theta: deg!(1e-6),
            spectrum_band: (360.0, 1000.0),
            spectrum_ceiling: 0.9,
            path_angular_step: deg!(1.0),
        }
    }
}

impl PipelineConfig {
    /// Clamps the polar angle of an incident direction to the configured
    /// minimum. Grazing and negative angles are never rejected here.
    pub fn clamp_incident_theta(&self, theta: Degrees) -> Degrees {
        theta.max(self.min_incident_theta)
    }

    /// Returns the angular step of the path builder, falling back to the
    /// default when the configured one is not usable.
    pub fn effective_path_step(&self) -> Degrees {
        let step = self.path_angular_step;
        if step.is_positive() && step.value().is_finite() {
            step
        } else {
            log::warn!("Invalid path angular step {}, using 1°", step);
            deg!(1.0)
        }
    }
}
