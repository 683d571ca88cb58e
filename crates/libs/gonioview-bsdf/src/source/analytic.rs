//! Closed-form spectral BRDF used as a sample source: a Lambertian base with
//! a wavelength dependent albedo plus an isotropic Trowbridge-Reitz lobe.

use crate::{
    source::{SampleSet, SampleSource, SourceError},
    spectrum,
};
use base::{
    math::{sqr, Sph2, Vec3},
    units::Degrees,
};
use serde::{Deserialize, Serialize};

/// Parameters of the analytic BRDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticParams {
    /// Wavelengths (nm) of the spectral channels.
    pub wavelengths: Vec<f32>,
    /// Roughness `α` of the specular lobe.
    pub roughness: f32,
    /// Weight of the specular lobe.
    pub specular: f32,
    /// Albedo away from the diffuse peak.
    pub diffuse_floor: f32,
    /// Albedo added at the diffuse peak.
    pub diffuse_amplitude: f32,
    /// Wavelength (nm) of the diffuse peak.
    pub diffuse_peak: f32,
    /// Width (nm) of the diffuse peak.
    pub diffuse_width: f32,
}

impl Default for AnalyticParams {
    fn default() -> Self {
        Self {
            wavelengths: (0..21).map(|i| 380.0 + 20.0 * i as f32).collect(),
            roughness: 0.3,
            specular: 0.5,
            diffuse_floor: 0.15,
            diffuse_amplitude: 0.6,
            diffuse_peak: 620.0,
            diffuse_width: 80.0,
        }
    }
}

impl AnalyticParams {
    fn albedo(&self, nm: f32) -> f32 {
        let t = (nm - self.diffuse_peak) / self.diffuse_width.max(1e-3);
        self.diffuse_floor + self.diffuse_amplitude * (-0.5 * t * t).exp()
    }

    fn specular_weight(&self, nm: f32) -> f32 {
        self.specular * (0.8 + 0.2 * ((nm - 380.0) / 400.0).clamp(0.0, 1.0))
    }

    /// Trowbridge-Reitz normal distribution times the separable Smith
    /// shadowing-masking, divided by the usual `4 cos θi cos θo`.
    fn lobe(&self, wi: Vec3, wo: Vec3) -> f32 {
        let cos_io = wi.z * wo.z;
        if cos_io <= 1e-16 {
            return 0.0;
        }
        let h = (wi + wo).normalize_or_zero();
        if h.z <= 0.0 {
            return 0.0;
        }
        let alpha2 = sqr(self.roughness.max(1e-3));
        let d = alpha2 / (std::f32::consts::PI * sqr(sqr(h.z) * (alpha2 - 1.0) + 1.0));
        let g1 = |v: Vec3| -> f32 {
            if h.dot(v) <= 0.0 {
                return 0.0;
            }
            let cos2 = sqr(v.z);
            let tan2 = (1.0 - cos2) / cos2;
            2.0 / (1.0 + (1.0 + alpha2 * tan2).sqrt())
        };
        d * g1(wi) * g1(wo) / (4.0 * cos_io)
    }

    fn eval(&self, nm: f32, wi: Vec3, wo: Vec3) -> f32 {
        self.albedo(nm) * std::f32::consts::FRAC_1_PI + self.specular_weight(nm) * self.lobe(wi, wo)
    }
}

/// Sample source evaluating [`AnalyticParams`] on a regular grid of outgoing
/// directions.
///
/// The polar samples sit at the centres of `n_theta` equal cells over
/// `[0°, 90°)`, the azimuthal ones at `j * 360° / n_phi`. Only the luminance
/// row is returned in bulk; wavelength rows are evaluated on demand.
#[derive(Debug, Clone)]
pub struct AnalyticSource {
    name: String,
    params: AnalyticParams,
    incident: Option<Vec3>,
    outgoing: Vec<Vec3>,
}

impl AnalyticSource {
    /// Creates a new source.
    pub fn new<S: Into<String>>(name: S, params: AnalyticParams) -> Self {
        Self {
            name: name.into(),
            params,
            incident: None,
            outgoing: Vec::new(),
        }
    }

    /// Parameters of the BRDF.
    pub fn params(&self) -> &AnalyticParams { &self.params }

    fn spectrum_at(&self, wi: Vec3, wo: Vec3) -> Vec<f32> {
        self.params
            .wavelengths
            .iter()
            .map(|&nm| self.params.eval(nm, wi, wo))
            .collect()
    }

    fn outgoing_grid(n_theta: u32, n_phi: u32) -> Vec<Sph2> {
        let d_theta = 90.0 / n_theta as f32;
        let d_phi = 360.0 / n_phi as f32;
        (0..n_theta)
            .flat_map(|i| {
                (0..n_phi).map(move |j| {
                    Sph2::new(
                        Degrees::new((i as f32 + 0.5) * d_theta),
                        Degrees::new(j as f32 * d_phi),
                    )
                })
            })
            .collect()
    }
}

impl Default for AnalyticSource {
    fn default() -> Self { Self::new("analytic", AnalyticParams::default()) }
}

impl SampleSource for AnalyticSource {
    fn name(&self) -> &str { &self.name }

    fn description(&self) -> String {
        format!(
            "Lambertian + Trowbridge-Reitz (α = {}, specular = {}), diffuse peak at {} nm",
            self.params.roughness, self.params.specular, self.params.diffuse_peak
        )
    }

    fn wavelengths(&self) -> &[f32] { &self.params.wavelengths }

    fn query_incident_angle(
        &mut self,
        wi: Sph2,
        n_theta: u32,
        n_phi: u32,
    ) -> Result<SampleSet, SourceError> {
        if n_theta == 0 || n_phi == 0 {
            return Err(SourceError::InvalidResolution { n_theta, n_phi });
        }
        let (theta, phi) = (wi.theta.value(), wi.phi.value());
        if !theta.is_finite() || !phi.is_finite() || theta >= 90.0 {
            return Err(SourceError::Unreachable { theta, phi });
        }
        let wi_vec = wi.to_cartesian();
        let outgoing = Self::outgoing_grid(n_theta, n_phi);
        let vectors = outgoing.iter().map(Sph2::to_cartesian).collect::<Vec<_>>();
        let wavelengths = &self.params.wavelengths;
        let (luminance, colors): (Vec<f32>, Vec<Vec3>) = vectors
            .iter()
            .map(|&wo| {
                let spectrum = self.spectrum_at(wi_vec, wo);
                (
                    spectrum::luminance(wavelengths, &spectrum),
                    spectrum::spectrum_to_rgb(wavelengths, &spectrum),
                )
            })
            .unzip();
        let mut rows = vec![None; wavelengths.len() + 1];
        rows[0] = Some(luminance.into_boxed_slice());

        log::trace!(
            "[AnalyticSource] {} outgoing samples for incident {}",
            outgoing.len(),
            wi
        );
        self.incident = Some(wi_vec);
        self.outgoing = vectors;
        Ok(SampleSet {
            outgoing,
            rows,
            colors,
        })
    }

    fn sample_channel_at_point(&self, channel: usize, point: usize) -> Result<f32, SourceError> {
        let count = self.n_channels();
        if channel >= count {
            return Err(SourceError::ChannelOutOfRange { channel, count });
        }
        let (wi, wo) = match (self.incident, self.outgoing.get(point)) {
            (Some(wi), Some(&wo)) => (wi, wo),
            _ => {
                return Err(SourceError::PointOutOfRange {
                    point,
                    count: self.outgoing.len(),
                })
            },
        };
        Ok(match channel {
            0 => spectrum::luminance(&self.params.wavelengths, &self.spectrum_at(wi, wo)),
            c => self.params.eval(self.params.wavelengths[c - 1], wi, wo),
        })
    }
}
