//! One loaded BSDF measurement and the state derived from its current
//! incident-angle query.

use crate::{
    channel::{ChannelCache, ChannelDerived},
    config::{HeightScale, PipelineConfig},
    path::{build_path_segments, PathSegment},
    raw::RawMeasurement,
    selection::{
        apply_selection, selected_indices, SelectionBox, SelectionFlag, SelectionMode,
        SelectionStats,
    },
    source::{SampleSet, SampleSource, SourceError},
    spectrum::normalized_spectrum,
    triangulation::{triangulate, Triangulation},
};
use base::{
    math::{Mat4, Sph2, UVec2, Vec2, Vec3},
    utils::{iso_timestamp, Asset},
};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Descriptive information about a dataset and its current query.
#[derive(Debug, Clone, Serialize)]
pub struct Metadata {
    /// Name of the measured sample.
    pub name: String,
    /// Where the samples come from.
    pub description: String,
    /// Incident direction of the current query.
    pub incident: Sph2,
    /// Number of sample points of the current query.
    pub n_points: usize,
    /// Number of channels, luminance included.
    pub n_channels: usize,
    /// Wavelengths (nm) of the spectral channels.
    pub wavelengths: Vec<f32>,
    /// Time of the current query.
    pub timestamp: String,
}

/// Everything derived from one incident-angle query.
///
/// A generation is created as a whole by a successful query and replaced as
/// a whole by the next one; readers holding on to it see a consistent state.
#[derive(Debug, Clone)]
pub struct Generation {
    id: u64,
    incident: Sph2,
    outgoing: Vec<Sph2>,
    positions: Vec<Vec2>,
    colors: Vec<Vec3>,
    raw: RawMeasurement,
    triangulation: Triangulation,
    channels: ChannelCache,
    flags: Vec<SelectionFlag>,
    selection_stats: Vec<SelectionStats>,
    path_segments: Vec<PathSegment>,
}

impl Generation {
    /// Id of the generation, increasing with every query of the dataset.
    pub fn id(&self) -> u64 { self.id }

    /// Incident direction the generation was queried with.
    pub fn incident(&self) -> Sph2 { self.incident }

    /// Number of sample points.
    pub fn n_points(&self) -> usize { self.positions.len() }

    /// Outgoing direction of every sample point.
    pub fn outgoing(&self) -> &[Sph2] { &self.outgoing }

    /// Disk position of every sample point.
    pub fn positions(&self) -> &[Vec2] { &self.positions }

    /// Display colour of every sample point.
    pub fn colors(&self) -> &[Vec3] { &self.colors }

    /// Intensity table.
    pub fn raw(&self) -> &RawMeasurement { &self.raw }

    /// Triangulation of the disk layout, shared by every channel.
    pub fn triangulation(&self) -> &Triangulation { &self.triangulation }

    /// Faces of the mesh.
    pub fn faces(&self) -> &[[u32; 3]] { &self.triangulation.faces }

    /// Per-channel derived data.
    pub fn channels(&self) -> &ChannelCache { &self.channels }

    /// Selection flag of every sample point.
    pub fn flags(&self) -> &[SelectionFlag] { &self.flags }

    /// Selection statistics of every channel.
    pub fn selection_stats(&self) -> &[SelectionStats] { &self.selection_stats }

    /// Ring and spoke overlay segments.
    pub fn path_segments(&self) -> &[PathSegment] { &self.path_segments }

    fn ensure(
        &mut self,
        channel: usize,
        source: &dyn SampleSource,
    ) -> Result<&ChannelDerived, SourceError> {
        self.channels
            .ensure(channel, &mut self.raw, source, &self.positions, &self.triangulation)
    }

    /// Heights the selection is resolved against: the ones of `channel` when
    /// cached, otherwise the luminance ones.
    fn heights_for(&self, channel: usize) -> Option<&[f32]> {
        match self.channels.get(channel) {
            Some(derived) => Some(derived.heights()),
            None => {
                log::debug!(
                    "[Selection] Channel {} not cached, projecting luminance heights",
                    channel
                );
                self.channels.get(0).map(ChannelDerived::heights)
            },
        }
    }

    fn vertices_for(&self, channel: usize) -> Vec<Vec3> {
        let heights = self.heights_for(channel);
        self.positions
            .iter()
            .enumerate()
            .map(|(i, p)| p.extend(heights.map_or(0.0, |h| h[i])))
            .collect()
    }

    fn compute_selection_stats(
        &self,
        flags: &[SelectionFlag],
        source: &dyn SampleSource,
    ) -> Result<Vec<SelectionStats>, SourceError> {
        let indices = selected_indices(flags);
        (0..self.raw.n_channels())
            .into_par_iter()
            .map(|c| SelectionStats::compute(&indices, |i| self.raw.intensity(c, i, source)))
            .collect()
    }
}

/// A sample source together with its pipeline state.
pub struct BsdfDataset {
    source: Box<dyn SampleSource>,
    config: PipelineConfig,
    metadata: Metadata,
    generation: Option<Generation>,
    active_channel: usize,
    next_generation: u64,
}

impl Asset for BsdfDataset {}

impl BsdfDataset {
    /// Wraps a sample source. No query is made until [`Self::init`] or
    /// [`Self::set_incident_angle`] is called.
    pub fn new(source: Box<dyn SampleSource>, config: PipelineConfig) -> Self {
        let metadata = Metadata {
            name: source.name().to_string(),
            description: source.description(),
            incident: Sph2::zero(),
            n_points: 0,
            n_channels: source.n_channels(),
            wavelengths: source.wavelengths().to_vec(),
            timestamp: iso_timestamp(),
        };
        Self {
            source,
            config,
            metadata,
            generation: None,
            active_channel: 0,
            next_generation: 1,
        }
    }

    /// Performs the first query, at normal incidence.
    pub fn init(&mut self) -> Result<(), SourceError> { self.set_incident_angle(Sph2::zero()) }

    /// Queries the source for the incident direction `wi` and replaces the
    /// current generation.
    ///
    /// The polar angle is clamped to the configured minimum first. On
    /// success every channel is stale except the luminance, which is
    /// computed, and the selection is empty. On failure the current
    /// generation is kept and the source is brought back to its incident
    /// direction; if the source cannot go back, the generation is dropped.
    pub fn set_incident_angle(&mut self, wi: Sph2) -> Result<(), SourceError> {
        let start = Instant::now();
        let wi = Sph2::new(self.config.clamp_incident_theta(wi.theta), wi.phi);
        log::info!("Setting incident angle to {} ..", wi);
        let samples = self
            .source
            .query_incident_angle(wi, self.config.n_theta, self.config.n_phi)?;
        let generation = match self.build_generation(wi, samples) {
            Ok(generation) => generation,
            Err(err) => {
                log::error!("[BsdfDataset] Query at {} rejected: {}", wi, err);
                self.restore_source();
                return Err(err);
            },
        };

        let n_points = generation.n_points();
        let n_channels = generation.channels.n_channels();
        self.next_generation += 1;
        self.generation = Some(generation);
        self.active_channel = self.clamp_channel(self.active_channel);
        self.metadata.incident = wi;
        self.metadata.n_points = n_points;
        self.metadata.n_channels = n_channels;
        self.metadata.timestamp = iso_timestamp();
        log::info!(
            "Setting incident angle to {} .. done (took {} ms)",
            wi,
            start.elapsed().as_millis()
        );
        Ok(())
    }

    /// Builds the generation of the samples answered for `wi`, with the
    /// luminance computed.
    fn build_generation(
        &self,
        wi: Sph2,
        mut samples: SampleSet,
    ) -> Result<Generation, SourceError> {
        let n_channels = self.source.n_channels();
        let raw = RawMeasurement::from_sample_set(&mut samples, n_channels)?;
        let positions = samples.outgoing.iter().map(Sph2::to_disk).collect::<Vec<_>>();
        let triangulation = triangulate(&positions);
        let path_segments = build_path_segments(&positions, self.config.effective_path_step());
        let n_points = positions.len();
        let mut generation = Generation {
            id: self.next_generation,
            incident: wi,
            outgoing: samples.outgoing,
            positions,
            colors: samples.colors,
            raw,
            triangulation,
            channels: ChannelCache::new(n_channels, self.config.height_scale),
            flags: vec![SelectionFlag::NotSelected; n_points],
            selection_stats: vec![SelectionStats::default(); n_channels],
            path_segments,
        };
        generation.ensure(0, self.source.as_ref())?;
        Ok(generation)
    }

    /// Re-queries the incident direction of the current generation after the
    /// source answered a query that was then rejected, so that channels
    /// still to be fetched match the generation. The generation is dropped
    /// when the source no longer answers it with the same points.
    fn restore_source(&mut self) {
        let Some(kept) = self.generation.as_ref() else {
            return;
        };
        let (incident, n_points) = (kept.incident, kept.n_points());
        let restored = self
            .source
            .query_incident_angle(incident, self.config.n_theta, self.config.n_phi)
            .is_ok_and(|samples| samples.len() == n_points);
        if !restored {
            log::warn!(
                "[BsdfDataset] Source cannot return to incident {}, dropping the current generation",
                incident
            );
            self.generation = None;
            self.metadata.n_points = 0;
        }
    }

    /// Clamps a channel index to the last valid channel.
    pub fn clamp_channel(&self, channel: usize) -> usize {
        channel.min(self.n_channels().saturating_sub(1))
    }

    /// Number of channels, luminance included.
    pub fn n_channels(&self) -> usize {
        self.generation
            .as_ref()
            .map_or(self.metadata.n_channels, |g| g.channels.n_channels())
    }

    /// Makes `channel` (clamped) the displayed one, computing it if needed.
    ///
    /// Returns the index actually activated.
    pub fn set_channel(&mut self, channel: usize) -> Result<usize, SourceError> {
        let channel = self.clamp_channel(channel);
        self.ensure_channel(channel)?;
        if channel != self.active_channel {
            log::debug!("[BsdfDataset] Active channel {} -> {}", self.active_channel, channel);
        }
        self.active_channel = channel;
        Ok(channel)
    }

    /// Computes the derived data of `channel` (clamped) if it is stale.
    pub fn ensure_channel(&mut self, channel: usize) -> Result<&ChannelDerived, SourceError> {
        let channel = self.clamp_channel(channel);
        let generation = self.generation.as_mut().ok_or(SourceError::NotQueried)?;
        generation.ensure(channel, self.source.as_ref())
    }

    /// Derived data of `channel` (clamped) if it is up to date.
    pub fn channel_data(&self, channel: usize) -> Option<&ChannelDerived> {
        let channel = self.clamp_channel(channel);
        self.generation.as_ref()?.channels.get(channel)
    }

    /// Index of the displayed channel.
    pub fn active_channel(&self) -> usize { self.active_channel }

    /// Derived data of the displayed channel if it is up to date.
    pub fn active_channel_data(&self) -> Option<&ChannelDerived> {
        self.channel_data(self.active_channel)
    }

    /// Changes the height normalisation of every channel.
    pub fn set_height_scale(&mut self, scale: HeightScale) -> Result<(), SourceError> {
        self.config.height_scale = scale;
        if let Some(generation) = self.generation.as_mut() {
            generation.channels.set_scale(scale);
            generation.ensure(0, self.source.as_ref())?;
        }
        Ok(())
    }

    /// Resolves the screen rectangle `rect` into sample points and combines
    /// them with the current selection under `mode`.
    ///
    /// Points are projected at their height on the displayed channel. The
    /// selection statistics of every channel are refreshed. Returns the
    /// number of selected points.
    pub fn select(
        &mut self,
        rect: &SelectionBox,
        mvp: &Mat4,
        canvas: UVec2,
        mode: SelectionMode,
    ) -> Result<usize, SourceError> {
        let generation = self.generation.as_mut().ok_or(SourceError::NotQueried)?;
        let vertices = generation.vertices_for(self.active_channel);
        let mut flags = generation.flags.clone();
        let count = apply_selection(&mut flags, &vertices, rect, mvp, canvas, mode);
        let stats = generation.compute_selection_stats(&flags, self.source.as_ref())?;
        generation.flags = flags;
        generation.selection_stats = stats;
        log::debug!(
            "[Selection] {} selection in {:?}: {} points selected",
            mode,
            rect,
            count
        );
        Ok(count)
    }

    /// Clears the selection.
    pub fn deselect_all(&mut self) {
        if let Some(generation) = self.generation.as_mut() {
            generation.flags.fill(SelectionFlag::NotSelected);
            generation.selection_stats.fill(SelectionStats::default());
        }
    }

    /// Indices of the selected points.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.generation
            .as_ref()
            .map(|g| selected_indices(&g.flags))
            .unwrap_or_default()
    }

    /// Selection statistics of `channel` (clamped), `None` before the first
    /// successful query.
    pub fn selection_stats(&self, channel: usize) -> Option<&SelectionStats> {
        let channel = self.clamp_channel(channel);
        self.generation.as_ref()?.selection_stats.get(channel)
    }

    /// Mean 3D position of the selected points on the displayed channel's
    /// height field, `None` when nothing is selected.
    pub fn selection_center(&self) -> Option<Vec3> {
        let generation = self.generation.as_ref()?;
        let indices = selected_indices(&generation.flags);
        if indices.is_empty() {
            return None;
        }
        let vertices = generation.vertices_for(self.active_channel);
        let sum = indices.iter().fold(Vec3::ZERO, |acc, &i| acc + vertices[i]);
        Some(sum / indices.len() as f32)
    }

    /// Spectrum at the selected point with the highest intensity on the
    /// displayed channel, restricted to the configured band and scaled to
    /// the configured ceiling. Empty when nothing is selected.
    pub fn selection_spectrum(&self) -> Result<Vec<(f32, f32)>, SourceError> {
        let generation = self.generation.as_ref().ok_or(SourceError::NotQueried)?;
        let highest = generation
            .selection_stats
            .get(self.active_channel)
            .and_then(|s| s.highest_point_index);
        let Some(point) = highest else {
            return Ok(Vec::new());
        };
        let source = self.source.as_ref();
        let values = (1..generation.raw.n_channels())
            .map(|c| generation.raw.intensity(c, point, source))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(normalized_spectrum(
            source.wavelengths(),
            &values,
            self.config.spectrum_band,
            self.config.spectrum_ceiling,
        ))
    }

    /// Current generation, `None` before the first successful query.
    pub fn generation(&self) -> Option<&Generation> { self.generation.as_ref() }

    /// Id of the current generation, `0` before the first successful query.
    pub fn generation_id(&self) -> u64 { self.generation.as_ref().map_or(0, |g| g.id) }

    /// Pipeline configuration.
    pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Metadata of the dataset.
    pub fn metadata(&self) -> &Metadata { &self.metadata }

    /// The sample source.
    pub fn source(&self) -> &dyn SampleSource { self.source.as_ref() }
}
