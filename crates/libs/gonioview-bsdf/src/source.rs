//! Interface to the provider of measured (or modelled) reflectance samples.
//!
//! The pipeline never reads measurement files itself. It asks a
//! [`SampleSource`] for the samples seen from one incident direction and,
//! later, for the wavelength rows it did not receive in bulk.

mod analytic;

pub use analytic::{AnalyticParams, AnalyticSource};

use base::math::{Sph2, Vec3};
use thiserror::Error;

/// Errors reported by a [`SampleSource`].
///
/// All of them are recoverable: the dataset keeps its previous state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The measurement cannot answer queries for this incident direction.
    #[error("incident direction (θ: {theta}°, φ: {phi}°) is not covered by the measurement")]
    Unreachable {
        /// Polar angle in degrees.
        theta: f32,
        /// Azimuthal angle in degrees.
        phi: f32,
    },
    /// The requested outgoing resolution is not usable.
    #[error("invalid outgoing resolution {n_theta} × {n_phi}")]
    InvalidResolution {
        /// Requested number of polar samples.
        n_theta: u32,
        /// Requested number of azimuthal samples.
        n_phi: u32,
    },
    /// Channel index past the last channel.
    #[error("channel {channel} out of range, the source has {count} channels")]
    ChannelOutOfRange {
        /// Requested channel.
        channel: usize,
        /// Number of channels.
        count: usize,
    },
    /// Point index past the last sample point of the current query.
    #[error("point {point} out of range, the current query has {count} points")]
    PointOutOfRange {
        /// Requested point.
        point: usize,
        /// Number of points.
        count: usize,
    },
    /// The sample set returned by the source is inconsistent.
    #[error("malformed sample set: {0}")]
    Malformed(String),
    /// No incident angle has been queried yet.
    #[error("no incident angle has been queried yet")]
    NotQueried,
}

/// Samples returned for one incident direction.
///
/// Every per-point array is indexed by the sample point index and has the
/// same length.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    /// Outgoing direction of each sample point.
    pub outgoing: Vec<Sph2>,
    /// Intensity rows, one per channel (`0` is luminance, `1..=W` the
    /// wavelengths). Row 0 must be present, other rows may be left to be
    /// materialised on demand.
    pub rows: Vec<Option<Box<[f32]>>>,
    /// Approximate display colour (linear RGB) of each sample point.
    pub colors: Vec<Vec3>,
}

impl SampleSet {
    /// Number of sample points.
    pub fn len(&self) -> usize { self.outgoing.len() }

    /// Whether the set holds no sample point.
    pub fn is_empty(&self) -> bool { self.outgoing.is_empty() }
}

/// Provider of reflectance samples.
///
/// Channel `0` is the luminance, channel `c >= 1` the wavelength
/// `wavelengths()[c - 1]`.
pub trait SampleSource: Send + Sync {
    /// Name of the measured sample.
    fn name(&self) -> &str;

    /// Human readable description of where the samples come from.
    fn description(&self) -> String;

    /// Wavelengths (nm) of the spectral channels.
    fn wavelengths(&self) -> &[f32];

    /// Number of channels, luminance included.
    fn n_channels(&self) -> usize { self.wavelengths().len() + 1 }

    /// Queries the samples seen from the incident direction `wi`.
    ///
    /// `n_theta` and `n_phi` are the requested outgoing resolution; sources
    /// with a fixed sampling may ignore them. On failure the source must
    /// keep answering [`sample_channel_at_point`](Self::sample_channel_at_point)
    /// for the previous successful query.
    fn query_incident_angle(
        &mut self,
        wi: Sph2,
        n_theta: u32,
        n_phi: u32,
    ) -> Result<SampleSet, SourceError>;

    /// Intensity of one sample point of the last successful query on one
    /// channel.
    fn sample_channel_at_point(&self, channel: usize, point: usize) -> Result<f32, SourceError>;

    /// Materialises a whole channel row of the last successful query into
    /// `out`, whose length is the number of sample points.
    fn sample_channel(&self, channel: usize, out: &mut [f32]) -> Result<(), SourceError> {
        for (point, value) in out.iter_mut().enumerate() {
            *value = self.sample_channel_at_point(channel, point)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Sample source with hand-written intensities, counting the row fetches.

    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    /// Number of calls made to a [`TableSource`], shared with the test
    /// once the source is boxed away.
    #[derive(Debug, Default)]
    pub struct Counters {
        queries: AtomicUsize,
        row_fetches: AtomicUsize,
        point_fetches: AtomicUsize,
    }

    impl Counters {
        pub fn queries(&self) -> usize { self.queries.load(Ordering::SeqCst) }

        pub fn row_fetches(&self) -> usize { self.row_fetches.load(Ordering::SeqCst) }

        pub fn point_fetches(&self) -> usize { self.point_fetches.load(Ordering::SeqCst) }
    }

    /// Source answering fixed rows for any incident direction.
    pub struct TableSource {
        pub outgoing: Vec<Sph2>,
        /// All rows, luminance first.
        pub table: Vec<Vec<f32>>,
        pub wavelengths: Vec<f32>,
        /// Rows handed out in bulk by `query_incident_angle`.
        pub prefetched: Vec<usize>,
        pub counters: Arc<Counters>,
        /// Incident polar angles at or above this one fail.
        pub horizon: f32,
        /// Incident polar angles at or above this one get a truncated set
        /// without colours.
        pub malformed_from: f32,
        /// Queries past this many successful ones fail.
        pub max_queries: usize,
        /// Number of points of the last answered query.
        served: usize,
    }

    impl TableSource {
        pub fn new(outgoing: Vec<Sph2>, table: Vec<Vec<f32>>) -> Self {
            let wavelengths = (1..table.len()).map(|i| 380.0 + 20.0 * i as f32).collect();
            let served = outgoing.len();
            Self {
                outgoing,
                table,
                wavelengths,
                prefetched: vec![0],
                counters: Arc::new(Counters::default()),
                horizon: 90.0,
                malformed_from: 90.0,
                max_queries: usize::MAX,
                served,
            }
        }

        pub fn row_fetches(&self) -> usize { self.counters.row_fetches() }

        pub fn point_fetches(&self) -> usize { self.counters.point_fetches() }

        pub fn queries(&self) -> usize { self.counters.queries() }
    }

    impl SampleSource for TableSource {
        fn name(&self) -> &str { "table" }

        fn description(&self) -> String { "hand-written table".into() }

        fn wavelengths(&self) -> &[f32] { &self.wavelengths }

        fn query_incident_angle(
            &mut self,
            wi: Sph2,
            _n_theta: u32,
            _n_phi: u32,
        ) -> Result<SampleSet, SourceError> {
            if wi.theta.value() >= self.horizon || self.queries() >= self.max_queries {
                return Err(SourceError::Unreachable {
                    theta: wi.theta.value(),
                    phi: wi.phi.value(),
                });
            }
            self.counters.queries.fetch_add(1, Ordering::SeqCst);
            if wi.theta.value() >= self.malformed_from {
                self.served = self.outgoing.len() / 2;
                return Ok(SampleSet {
                    outgoing: self.outgoing[..self.served].to_vec(),
                    rows: vec![Some(self.table[0][..self.served].into())],
                    colors: Vec::new(),
                });
            }
            self.served = self.outgoing.len();
            let rows = (0..self.table.len())
                .map(|c| {
                    self.prefetched
                        .contains(&c)
                        .then(|| self.table[c].clone().into_boxed_slice())
                })
                .collect();
            Ok(SampleSet {
                outgoing: self.outgoing.clone(),
                rows,
                colors: vec![Vec3::ONE; self.outgoing.len()],
            })
        }

        fn sample_channel_at_point(
            &self,
            channel: usize,
            point: usize,
        ) -> Result<f32, SourceError> {
            self.counters.point_fetches.fetch_add(1, Ordering::SeqCst);
            let row = self
                .table
                .get(channel)
                .ok_or(SourceError::ChannelOutOfRange {
                    channel,
                    count: self.table.len(),
                })?;
            row[..self.served]
                .get(point)
                .copied()
                .ok_or(SourceError::PointOutOfRange {
                    point,
                    count: self.served,
                })
        }

        fn sample_channel(&self, channel: usize, out: &mut [f32]) -> Result<(), SourceError> {
            self.counters.row_fetches.fetch_add(1, Ordering::SeqCst);
            let row = self
                .table
                .get(channel)
                .ok_or(SourceError::ChannelOutOfRange {
                    channel,
                    count: self.table.len(),
                })?;
            if out.len() != self.served {
                return Err(SourceError::PointOutOfRange {
                    point: self.served.min(out.len()),
                    count: self.served,
                });
            }
            out.copy_from_slice(&row[..self.served]);
            Ok(())
        }
    }
}
