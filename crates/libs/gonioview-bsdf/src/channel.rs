//! Per-channel derived data: heights, normals and statistics, computed lazily
//! and at most once per channel for one incident-angle query.

use crate::{
    config::HeightScale,
    raw::RawMeasurement,
    source::{SampleSource, SourceError},
    triangulation::Triangulation,
};
use base::math::{Vec2, Vec3};
use rayon::prelude::*;
use serde::Serialize;
use std::time::Instant;

/// Height given to every point of a channel whose intensities are all equal.
pub const FLAT_HEIGHT: f32 = 0.5;

/// Statistics of a channel over all sample points.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStats {
    /// Smallest intensity.
    pub min: f32,
    /// Largest intensity.
    pub max: f32,
    /// Mean intensity.
    pub average: f32,
    /// Index of the point with the smallest intensity.
    pub lowest_point_index: usize,
    /// Index of the point with the largest intensity.
    pub highest_point_index: usize,
}

impl ChannelStats {
    /// Computes the statistics of the finite values of `intensities`.
    ///
    /// Ties are resolved towards the smallest point index.
    pub fn compute(intensities: &[f32]) -> Self {
        let mut stats = ChannelStats {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            ..Default::default()
        };
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for (i, &v) in intensities.iter().enumerate() {
            if !v.is_finite() {
                continue;
            }
            if v < stats.min {
                stats.min = v;
                stats.lowest_point_index = i;
            }
            if v > stats.max {
                stats.max = v;
                stats.highest_point_index = i;
            }
            sum += v as f64;
            count += 1;
        }
        if count == 0 {
            return ChannelStats::default();
        }
        stats.average = (sum / count as f64) as f32;
        stats
    }

    /// Whether all the intensities are equal.
    pub fn is_flat(&self) -> bool { !(self.max > self.min) }
}

/// Maps an intensity to `[0, 1]` given the channel range.
///
/// Flat channels map to [`FLAT_HEIGHT`], non-finite intensities to 0.
pub fn normalize_height(value: f32, min: f32, max: f32, scale: HeightScale) -> f32 {
    if !(max > min) {
        return FLAT_HEIGHT;
    }
    if !value.is_finite() {
        return 0.0;
    }
    let h = match scale {
        HeightScale::Linear => (value - min) / (max - min),
        HeightScale::Logarithmic => (value - min).ln_1p() / (max - min).ln_1p(),
    };
    if h.is_finite() {
        h.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Computes the per-vertex normals of the height field `(x, y, height)`.
///
/// Each vertex receives the sum of the unnormalised normals of its faces,
/// whose lengths are twice the face areas, then normalised. Vertices without
/// a face get the up vector, duplicated points the normal of the point they
/// duplicate.
pub fn compute_normals(positions: &[Vec2], heights: &[f32], tri: &Triangulation) -> Box<[Vec3]> {
    debug_assert_eq!(positions.len(), heights.len());
    let vertex = |i: u32| {
        let i = i as usize;
        Vec3::new(positions[i].x, positions[i].y, heights[i])
    };
    let face_normals = tri
        .faces
        .par_iter()
        .map(|&[a, b, c]| {
            let (p0, p1, p2) = (vertex(a), vertex(b), vertex(c));
            (p1 - p0).cross(p2 - p0)
        })
        .collect::<Vec<_>>();

    let mut normals = vec![Vec3::ZERO; positions.len()];
    for (face, n) in tri.faces.iter().zip(face_normals.iter()) {
        for &v in face {
            normals[v as usize] += *n;
        }
    }
    normals.par_iter_mut().for_each(|n| {
        *n = n.try_normalize().unwrap_or(Vec3::Z);
    });
    for (i, &r) in tri.representatives.iter().enumerate() {
        if r as usize != i {
            normals[i] = normals[r as usize];
        }
    }
    normals.into_boxed_slice()
}

/// Derived data of one channel.
#[derive(Debug, Clone, Default)]
pub struct ChannelDerived {
    valid: bool,
    heights: Box<[f32]>,
    normals: Box<[Vec3]>,
    stats: ChannelStats,
}

impl ChannelDerived {
    /// Computes heights, normals and statistics of a channel.
    pub fn compute(
        intensities: &[f32],
        positions: &[Vec2],
        tri: &Triangulation,
        scale: HeightScale,
    ) -> Self {
        let stats = ChannelStats::compute(intensities);
        let heights = intensities
            .par_iter()
            .map(|&v| normalize_height(v, stats.min, stats.max, scale))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let normals = compute_normals(positions, &heights, tri);
        Self {
            valid: true,
            heights,
            normals,
            stats,
        }
    }

    /// Whether the data is consistent with the current raw measurement.
    pub fn is_valid(&self) -> bool { self.valid }

    /// Normalised height of every point.
    pub fn heights(&self) -> &[f32] { &self.heights }

    /// Unit normal of every point.
    pub fn normals(&self) -> &[Vec3] { &self.normals }

    /// Statistics over all points.
    pub fn stats(&self) -> &ChannelStats { &self.stats }
}

/// Derived data of every channel of one query.
#[derive(Debug, Clone)]
pub struct ChannelCache {
    channels: Box<[ChannelDerived]>,
    scale: HeightScale,
    computations: usize,
}

impl ChannelCache {
    /// Creates a cache with every channel stale.
    pub fn new(n_channels: usize, scale: HeightScale) -> Self {
        Self {
            channels: vec![ChannelDerived::default(); n_channels].into_boxed_slice(),
            scale,
            computations: 0,
        }
    }

    /// Number of channels.
    pub fn n_channels(&self) -> usize { self.channels.len() }

    /// Height normalisation used for every channel.
    pub fn scale(&self) -> HeightScale { self.scale }

    /// Changes the height normalisation; every channel becomes stale.
    pub fn set_scale(&mut self, scale: HeightScale) {
        if self.scale != scale {
            self.scale = scale;
            self.invalidate_all();
        }
    }

    /// Whether `channel` is computed and up to date.
    pub fn is_valid(&self, channel: usize) -> bool {
        self.channels.get(channel).is_some_and(ChannelDerived::is_valid)
    }

    /// Validity flag of every channel.
    pub fn mask(&self) -> Vec<bool> { self.channels.iter().map(|c| c.valid).collect() }

    /// Marks every channel stale.
    pub fn invalidate_all(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.valid = false;
        }
    }

    /// Number of channel computations since the cache was created.
    pub fn computations(&self) -> usize { self.computations }

    /// Derived data of `channel` if it is up to date.
    pub fn get(&self, channel: usize) -> Option<&ChannelDerived> {
        self.channels.get(channel).filter(|c| c.valid)
    }

    /// Makes sure `channel` is up to date and returns it.
    ///
    /// The intensity row is materialised from `source` if needed. Calling it
    /// again on a valid channel does nothing.
    pub fn ensure(
        &mut self,
        channel: usize,
        raw: &mut RawMeasurement,
        source: &dyn SampleSource,
        positions: &[Vec2],
        tri: &Triangulation,
    ) -> Result<&ChannelDerived, SourceError> {
        let count = self.channels.len();
        let scale = self.scale;
        let slot = self
            .channels
            .get_mut(channel)
            .ok_or(SourceError::ChannelOutOfRange { channel, count })?;
        if !slot.valid {
            let start = Instant::now();
            let intensities = raw.fetch_row(channel, source)?;
            *slot = ChannelDerived::compute(intensities, positions, tri, scale);
            self.computations += 1;
            log::debug!(
                "[ChannelCache] Computed channel {} ({} points, {} scale) in {} ms",
                channel,
                positions.len(),
                scale,
                start.elapsed().as_millis()
            );
        }
        Ok(&*slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::triangulate;
    use approx::assert_abs_diff_eq;

    fn square() -> (Vec<Vec2>, Triangulation) {
        let positions = vec![
            Vec2::new(-1.0, -1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::ZERO,
        ];
        let tri = triangulate(&positions);
        (positions, tri)
    }

    #[test]
    fn stats_ties_and_non_finite() {
        let stats = ChannelStats::compute(&[2.0, f32::NAN, 5.0, 1.0, 5.0, 1.0]);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
        assert_eq!(stats.lowest_point_index, 3);
        assert_eq!(stats.highest_point_index, 2);
        assert_abs_diff_eq!(stats.average, 2.8);
        assert_eq!(ChannelStats::compute(&[]), ChannelStats::default());
    }

    #[test]
    fn linear_and_logarithmic_heights() {
        assert_eq!(normalize_height(1.0, 1.0, 3.0, HeightScale::Linear), 0.0);
        assert_eq!(normalize_height(2.0, 1.0, 3.0, HeightScale::Linear), 0.5);
        assert_eq!(normalize_height(3.0, 1.0, 3.0, HeightScale::Linear), 1.0);
        assert_abs_diff_eq!(
            normalize_height(2.0, 1.0, 3.0, HeightScale::Logarithmic),
            2f32.ln() / 3f32.ln()
        );
        assert_eq!(normalize_height(3.0, 1.0, 3.0, HeightScale::Logarithmic), 1.0);
        assert_eq!(normalize_height(f32::NAN, 1.0, 3.0, HeightScale::Linear), 0.0);
    }

    #[test]
    fn flat_channel_is_safe() {
        let (positions, tri) = square();
        for scale in [HeightScale::Linear, HeightScale::Logarithmic] {
            let derived = ChannelDerived::compute(&[3.0; 5], &positions, &tri, scale);
            assert!(derived.heights().iter().all(|&h| h == FLAT_HEIGHT));
            assert!(derived.normals().iter().all(|n| n.is_finite()));
            for n in derived.normals() {
                assert_abs_diff_eq!(*n, Vec3::Z, epsilon = 1e-6);
            }
            assert!(derived.stats().is_flat());
        }
    }

    #[test]
    fn normals_follow_the_slope() {
        let (positions, tri) = square();
        // Height grows with x: normals lean towards -x.
        let intensities = positions.iter().map(|p| p.x + 1.0).collect::<Vec<_>>();
        let derived = ChannelDerived::compute(&intensities, &positions, &tri, HeightScale::Linear);
        for n in derived.normals() {
            assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-5);
            assert!(n.x < 0.0 && n.z > 0.0);
            assert_abs_diff_eq!(n.y, 0.0, epsilon = 1e-6);
        }
        // Slope of the height field is 1/2, normal ∝ (-1/2, 0, 1).
        let expected = Vec3::new(-0.5, 0.0, 1.0).normalize();
        assert_abs_diff_eq!(derived.normals()[4], expected, epsilon = 1e-5);
    }

    #[test]
    fn isolated_and_duplicate_points() {
        // Fewer than three distinct points: every normal is up.
        let positions = vec![Vec2::ZERO, Vec2::X];
        let tri = triangulate(&positions);
        let derived = ChannelDerived::compute(&[1.0, 2.0], &positions, &tri, HeightScale::Linear);
        assert!(derived.normals().iter().all(|n| *n == Vec3::Z));

        let positions = vec![Vec2::ZERO, Vec2::X, Vec2::Y, Vec2::new(1e-9, 0.0)];
        let tri = triangulate(&positions);
        let derived = ChannelDerived::compute(
            &[0.0, 1.0, 0.0, 0.0],
            &positions,
            &tri,
            HeightScale::Linear,
        );
        assert_eq!(derived.normals()[3], derived.normals()[0]);
    }

    #[test]
    fn cache_validity() {
        use crate::source::mock::TableSource;
        use base::math::Sph2;

        let (positions, tri) = square();
        let mut source = TableSource::new(
            vec![Sph2::zero(); 5],
            vec![vec![1.0, 2.0, 3.0, 4.0, 5.0], vec![5.0, 4.0, 3.0, 2.0, 1.0]],
        );
        let mut samples = source.query_incident_angle(Sph2::zero(), 1, 1).unwrap();
        let mut raw = RawMeasurement::from_sample_set(&mut samples, 2).unwrap();
        let mut cache = ChannelCache::new(2, HeightScale::Linear);
        assert_eq!(cache.mask(), vec![false, false]);
        assert!(cache.get(1).is_none());

        let first = cache
            .ensure(1, &mut raw, &source, &positions, &tri)
            .unwrap()
            .heights()
            .to_vec();
        cache.ensure(1, &mut raw, &source, &positions, &tri).unwrap();
        assert_eq!(cache.computations(), 1);
        assert_eq!(source.row_fetches(), 1);
        assert_eq!(cache.get(1).unwrap().heights(), &first[..]);
        assert_eq!(cache.mask(), vec![false, true]);

        cache.set_scale(HeightScale::Logarithmic);
        assert_eq!(cache.mask(), vec![false, false]);
        cache.ensure(1, &mut raw, &source, &positions, &tri).unwrap();
        // The row is already materialised.
        assert_eq!(source.row_fetches(), 1);
        assert_eq!(cache.computations(), 2);

        assert!(matches!(
            cache.ensure(2, &mut raw, &source, &positions, &tri),
            Err(SourceError::ChannelOutOfRange { channel: 2, count: 2 })
        ));
    }
}
