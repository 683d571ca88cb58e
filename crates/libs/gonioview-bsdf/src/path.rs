//! Overlay polylines derived from the disk layout: iso-θ rings and iso-φ
//! spokes joining consecutively sampled points.

use base::{math::Vec2, units::Degrees};
use serde::Serialize;

/// Kind of overlay edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Both ends share the same polar angle band.
    Ring,
    /// Both ends share the same azimuthal angle band.
    Spoke,
}

/// One overlay edge in disk space.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct PathSegment {
    /// Ring or spoke.
    pub kind: SegmentKind,
    /// Disk position of the first end.
    pub start: Vec2,
    /// Disk position of the second end.
    pub end: Vec2,
    /// Sample point index of the first end.
    pub from: usize,
    /// Sample point index of the second end.
    pub to: usize,
}

/// Angular bands of a disk position.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Bands {
    theta: i64,
    /// `None` on the pole where the azimuth is undefined.
    phi: Option<i64>,
    /// Azimuth in degrees in `[0, 360)`.
    azimuth: f32,
}

impl Bands {
    fn of(p: Vec2, step: f32, n_phi_bands: i64) -> Self {
        let r = p.length();
        let azimuth = p.y.atan2(p.x).to_degrees().rem_euclid(360.0);
        let phi = (r > 1e-6).then(|| ((azimuth / step).round() as i64).rem_euclid(n_phi_bands));
        Self {
            theta: (r * 90.0 / step).round() as i64,
            phi,
            azimuth,
        }
    }
}

/// Builds the overlay segments of the disk layout `positions`, taken in
/// sample order.
///
/// Consecutive points in the same θ band are joined by a ring segment,
/// otherwise consecutive points in the same φ band by a spoke segment. A run
/// of at least three ring segments sweeping the whole circle is closed by a
/// segment from its last point back to its first one.
pub fn build_path_segments(positions: &[Vec2], step: Degrees) -> Vec<PathSegment> {
    if positions.len() < 2 {
        return Vec::new();
    }
    let step = step.value();
    let n_phi_bands = ((360.0 / step).round() as i64).max(1);
    let bands = positions
        .iter()
        .map(|p| Bands::of(*p, step, n_phi_bands))
        .collect::<Vec<_>>();
    let segment = |kind, from: usize, to: usize| PathSegment {
        kind,
        start: positions[from],
        end: positions[to],
        from,
        to,
    };

    let mut segments = Vec::new();
    let mut ring_start: Option<usize> = None;
    for i in 0..positions.len() - 1 {
        let (a, b) = (&bands[i], &bands[i + 1]);
        let kind = if a.theta == b.theta {
            Some(SegmentKind::Ring)
        } else if a.phi.is_some() && a.phi == b.phi {
            Some(SegmentKind::Spoke)
        } else {
            None
        };
        if kind == Some(SegmentKind::Ring) {
            ring_start.get_or_insert(i);
        } else if let Some(start) = ring_start.take() {
            if closes_ring(&bands[start..=i]) {
                segments.push(segment(SegmentKind::Ring, i, start));
            }
        }
        if let Some(kind) = kind {
            if positions[i] != positions[i + 1] {
                segments.push(segment(kind, i, i + 1));
            }
        }
    }
    if let Some(start) = ring_start {
        let last = positions.len() - 1;
        if closes_ring(&bands[start..=last]) {
            segments.push(segment(SegmentKind::Ring, last, start));
        }
    }
    log::trace!(
        "[PathSegments] {} segments over {} points",
        segments.len(),
        positions.len()
    );
    segments
}

/// Whether the points of a ring run go once around the circle in a
/// consistent direction with the closing gap no wider than the others.
fn closes_ring(run: &[Bands]) -> bool {
    if run.len() < 3 || run.iter().any(|b| b.phi.is_none()) {
        return false;
    }
    let gaps = run
        .windows(2)
        .map(|w| (w[1].azimuth - w[0].azimuth).rem_euclid(360.0))
        .collect::<Vec<_>>();
    let closing = (run[0].azimuth - run[run.len() - 1].azimuth).rem_euclid(360.0);
    let total = gaps.iter().sum::<f32>() + closing;
    let widest = gaps.iter().copied().fold(0.0f32, f32::max);
    (total - 360.0).abs() < 1e-2 && closing <= widest * 1.5 + 1e-4
}

#[cfg(test)]
mod tests {
    use super::*;
    use base::{deg, math::hemisphere_to_disk};

    fn grid(n_theta: usize, n_phi: usize, phi_major: bool) -> Vec<Vec2> {
        let point = |i: usize, j: usize| {
            hemisphere_to_disk(
                deg!((i as f32 + 0.5) * 90.0 / n_theta as f32),
                deg!(j as f32 * 360.0 / n_phi as f32),
            )
        };
        if phi_major {
            (0..n_phi)
                .flat_map(|j| (0..n_theta).map(move |i| point(i, j)))
                .collect()
        } else {
            (0..n_theta)
                .flat_map(|i| (0..n_phi).map(move |j| point(i, j)))
                .collect()
        }
    }

    #[test]
    fn closed_rings_on_theta_major_grid() {
        let positions = grid(4, 8, false);
        let segments = build_path_segments(&positions, deg!(1.0));
        assert_eq!(segments.len(), 4 * 8);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Ring));
        // Closing segment of the first ring.
        assert!(segments.iter().any(|s| s.from == 7 && s.to == 0));
        for s in &segments {
            assert_eq!(s.start, positions[s.from]);
            assert_eq!(s.end, positions[s.to]);
            assert!((s.start.length() - s.end.length()).abs() < 1e-6);
        }
    }

    #[test]
    fn spokes_on_phi_major_grid() {
        let positions = grid(4, 8, true);
        let segments = build_path_segments(&positions, deg!(1.0));
        assert_eq!(segments.len(), 3 * 8);
        assert!(segments.iter().all(|s| s.kind == SegmentKind::Spoke));
        assert!(segments.iter().all(|s| s.to == s.from + 1));
    }

    #[test]
    fn scattered_points_give_no_segment() {
        let positions = [
            Vec2::new(0.1, 0.0),
            Vec2::new(0.0, 0.5),
            Vec2::new(-0.9, 0.1),
        ];
        assert!(build_path_segments(&positions, deg!(1.0)).is_empty());
        assert!(build_path_segments(&positions[..1], deg!(1.0)).is_empty());
    }

    #[test]
    fn open_arc_is_not_closed() {
        let positions = (0..5)
            .map(|j| hemisphere_to_disk(deg!(45.0), deg!(j as f32 * 20.0)))
            .collect::<Vec<_>>();
        let segments = build_path_segments(&positions, deg!(1.0));
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|s| s.to == s.from + 1));
    }
}
