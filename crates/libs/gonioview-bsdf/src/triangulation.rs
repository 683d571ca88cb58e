//! Delaunay triangulation of the disk layout.
//!
//! Incremental Bowyer-Watson insertion in double precision. The convex hull
//! is closed by *ghost* triangles, one per hull edge, sharing a vertex at
//! infinity, so no finite super-triangle is needed and hull points are never
//! lost to it.
//!
//! Degenerate inputs:
//!
//! + points closer than the duplicate tolerance are merged; the later point
//!   (in input order) is represented by the first one and appears in no face;
//! + non-finite points appear in no face;
//! + cocircular points are resolved by the strict in-circle test, a point
//!   exactly on a circumcircle does not invalidate the triangle;
//! + fully collinear inputs, or fewer than 3 distinct points, give no face.

use base::math::{DVec2, Vec2};
use std::collections::HashMap;

/// Distance under which two disk positions are considered the same point.
pub const DUPLICATE_TOLERANCE: f64 = 1e-6;

/// Index of the vertex at infinity closing the hull.
const GHOST: usize = usize::MAX;

/// Faces over a set of 2D points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triangulation {
    /// Counter-clockwise triangles, as indices into the input points.
    pub faces: Vec<[u32; 3]>,
    /// For every input point, the index of the point standing in for it in
    /// the faces: itself, or the first point it duplicates.
    pub representatives: Box<[u32]>,
}

impl Triangulation {
    /// Number of faces.
    pub fn n_faces(&self) -> usize { self.faces.len() }

    /// Whether point `i` was merged into another point.
    pub fn is_duplicate(&self, i: usize) -> bool { self.representatives[i] as usize != i }
}

/// Twice the signed area of the triangle `abc`, positive if counter-clockwise.
#[inline]
fn orient(a: DVec2, b: DVec2, c: DVec2) -> f64 { (b - a).perp_dot(c - a) }

/// Positive if `d` lies inside the circumcircle of the counter-clockwise
/// triangle `abc`, negative if outside, zero if on it.
#[inline]
fn in_circle(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> f64 {
    let (ad, bd, cd) = (a - d, b - d, c - d);
    ad.length_squared() * bd.perp_dot(cd) + bd.length_squared() * cd.perp_dot(ad)
        + cd.length_squared() * ad.perp_dot(bd)
}

/// Circumcentre and squared radius; non-finite for degenerate triangles.
fn circumcircle(a: DVec2, b: DVec2, c: DVec2) -> (DVec2, f64) {
    let (ab, ac) = (b - a, c - a);
    let d = 2.0 * ab.perp_dot(ac);
    let (lb, lc) = (ab.length_squared(), ac.length_squared());
    let u = DVec2::new(ac.y * lb - ab.y * lc, ab.x * lc - ac.x * lb) / d;
    (a + u, u.length_squared())
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    /// Counter-clockwise vertices; for ghost triangles the third one is
    /// [`GHOST`] and the hull lies to the right of `v[0] -> v[1]`.
    v: [usize; 3],
    center: DVec2,
    radius2: f64,
    /// The circumcircle lies entirely left of every point still to insert.
    complete: bool,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[DVec2]) -> Self {
        // Rotate the ghost vertex to the last position.
        let v = match v {
            [GHOST, a, b] => [a, b, GHOST],
            [a, GHOST, b] => [b, a, GHOST],
            v => v,
        };
        let (center, radius2) = if v[2] == GHOST {
            (DVec2::NAN, f64::NAN)
        } else {
            circumcircle(pts[v[0]], pts[v[1]], pts[v[2]])
        };
        Self {
            v,
            center,
            radius2,
            complete: false,
        }
    }

    fn is_ghost(&self) -> bool { self.v[2] == GHOST }

    /// Whether inserting `p` invalidates the triangle.
    fn encroached_by(&self, p: DVec2, pts: &[DVec2]) -> bool {
        let [a, b, c] = self.v;
        if c == GHOST {
            let (u, v) = (pts[a], pts[b]);
            let o = orient(u, v, p);
            // Outside the hull edge, or on the edge strictly between its ends.
            o > 0.0 || (o == 0.0 && (p - u).dot(v - u) > 0.0 && (p - v).dot(u - v) > 0.0)
        } else {
            in_circle(pts[a], pts[b], pts[c], p) > 0.0
        }
    }
}

/// Merges points closer than `tolerance`, returns the representative of
/// every point.
fn deduplicate(points: &[DVec2], tolerance: f64) -> Vec<u32> {
    let cell = tolerance.max(f64::EPSILON);
    let tolerance2 = tolerance * tolerance;
    let mut grid: HashMap<(i64, i64), Vec<u32>> = HashMap::new();
    let mut representatives = Vec::with_capacity(points.len());
    for (i, p) in points.iter().enumerate() {
        if !p.is_finite() {
            representatives.push(i as u32);
            continue;
        }
        let key = ((p.x / cell).floor() as i64, (p.y / cell).floor() as i64);
        let found = (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dy| (key.0 + dx, key.1 + dy)))
            .filter_map(|k| grid.get(&k))
            .flatten()
            .copied()
            .find(|&j| points[j as usize].distance_squared(*p) <= tolerance2);
        match found {
            Some(j) => representatives.push(j),
            None => {
                grid.entry(key).or_default().push(i as u32);
                representatives.push(i as u32);
            },
        }
    }
    representatives
}

/// Triangulates `points`, merging points closer than [`DUPLICATE_TOLERANCE`].
pub fn triangulate(points: &[Vec2]) -> Triangulation {
    let pts = points.iter().map(|p| p.as_dvec2()).collect::<Vec<_>>();
    let representatives = deduplicate(&pts, DUPLICATE_TOLERANCE);
    let mut order = (0..pts.len())
        .filter(|&i| representatives[i] as usize == i && pts[i].is_finite())
        .collect::<Vec<_>>();
    let n_duplicates = representatives
        .iter()
        .enumerate()
        .filter(|(i, r)| **r as usize != *i)
        .count();
    if n_duplicates > 0 {
        log::debug!("[Triangulation] Merged {} duplicated points", n_duplicates);
    }

    let faces = if order.len() < 3 {
        Vec::new()
    } else {
        order.sort_by(|&a, &b| {
            pts[a]
                .x
                .total_cmp(&pts[b].x)
                .then(pts[a].y.total_cmp(&pts[b].y))
        });
        bowyer_watson(&pts, &order)
    };

    log::trace!(
        "[Triangulation] {} points -> {} faces",
        points.len(),
        faces.len()
    );
    Triangulation {
        faces,
        representatives: representatives.into_boxed_slice(),
    }
}

/// Inserts the points of `order` (sorted by x) one by one.
fn bowyer_watson(pts: &[DVec2], order: &[usize]) -> Vec<[u32; 3]> {
    // Seed triangle: the first two points and the first point not collinear
    // with them.
    let (p0, p1) = (order[0], order[1]);
    let Some(k) = (2..order.len()).find(|&k| orient(pts[p0], pts[p1], pts[order[k]]) != 0.0)
    else {
        log::debug!("[Triangulation] All points are collinear");
        return Vec::new();
    };
    let p2 = order[k];
    let seed = if orient(pts[p0], pts[p1], pts[p2]) > 0.0 {
        [p0, p1, p2]
    } else {
        [p0, p2, p1]
    };
    let mut triangles = vec![
        Triangle::new(seed, pts),
        Triangle::new([seed[1], seed[0], GHOST], pts),
        Triangle::new([seed[2], seed[1], GHOST], pts),
        Triangle::new([seed[0], seed[2], GHOST], pts),
    ];

    let mut edges: Vec<(usize, usize)> = Vec::new();
    for &i in order[2..].iter().filter(|&&i| i != p2) {
        let p = pts[i];
        edges.clear();
        triangles.retain_mut(|tri| {
            if tri.complete {
                return true;
            }
            if !tri.is_ghost() {
                let dx = p.x - tri.center.x;
                if dx > 0.0 && dx * dx > tri.radius2 * (1.0 + 1e-9) {
                    tri.complete = true;
                    return true;
                }
            }
            if tri.encroached_by(p, pts) {
                let [a, b, c] = tri.v;
                edges.extend([(a, b), (b, c), (c, a)]);
                false
            } else {
                true
            }
        });
        if edges.is_empty() {
            log::trace!("[Triangulation] Point {} does not modify the mesh", i);
            continue;
        }
        // Edges shared by two removed triangles appear in both directions
        // and are interior to the cavity.
        for &(a, b) in edges.iter().filter(|(a, b)| !edges.contains(&(*b, *a))) {
            if a == GHOST && b == GHOST {
                continue;
            }
            triangles.push(Triangle::new([a, b, i], pts));
        }
    }

    let extent = order
        .iter()
        .fold((DVec2::INFINITY, DVec2::NEG_INFINITY), |(lo, hi), &i| {
            (lo.min(pts[i]), hi.max(pts[i]))
        });
    let scale = (extent.1 - extent.0).max_element();
    let min_area2 = 1e-12 * scale * scale;
    triangles
        .iter()
        .filter(|tri| !tri.is_ghost())
        .filter(|tri| orient(pts[tri.v[0]], pts[tri.v[1]], pts[tri.v[2]]) > min_area2)
        .map(|tri| [tri.v[0] as u32, tri.v[1] as u32, tri.v[2] as u32])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use base::{deg, math::hemisphere_to_disk};
    use proptest::prelude::*;

    fn area(points: &[Vec2], face: &[u32; 3]) -> f64 {
        let [a, b, c] = face.map(|i| points[i as usize].as_dvec2());
        0.5 * orient(a, b, c)
    }

    fn assert_covers(points: &[Vec2], tri: &Triangulation) {
        let mut covered = vec![false; points.len()];
        for face in &tri.faces {
            for &v in face {
                covered[v as usize] = true;
            }
        }
        for (i, r) in tri.representatives.iter().enumerate() {
            assert!(covered[*r as usize], "point {} is in no face", i);
        }
    }

    /// Area of the convex hull (Andrew's monotone chain).
    fn hull_area(points: &[Vec2]) -> f64 {
        let mut pts = points.iter().map(|p| p.as_dvec2()).collect::<Vec<_>>();
        pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
        let mut hull: Vec<DVec2> = Vec::new();
        for pass in 0..2 {
            let start = hull.len();
            let iter: Box<dyn Iterator<Item = &DVec2>> = if pass == 0 {
                Box::new(pts.iter())
            } else {
                Box::new(pts.iter().rev())
            };
            for &p in iter {
                while hull.len() >= start + 2
                    && orient(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
                {
                    hull.pop();
                }
                hull.push(p);
            }
            hull.pop();
        }
        (0..hull.len())
            .map(|i| hull[i].perp_dot(hull[(i + 1) % hull.len()]))
            .sum::<f64>()
            * 0.5
    }

    #[test]
    fn too_few_points() {
        assert!(triangulate(&[]).faces.is_empty());
        assert!(triangulate(&[Vec2::ZERO, Vec2::X]).faces.is_empty());
        // Three points, two of them identical.
        let tri = triangulate(&[Vec2::ZERO, Vec2::X, Vec2::X]);
        assert!(tri.faces.is_empty());
        assert!(tri.is_duplicate(2));
    }

    #[test]
    fn collinear_points_give_no_face() {
        let points = (0..5).map(|i| Vec2::new(i as f32, 2.0 * i as f32)).collect::<Vec<_>>();
        assert!(triangulate(&points).faces.is_empty());
    }

    #[test]
    fn collinear_prefix_is_covered() {
        let mut points = (0..5).map(|i| Vec2::new(i as f32, 0.0)).collect::<Vec<_>>();
        points.push(Vec2::new(2.0, 3.0));
        let tri = triangulate(&points);
        assert_eq!(tri.n_faces(), 4);
        assert_covers(&points, &tri);
        assert!(tri.faces.iter().all(|f| area(&points, f) > 0.0));
    }

    #[test]
    fn unit_square() {
        let points = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
        let tri = triangulate(&points);
        assert_eq!(tri.n_faces(), 2);
        assert_covers(&points, &tri);
        let total: f64 = tri.faces.iter().map(|f| area(&points, f)).sum();
        assert_relative_eq!(total, 1.0);
    }

    #[test]
    fn lattice_with_cocircular_points() {
        let points = (0..6)
            .flat_map(|i| (0..5).map(move |j| Vec2::new(i as f32, j as f32)))
            .collect::<Vec<_>>();
        let tri = triangulate(&points);
        // 2 * (cols - 1) * (rows - 1) faces for a full lattice.
        assert_eq!(tri.n_faces(), 2 * 5 * 4);
        assert_covers(&points, &tri);
        let total: f64 = tri.faces.iter().map(|f| area(&points, f)).sum();
        assert_relative_eq!(total, 20.0);
    }

    #[test]
    fn near_duplicates_are_merged() {
        let points = [
            Vec2::ZERO,
            Vec2::X,
            Vec2::Y,
            Vec2::new(1e-8, 0.0),
            Vec2::ONE,
            Vec2::new(1.0, 1.0 + 1e-8),
        ];
        let tri = triangulate(&points);
        assert_eq!(&*tri.representatives, &[0, 1, 2, 0, 4, 4]);
        assert_eq!(tri.n_faces(), 2);
        assert!(tri
            .faces
            .iter()
            .all(|f| !f.contains(&3) && !f.contains(&5) && area(&points, f) > 0.0));
    }

    #[test]
    fn non_finite_points_are_skipped() {
        let points = [Vec2::ZERO, Vec2::X, Vec2::NAN, Vec2::Y];
        let tri = triangulate(&points);
        assert_eq!(tri.n_faces(), 1);
        assert!(!tri.faces[0].contains(&2));
    }

    #[test]
    fn hemisphere_grid_layout() {
        let (n_theta, n_phi) = (8, 16);
        let points = (0..n_theta)
            .flat_map(|i| {
                (0..n_phi).map(move |j| {
                    hemisphere_to_disk(
                        deg!((i as f32 + 0.5) * 90.0 / n_theta as f32),
                        deg!(j as f32 * 360.0 / n_phi as f32),
                    )
                })
            })
            .collect::<Vec<_>>();
        let tri = triangulate(&points);
        assert_covers(&points, &tri);
        assert!(tri.faces.iter().all(|f| area(&points, f) > 0.0));
        let total: f64 = tri.faces.iter().map(|f| area(&points, f)).sum();
        assert_relative_eq!(total, hull_area(&points), max_relative = 1e-6);
    }

    proptest! {
        #[test]
        fn random_points_delaunay(
            coords in prop::collection::vec((-1.0f32..1.0, -1.0f32..1.0), 3..48)
        ) {
            let points = coords.iter().map(|&(x, y)| Vec2::new(x, y)).collect::<Vec<_>>();
            let tri = triangulate(&points);
            prop_assume!(!tri.faces.is_empty());
            assert_covers(&points, &tri);
            for face in &tri.faces {
                prop_assert!(area(&points, face) > 0.0);
                let [a, b, c] = face.map(|i| points[i as usize].as_dvec2());
                for (i, p) in points.iter().enumerate() {
                    if face.contains(&(i as u32)) || tri.is_duplicate(i) {
                        continue;
                    }
                    prop_assert!(in_circle(a, b, c, p.as_dvec2()) <= 1e-9);
                }
            }
            let total: f64 = tri.faces.iter().map(|f| area(&points, f)).sum();
            prop_assert!((total - hull_area(&points)).abs() <= 1e-6 * total.max(1.0));
        }
    }
}
