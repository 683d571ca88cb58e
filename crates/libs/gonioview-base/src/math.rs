//! Math utilities and conversions between the coordinate spaces used by the
//! viewer.
//!
//! Four spaces are involved:
//!
//! + hemisphere angles `(θ, φ)` in degrees, θ measured from the z-axis and φ
//!   the azimuth measured from the x-axis;
//! + unit 3D direction vectors;
//! + the disk layout, a 2D projection of the hemisphere onto the unit disk
//!   where the radius is proportional to θ (θ = 90° lies on the unit circle);
//! + the screen, pixel coordinates with the origin at the top-left corner
//!   obtained through a model-view-projection matrix.
//!
//! All the functions here are pure.

use crate::units::{Degrees, Radians};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub use glam::*;

/// Returns the square of the given value.
#[inline(always)]
pub fn sqr(x: f32) -> f32 { x * x }

/// Direction on the unit hemisphere expressed in degrees.
#[derive(Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sph2 {
    /// Zenith angle (polar angle), 0 is the zenith, 90° the horizon.
    pub theta: Degrees,
    /// Azimuth angle, 0 is the positive x-axis, 90° the positive y-axis.
    pub phi: Degrees,
}

impl Sph2 {
    /// Create a new spherical coordinate.
    pub const fn new(zenith: Degrees, azimuth: Degrees) -> Self {
        Self {
            theta: zenith,
            phi: azimuth,
        }
    }

    /// Create a new coordinate with zenith and azimuth angles set to 0.
    pub const fn zero() -> Self {
        Self {
            theta: Degrees::ZERO,
            phi: Degrees::ZERO,
        }
    }

    /// Convert to a unit vector.
    pub fn to_cartesian(&self) -> Vec3 { hemisphere_to_vec3(self.theta, self.phi) }

    /// Convert from a (not necessarily normalised) vector.
    pub fn from_cartesian(v: Vec3) -> Self { vec3_to_hemisphere(v) }

    /// Position of the direction in the disk layout.
    pub fn to_disk(&self) -> Vec2 { hemisphere_to_disk(self.theta, self.phi) }
}

impl Default for Sph2 {
    fn default() -> Self { Self::zero() }
}

impl Debug for Sph2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{ θ: {}, φ: {} }}", self.theta, self.phi)
    }
}

impl Display for Sph2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ θ: {}, φ: {} }}",
            self.theta.prettified(),
            self.phi.prettified()
        )
    }
}

/// Conversion from hemisphere angles to a unit vector.
///
/// # Arguments
///
/// * `theta` - polar angle measured from the z-axis
/// * `phi` - azimuthal angle measured from the x-axis
pub fn hemisphere_to_vec3(theta: Degrees, phi: Degrees) -> Vec3 {
    let theta: Radians = theta.into();
    let phi: Radians = phi.into();
    let sin_theta = theta.sin();
    Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), theta.cos())
}

/// Conversion from a direction vector to hemisphere angles.
///
/// The vector doesn't need to be normalised. The returned azimuth lies in
/// `(-180°, 180°]` as given by `atan2`.
pub fn vec3_to_hemisphere(v: Vec3) -> Sph2 {
    let len = v.length();
    let cos_theta = if len > 0.0 {
        (v.z / len).clamp(-1.0, 1.0)
    } else {
        1.0
    };
    Sph2 {
        theta: Degrees::new(cos_theta.acos().to_degrees()),
        phi: Degrees::new(v.y.atan2(v.x).to_degrees()),
    }
}

/// Conversion from hemisphere angles to the disk layout.
///
/// The radius is `θ / 90°` and the angle on the disk is φ.
pub fn hemisphere_to_disk(theta: Degrees, phi: Degrees) -> Vec2 {
    let r = theta.value() / 90.0;
    Vec2::new(r * phi.cos(), r * phi.sin())
}

/// Conversion from a direction vector to the disk layout.
///
/// Same as composing [`vec3_to_hemisphere`] and [`hemisphere_to_disk`] but
/// stays in radians and uses the normalised z-component directly.
pub fn vec3_to_disk(v: Vec3) -> Vec2 {
    let len = v.length();
    if len == 0.0 {
        return Vec2::ZERO;
    }
    let r = (v.z / len).clamp(-1.0, 1.0).acos() * std::f32::consts::FRAC_2_PI;
    let planar = v.y.hypot(v.x);
    if planar == 0.0 {
        // On the pole the azimuth is undefined, atan2(0, 0) gives 0 as well.
        return Vec2::new(r, 0.0);
    }
    Vec2::new(r * v.x / planar, r * v.y / planar)
}

/// Conversion from the disk layout back to hemisphere angles.
pub fn disk_to_hemisphere(p: Vec2) -> Sph2 {
    Sph2 {
        theta: Degrees::new(p.length() * 90.0),
        phi: Degrees::new(p.y.atan2(p.x).to_degrees()),
    }
}

/// Projects a point onto the screen.
///
/// The point is transformed by `mvp`, divided by its homogeneous coordinate
/// and mapped to pixel coordinates of a canvas of size `canvas` whose origin
/// is the top-left corner (y axis pointing down).
///
/// Returns the pixel coordinates in `x` and `y` and the normalised device
/// depth in `z`; `None` if the point is on or behind the eye plane.
pub fn project_to_screen(point: Vec3, canvas: UVec2, mvp: &Mat4) -> Option<Vec3> {
    let clip = *mvp * point.extend(1.0);
    if clip.w <= 0.0 {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let size = canvas.as_vec2();
    Some(Vec3::new(
        (ndc.x + 1.0) * 0.5 * size.x,
        size.y - (ndc.y + 1.0) * 0.5 * size.y,
        ndc.z,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deg;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[test]
    fn hemisphere_vector_axes() {
        assert_abs_diff_eq!(hemisphere_to_vec3(deg!(0.0), deg!(0.0)), Vec3::Z);
        assert_abs_diff_eq!(
            hemisphere_to_vec3(deg!(90.0), deg!(0.0)),
            Vec3::X,
            epsilon = 1e-6
        );
        assert_abs_diff_eq!(
            hemisphere_to_vec3(deg!(90.0), deg!(90.0)),
            Vec3::Y,
            epsilon = 1e-6
        );
    }

    #[test]
    fn disk_boundary_is_unit_circle() {
        for phi in (0..360).step_by(15) {
            let p = hemisphere_to_disk(deg!(90.0), deg!(phi as f32));
            assert_abs_diff_eq!(p.length(), 1.0, epsilon = 1e-6);
        }
        assert_eq!(hemisphere_to_disk(deg!(0.0), deg!(123.0)), Vec2::ZERO);
        assert_abs_diff_eq!(
            hemisphere_to_disk(deg!(45.0), deg!(90.0)),
            Vec2::new(0.0, 0.5),
            epsilon = 1e-6
        );
    }

    #[test]
    fn vector_to_disk_handles_pole_and_zero() {
        assert_eq!(vec3_to_disk(Vec3::Z), Vec2::ZERO);
        assert_eq!(vec3_to_disk(Vec3::ZERO), Vec2::ZERO);
        assert_abs_diff_eq!(vec3_to_disk(Vec3::X * 3.0), Vec2::X, epsilon = 1e-6);
    }

    #[test]
    fn screen_projection_flips_y() {
        let canvas = UVec2::new(200, 100);
        let mvp = Mat4::IDENTITY;
        let center = project_to_screen(Vec3::ZERO, canvas, &mvp).unwrap();
        assert_abs_diff_eq!(center, Vec3::new(100.0, 50.0, 0.0));
        let top_right = project_to_screen(Vec3::new(1.0, 1.0, 0.5), canvas, &mvp).unwrap();
        assert_abs_diff_eq!(top_right, Vec3::new(200.0, 0.0, 0.5));
        let bottom_left = project_to_screen(Vec3::new(-1.0, -1.0, 0.0), canvas, &mvp).unwrap();
        assert_abs_diff_eq!(bottom_left.truncate(), Vec2::new(0.0, 100.0));
    }

    #[test]
    fn screen_projection_perspective_divide() {
        let canvas = UVec2::new(100, 100);
        let mvp = Mat4::perspective_rh_gl(90f32.to_radians(), 1.0, 0.1, 10.0);
        // On the optical axis the point always lands in the centre.
        let p = project_to_screen(Vec3::new(0.0, 0.0, -2.0), canvas, &mvp).unwrap();
        assert_abs_diff_eq!(p.truncate(), Vec2::new(50.0, 50.0), epsilon = 1e-4);
        // A point at 45° lands on the border for a 90° field of view.
        let p = project_to_screen(Vec3::new(2.0, 0.0, -2.0), canvas, &mvp).unwrap();
        assert_abs_diff_eq!(p.x, 100.0, epsilon = 1e-3);
        // Behind the camera.
        assert!(project_to_screen(Vec3::new(0.0, 0.0, 2.0), canvas, &mvp).is_none());
    }

    proptest! {
        #[test]
        fn vector_hemisphere_round_trip(theta in 0.0f32..90.0, phi in -179.0f32..179.0) {
            let v = hemisphere_to_vec3(deg!(theta), deg!(phi));
            prop_assert!((v.length() - 1.0).abs() < 1e-5);
            let back = hemisphere_to_vec3(vec3_to_hemisphere(v).theta, vec3_to_hemisphere(v).phi);
            prop_assert!(back.abs_diff_eq(v, 1e-5));
        }

        #[test]
        fn arbitrary_vector_round_trip(x in -1.0f32..1.0, y in -1.0f32..1.0, z in 0.01f32..1.0) {
            let v = Vec3::new(x, y, z).normalize();
            let sph = vec3_to_hemisphere(v);
            prop_assert!(sph.to_cartesian().abs_diff_eq(v, 1e-5));
        }

        #[test]
        fn disk_hemisphere_round_trip(theta in 0.5f32..90.0, phi in -179.0f32..179.0) {
            let p = hemisphere_to_disk(deg!(theta), deg!(phi));
            let sph = disk_to_hemisphere(p);
            prop_assert!((sph.theta.value() - theta).abs() < 1e-3);
            prop_assert!((sph.phi.value() - phi).abs() < 1e-3);
        }

        #[test]
        fn direct_disk_agrees_with_composition(x in -1.0f32..1.0, y in -1.0f32..1.0, z in 0.0f32..1.0) {
            let v = Vec3::new(x, y, z);
            prop_assume!(v.length() > 1e-3);
            let sph = vec3_to_hemisphere(v);
            let composed = hemisphere_to_disk(sph.theta, sph.phi);
            prop_assert!(vec3_to_disk(v).abs_diff_eq(composed, 1e-4));
        }
    }
}
