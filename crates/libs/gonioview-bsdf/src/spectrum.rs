//! Spectral helpers: colour matching functions, luminance, display colours
//! and the normalised spectrum shown for a selection.

use base::math::Vec3;

/// Piecewise Gaussian used by the analytic fit of the CIE 1931 colour
/// matching functions (Wyman, Sloan and Shirley, 2013).
#[inline]
fn piecewise_gaussian(x: f32, mu: f32, sigma_lo: f32, sigma_hi: f32) -> f32 {
    let t = (x - mu) / if x < mu { sigma_lo } else { sigma_hi };
    (-0.5 * t * t).exp()
}

/// CIE 1931 2° colour matching functions evaluated at `nm`.
pub fn cie_xyz(nm: f32) -> Vec3 {
    let x = 1.056 * piecewise_gaussian(nm, 599.8, 37.9, 31.0)
        + 0.362 * piecewise_gaussian(nm, 442.0, 16.0, 26.7)
        - 0.065 * piecewise_gaussian(nm, 501.1, 20.4, 26.2);
    let y = 0.821 * piecewise_gaussian(nm, 568.8, 46.9, 40.5)
        + 0.286 * piecewise_gaussian(nm, 530.9, 16.3, 31.1);
    let z = 1.217 * piecewise_gaussian(nm, 437.0, 11.8, 36.0)
        + 0.681 * piecewise_gaussian(nm, 459.0, 26.0, 13.8);
    Vec3::new(x, y, z)
}

/// Photopic luminous efficiency at `nm`, the `ȳ` matching function.
pub fn photopic_efficiency(nm: f32) -> f32 { cie_xyz(nm).y }

/// Converts CIE XYZ to linear sRGB (D65).
pub fn xyz_to_linear_srgb(xyz: Vec3) -> Vec3 {
    Vec3::new(
        3.2406 * xyz.x - 1.5372 * xyz.y - 0.4986 * xyz.z,
        -0.9689 * xyz.x + 1.8758 * xyz.y + 0.0415 * xyz.z,
        0.0557 * xyz.x - 0.2040 * xyz.y + 1.0570 * xyz.z,
    )
}

/// Photopic weighted average of a sampled spectrum.
///
/// Falls back to the plain mean when no sample lies in the visible range.
pub fn luminance(wavelengths: &[f32], values: &[f32]) -> f32 {
    debug_assert_eq!(wavelengths.len(), values.len());
    if values.is_empty() {
        return 0.0;
    }
    let (weighted, weights) = wavelengths
        .iter()
        .zip(values)
        .fold((0.0, 0.0), |(acc, w_acc), (&nm, &v)| {
            let w = photopic_efficiency(nm);
            (acc + w * v, w_acc + w)
        });
    if weights > 1e-6 {
        weighted / weights
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Display colour of a sampled spectrum: the linear sRGB colour normalised
/// so that its largest component is 1, clamped to `[0, 1]`.
///
/// Black spectra and spectra outside the visible range give mid grey.
pub fn spectrum_to_rgb(wavelengths: &[f32], values: &[f32]) -> Vec3 {
    let xyz = wavelengths
        .iter()
        .zip(values)
        .fold(Vec3::ZERO, |acc, (&nm, &v)| acc + cie_xyz(nm) * v.max(0.0));
    let rgb = xyz_to_linear_srgb(xyz).max(Vec3::ZERO);
    let peak = rgb.max_element();
    if peak > 1e-8 && peak.is_finite() {
        (rgb / peak).clamp(Vec3::ZERO, Vec3::ONE)
    } else {
        Vec3::splat(0.5)
    }
}

/// Spectrum shown for a selection.
///
/// Keeps the samples whose wavelength lies strictly inside `band` and scales
/// them so that the largest value equals `ceiling`. When the largest kept
/// value is not positive the values are returned unscaled.
///
/// Returns `(wavelength, value)` pairs.
pub fn normalized_spectrum(
    wavelengths: &[f32],
    values: &[f32],
    band: (f32, f32),
    ceiling: f32,
) -> Vec<(f32, f32)> {
    let kept = wavelengths
        .iter()
        .zip(values)
        .filter(|&(&nm, _)| nm > band.0 && nm < band.1)
        .map(|(&nm, &v)| (nm, v))
        .collect::<Vec<_>>();
    let max = kept
        .iter()
        .map(|(_, v)| *v)
        .fold(f32::NEG_INFINITY, f32::max);
    if max > 0.0 && max.is_finite() {
        let scale = ceiling / max;
        kept.into_iter().map(|(nm, v)| (nm, v * scale)).collect()
    } else {
        kept
    }
}
