//! Bulk uptake of a thin slab.
//!
//! For a plane sheet of thickness `2l` the fraction of the initial content
//! still inside after time `t` is
//!
//! ```text
//! C/C0 = Σ 8 / ((2n+1)² π²) · exp(-D (2n+1)² π² t / 4l²)
//! ```
//!
//! and the fractional approach to equilibrium is `1 - C/C0`.

use ndarray::Array1;
use std::f64::consts::PI;

use crate::diffusion::{ThinSlabOptions, MICRONS_PER_METER};
use crate::error::{DiffusionError, Result};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Time axis and bulk curves of a thin slab.
#[derive(Debug, Clone, PartialEq)]
pub struct ThinSlabCurve {
    pub time_hours: Array1<f64>,
    /// C/C0, the fraction of the initial content remaining.
    pub remaining: Array1<f64>,
    /// Fractional uptake, `1 - remaining`: 0 at `t = 0`, approaching 1.
    pub uptake: Array1<f64>,
}

/// Bulk curve of a slab `thickness_microns` thick over `[0, max_time_hours]`.
///
/// Both curves are clamped into `[0, 1]` to absorb the truncation error of
/// the series at `t = 0`.
///
/// # Examples
///
/// ```
/// use hydiff_rs::diffusion::{thin_slab_uptake, ThinSlabOptions};
///
/// let curve = thin_slab_uptake(-12.0, 500.0, &ThinSlabOptions::default()).unwrap();
/// assert_eq!(curve.time_hours.len(), 300);
/// assert!(curve.uptake[0] < 0.01);
/// assert!(curve.uptake[299] > 0.99);
/// ```
pub fn thin_slab_uptake(
    log10_diffusivity: f64,
    thickness_microns: f64,
    options: &ThinSlabOptions,
) -> Result<ThinSlabCurve> {
    if thickness_microns <= 0.0 || !thickness_microns.is_finite() {
        return Err(DiffusionError::NumericalDegeneracy(format!(
            "slab thickness must be positive, got {} microns",
            thickness_microns
        )));
    }
    if options.max_time_hours < 0.0 || !options.max_time_hours.is_finite() {
        return Err(DiffusionError::NumericalDegeneracy(format!(
            "maximum time must be non-negative, got {} hours",
            options.max_time_hours
        )));
    }
    if options.timesteps == 0 || options.series_terms == 0 {
        return Err(DiffusionError::InvalidInput(format!(
            "timesteps ({}) and series_terms ({}) must be positive",
            options.timesteps, options.series_terms
        )));
    }
    let diffusivity = 10f64.powf(log10_diffusivity);
    if !diffusivity.is_finite() {
        return Err(DiffusionError::NumericalDegeneracy(format!(
            "log10 diffusivity {} does not give a finite diffusivity",
            log10_diffusivity
        )));
    }

    let half = thickness_microns / MICRONS_PER_METER / 2.0;
    let time_hours = Array1::linspace(0.0, options.max_time_hours, options.timesteps);
    let remaining = time_hours.mapv(|hours| {
        fraction_remaining(diffusivity, hours * SECONDS_PER_HOUR, half, options.series_terms)
    });
    let uptake = remaining.mapv(|r| 1.0 - r);

    Ok(ThinSlabCurve {
        time_hours,
        remaining,
        uptake,
    })
}

fn fraction_remaining(diffusivity: f64, seconds: f64, half: f64, terms: usize) -> f64 {
    let mut sum = 0.0;
    for n in 0..terms {
        let odd = (2 * n + 1) as f64;
        let decay = (-diffusivity * odd * odd * PI * PI * seconds / (4.0 * half * half)).exp();
        if decay == 0.0 {
            break;
        }
        sum += 8.0 / (odd * odd * PI * PI) * decay;
    }
    sum.clamp(0.0, 1.0)
}
