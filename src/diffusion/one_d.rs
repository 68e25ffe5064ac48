//! Diffusion across a slab of finite thickness.
//!
//! With the slab spanning `[-a, a]`, the interior of a crystal that starts
//! at concentration 1 and is held at 0 on both faces follows
//!
//! ```text
//! erf((a + x) / 2√(Dt)) + erf((a - x) / 2√(Dt)) - 1
//! ```
//!
//! or, equivalently, the cosine series
//!
//! ```text
//! 4/π Σ (-1)^n / (2n+1) · exp(-D (2n+1)² π² t / (2a)²) · cos((2n+1) π x / 2a)
//! ```
//!
//! Uptake (final above initial) uses `1 - profile`. Either curve is then
//! stretched between the lower and upper concentration levels.

use ndarray::Array1;
use statrs::function::erf::erf;
use std::f64::consts::PI;

use crate::diffusion::{check_paired, Direction, Method, Profile, ProfileOptions, MICRONS_PER_METER};
use crate::error::{DiffusionError, Result};
use crate::parameters::ParameterSet;
use crate::setup::SlabParams;

/// Generated profile for a 1D parameter set.
///
/// Positions are `sample_points` microns evenly spaced over the full
/// thickness and centered on the slab midpoint.
///
/// # Examples
///
/// ```
/// use hydiff_rs::diffusion::{evaluate_1d, ProfileOptions};
/// use hydiff_rs::setup::setup_1d;
///
/// let params = setup_1d(200.0, -13.0, 3600.0).unwrap();
/// let profile = evaluate_1d(&params, &ProfileOptions::default()).unwrap();
///
/// assert_eq!(profile.len(), 50);
/// assert_eq!(profile.positions[0], -100.0);
/// // Rims have lost more than the core
/// assert!(profile.values[0] < profile.values[25]);
/// ```
pub fn evaluate_1d(params: &ParameterSet, options: &ProfileOptions) -> Result<Profile> {
    let slab = SlabParams::from_set(params)?;
    slab_profile(&slab, options)
}

/// `model - observed` at the observed positions (microns).
///
/// When `options.center_positions` is set, positions are measured from one
/// face of the slab and are shifted by half the thickness first.
pub fn residuals_1d(
    params: &ParameterSet,
    positions_microns: &[f64],
    observed: &[f64],
    options: &ProfileOptions,
) -> Result<Array1<f64>> {
    check_paired(positions_microns.len(), observed.len())?;
    let slab = SlabParams::from_set(params)?;
    let model = slab_at_positions(&slab, positions_microns, options)?;
    Ok(model - &Array1::from(observed.to_vec()))
}

pub(crate) fn slab_profile(slab: &SlabParams, options: &ProfileOptions) -> Result<Profile> {
    options.validate()?;
    let half = half_width_meters(slab.length)?;
    let x = Array1::linspace(-half, half, options.sample_points);
    let values = slab_model(slab, &x, options)?;
    Ok(Profile {
        positions: x * MICRONS_PER_METER,
        values,
    })
}

/// Model values at arbitrary observed positions (microns).
pub(crate) fn slab_at_positions(
    slab: &SlabParams,
    positions_microns: &[f64],
    options: &ProfileOptions,
) -> Result<Array1<f64>> {
    let half = half_width_meters(slab.length)?;
    let shift = if options.center_positions { half } else { 0.0 };
    let x = Array1::from_iter(
        positions_microns
            .iter()
            .map(|&microns| microns / MICRONS_PER_METER - shift),
    );
    slab_model(slab, &x, options)
}

/// Concentration at positions `x` (meters from the slab midpoint).
pub(crate) fn slab_model(slab: &SlabParams, x: &Array1<f64>, options: &ProfileOptions) -> Result<Array1<f64>> {
    options.validate_method()?;
    let half = half_width_meters(slab.length)?;
    if slab.time < 0.0 || !slab.time.is_finite() {
        return Err(DiffusionError::NumericalDegeneracy(format!(
            "time must be a non-negative number of seconds, got {}",
            slab.time
        )));
    }
    let diffusivity = 10f64.powf(slab.log10_diffusivity);
    if !diffusivity.is_finite() {
        return Err(DiffusionError::NumericalDegeneracy(format!(
            "log10 diffusivity {} does not give a finite diffusivity",
            slab.log10_diffusivity
        )));
    }

    let unit = match options.method {
        Method::Erf => erf_profile(x, half, diffusivity, slab.time),
        Method::Series => series_profile(x, half, diffusivity, slab.time, options.series_terms),
    };

    let direction = Direction::new(slab.initial_value, slab.final_value);
    let range = direction.solubility - direction.floor;
    Ok(unit.mapv(|u| {
        let u = if direction.going_out { u } else { 1.0 - u };
        u * range + direction.floor
    }))
}

fn half_width_meters(length_microns: f64) -> Result<f64> {
    if length_microns <= 0.0 || !length_microns.is_finite() {
        return Err(DiffusionError::NumericalDegeneracy(format!(
            "slab length must be positive, got {} microns",
            length_microns
        )));
    }
    Ok(length_microns / MICRONS_PER_METER / 2.0)
}

fn erf_profile(x: &Array1<f64>, half: f64, diffusivity: f64, time: f64) -> Array1<f64> {
    let denom = 2.0 * (diffusivity * time).sqrt();
    x.mapv(|xi| scaled_erf(half + xi, denom) + scaled_erf(half - xi, denom) - 1.0)
}

/// `erf(num / denom)`, taking the `t = 0` limit when `denom` is zero.
fn scaled_erf(num: f64, denom: f64) -> f64 {
    if denom > 0.0 {
        erf(num / denom)
    } else if num > 0.0 {
        1.0
    } else if num < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn series_profile(x: &Array1<f64>, half: f64, diffusivity: f64, time: f64, terms: usize) -> Array1<f64> {
    let two_a = 2.0 * half;
    let mut sum = Array1::<f64>::zeros(x.len());
    for n in 0..terms {
        let odd = (2 * n + 1) as f64;
        let sign = if n % 2 == 0 { 1.0 } else { -1.0 };
        let decay = (-diffusivity * odd * odd * PI * PI * time / (two_a * two_a)).exp();
        if decay == 0.0 {
            break;
        }
        let weight = sign / odd * decay;
        sum.zip_mut_with(x, |s, &xi| *s += weight * (odd * PI * xi / two_a).cos());
    }
    sum * (4.0 / PI)
}
