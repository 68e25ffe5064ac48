//! Arrhenius relations between diffusivity and temperature.
//!
//! `D = D0 · exp(-Ea / RT)`, so `log10 D` is linear in `1e4 / T`:
//! the slope gives the activation energy and the intercept gives `log10 D0`.

use log::{debug, warn};
use nalgebra::{Matrix2, Vector2};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::f64::consts::LN_10;
use std::fmt;

use crate::error::{DiffusionError, Result};
use crate::fit::WholeBlockFit;
use crate::geometry::Orientation;

/// Gas constant in kJ/(mol K).
pub const GAS_CONSTANT: f64 = 0.00831;

/// Offset from Celsius to Kelvin.
pub const KELVIN_OFFSET: f64 = 273.15;

/// The rounded `ln 10` used to convert a log10 slope to an activation energy.
const LN10_ROUNDED: f64 = 2.303;

/// A value with its one-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Measurement {
    pub value: f64,
    pub error: f64,
}

impl Measurement {
    pub fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match f.precision() {
            Some(p) => write!(f, "{:.*} +/- {:.*}", p, self.value, p, self.error),
            None => write!(f, "{} +/- {}", self.value, self.error),
        }
    }
}

/// Straight-line fit of `log10 D` against `1e4 / T`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusFit {
    /// kJ/mol
    pub activation_energy: Measurement,
    /// m²/s
    pub d0: Measurement,
    pub slope: f64,
    pub intercept: f64,
}

impl ArrheniusFit {
    /// log10 diffusivity predicted at `celsius`.
    pub fn log10_d_at(&self, celsius: f64) -> f64 {
        what_is_d(self.activation_energy.value, self.d0.value, celsius)
    }
}

/// Activation energy and pre-exponential factor from diffusivities
/// (log10 m²/s) measured at temperatures in Celsius.
///
/// Returns `Ok(None)` with a warning when there are fewer than two points.
/// The individual diffusivity errors are not used as weights; the reported
/// errors come from the scatter about the line.
///
/// # Examples
///
/// ```
/// use hydiff_rs::arrhenius::{solve_ea_d0, what_is_d};
///
/// let celsius = [800.0, 900.0, 1000.0];
/// let log10_d: Vec<f64> = celsius.iter().map(|&t| what_is_d(150.0, 1e-4, t)).collect();
///
/// let fit = solve_ea_d0(&log10_d, &celsius).unwrap().unwrap();
/// assert!((fit.activation_energy.value - 150.0).abs() < 0.2);
/// ```
pub fn solve_ea_d0(log10_d: &[f64], celsius: &[f64]) -> Result<Option<ArrheniusFit>> {
    if log10_d.len() != celsius.len() {
        return Err(DiffusionError::DimensionMismatch(format!(
            "{} diffusivities but {} temperatures",
            log10_d.len(),
            celsius.len()
        )));
    }
    if log10_d.len() < 2 {
        warn!("Arrhenius fit needs at least two points, got {}", log10_d.len());
        return Ok(None);
    }

    let x: Vec<f64> = celsius.iter().map(|c| 1e4 / (c + KELVIN_OFFSET)).collect();
    let (coefficients, covariance) = weighted_line(&x, log10_d)?;
    let (slope, intercept) = (coefficients[0], coefficients[1]);
    let slope_error = covariance[(0, 0)].max(0.0).sqrt();
    let intercept_error = covariance[(1, 1)].max(0.0).sqrt();

    let energy_factor = LN10_ROUNDED * GAS_CONSTANT * 1e4;
    let d0 = 10f64.powf(intercept);
    debug!(
        "Arrhenius fit over {} points: slope {:.4}, intercept {:.4}",
        x.len(),
        slope,
        intercept
    );

    Ok(Some(ArrheniusFit {
        activation_energy: Measurement::new(-slope * energy_factor, slope_error * energy_factor),
        d0: Measurement::new(d0, d0 * LN_10 * intercept_error),
        slope,
        intercept,
    }))
}

/// Weighted straight line through the points plus a copy of the last point
/// at negligible weight, which keeps the covariance finite for two points.
fn weighted_line(x: &[f64], y: &[f64]) -> Result<(Vector2<f64>, Matrix2<f64>)> {
    let n = x.len();
    let weight = |i: usize| if i < n { 1.0 } else { f64::EPSILON };
    let point = |i: usize| if i < n { (x[i], y[i]) } else { (x[n - 1], y[n - 1]) };

    let mut ata = Matrix2::zeros();
    let mut aty = Vector2::zeros();
    for i in 0..=n {
        let (xi, yi) = point(i);
        let w2 = weight(i) * weight(i);
        let row = Vector2::new(xi, 1.0);
        ata += row * row.transpose() * w2;
        aty += row * yi * w2;
    }

    let inverse = ata.try_inverse().ok_or_else(|| {
        DiffusionError::SingularMatrix("all Arrhenius points share one temperature".to_string())
    })?;
    let coefficients = inverse * aty;

    let rss: f64 = (0..=n)
        .map(|i| {
            let (xi, yi) = point(i);
            let r = weight(i) * (yi - coefficients[0] * xi - coefficients[1]);
            r * r
        })
        .sum();
    // n + 1 rows, two coefficients
    let dof = (n - 1) as f64;
    Ok((coefficients, inverse * (rss / dof)))
}

/// log10 diffusivity (m²/s) at `celsius` from an activation energy in
/// kJ/mol and `d0` in m²/s.
pub fn what_is_d(activation_energy: f64, d0: f64, celsius: f64) -> f64 {
    let kelvin = celsius + KELVIN_OFFSET;
    (d0 * (-activation_energy / (GAS_CONSTANT * kelvin)).exp()).log10()
}

/// Points of the Arrhenius line for `1e4/T` from `low` to `high`:
/// returns `(1e4/T, log10 D)`.
pub fn arrhenius_line(activation_energy: f64, d0: f64, low: f64, high: f64, points: usize) -> (Array1<f64>, Array1<f64>) {
    let inverse_t = Array1::linspace(low, high, points);
    let log10_d = inverse_t.mapv(|x| {
        let kelvin = 1e4 / x;
        d0.log10() - activation_energy / (LN10_ROUNDED * GAS_CONSTANT * kelvin)
    });
    (inverse_t, log10_d)
}

/// Diffusivities measured at one orientation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiffusivitySeries {
    pub celsius: Vec<f64>,
    pub log10_d: Vec<f64>,
    pub errors: Vec<f64>,
}

impl DiffusivitySeries {
    pub fn len(&self) -> usize {
        self.log10_d.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log10_d.is_empty()
    }
}

/// A set of diffusivity estimates || x, || y, || z and unoriented,
/// typically one experiment series at several temperatures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Diffusivities {
    pub description: Option<String>,
    series: [DiffusivitySeries; 4],
}

impl Diffusivities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Use the same values for every orientation.
    pub fn with_all(mut self, celsius: &[f64], log10_d: &[f64], errors: &[f64]) -> Result<Self> {
        for orientation in Orientation::ALL {
            self = self.with_orientation(orientation, celsius, log10_d, errors)?;
        }
        Ok(self)
    }

    /// Replace the values at one orientation. `errors` may be empty.
    pub fn with_orientation(
        mut self,
        orientation: Orientation,
        celsius: &[f64],
        log10_d: &[f64],
        errors: &[f64],
    ) -> Result<Self> {
        if celsius.len() != log10_d.len() || !(errors.is_empty() || errors.len() == log10_d.len()) {
            return Err(DiffusionError::DimensionMismatch(format!(
                "{}: {} temperatures, {} diffusivities, {} errors",
                orientation,
                celsius.len(),
                log10_d.len(),
                errors.len()
            )));
        }
        self.series[orientation.index()] = DiffusivitySeries {
            celsius: celsius.to_vec(),
            log10_d: log10_d.to_vec(),
            errors: errors.to_vec(),
        };
        Ok(self)
    }

    /// Append one measurement.
    pub fn push(&mut self, orientation: Orientation, celsius: f64, log10_d: f64, error: f64) {
        let series = &mut self.series[orientation.index()];
        series.celsius.push(celsius);
        series.log10_d.push(log10_d);
        series.errors.push(error);
    }

    /// Append the a, b, c diffusivities of a whole-block fit as x, y, z.
    pub fn push_whole_block(&mut self, celsius: f64, fit: &WholeBlockFit) {
        for (k, orientation) in [Orientation::X, Orientation::Y, Orientation::Z].into_iter().enumerate() {
            let error = fit.stderrs[k].unwrap_or(0.0);
            self.push(orientation, celsius, fit.log10_diffusivities[k], error);
        }
    }

    pub fn series(&self, orientation: Orientation) -> &DiffusivitySeries {
        &self.series[orientation.index()]
    }

    /// Arrhenius fit at one orientation; `None` with fewer than two points.
    pub fn solve_ea_d0(&self, orientation: Orientation) -> Result<Option<ArrheniusFit>> {
        let series = self.series(orientation);
        if series.len() < 2 {
            warn!(
                "{}: only {} point(s) {}",
                self.description.as_deref().unwrap_or("diffusivities"),
                series.len(),
                orientation
            );
            return Ok(None);
        }
        solve_ea_d0(&series.log10_d, &series.celsius)
    }

    /// log10 D at `celsius` from the Arrhenius fit at one orientation.
    pub fn what_is_d(&self, celsius: f64, orientation: Orientation) -> Result<Option<f64>> {
        Ok(self
            .solve_ea_d0(orientation)?
            .map(|fit| fit.log10_d_at(celsius)))
    }

    /// [`what_is_d`](Self::what_is_d) for x, y, z and unoriented.
    pub fn what_is_d_all(&self, celsius: f64) -> Result<[Option<f64>; 4]> {
        let mut result = [None; 4];
        for orientation in Orientation::ALL {
            result[orientation.index()] = self.what_is_d(celsius, orientation)?;
        }
        Ok(result)
    }
}
