//! # Diffusion Models
//!
//! Concentration profiles of a species diffusing into or out of a crystal.
//!
//! - [`one_d`]: a slab of finite thickness, by the erf solution or a
//!   truncated cosine series
//! - [`thin_slab`]: total fraction of a thin slab remaining or taken up over time
//! - [`npi`]: a rectangular block as the product of three slab profiles
//! - [`whole_block`]: the block field averaged along a ray path, as seen by
//!   through-thickness spectroscopy
//!
//! Lengths are given in microns and converted to meters internally; times
//! are in seconds and diffusivities are log10 values in m²/s.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DiffusionError, Result};

pub mod npi;
pub mod one_d;
pub mod thin_slab;
pub mod whole_block;

pub use npi::{evaluate_3d_npi, residuals_3d_npi, NpiField};
pub use one_d::{evaluate_1d, residuals_1d};
pub use thin_slab::{thin_slab_uptake, ThinSlabCurve};
pub use whole_block::{evaluate_3d_wb, residuals_3d_wb, RayPaths, WholeBlockProfiles};

/// Microns per meter.
pub(crate) const MICRONS_PER_METER: f64 = 1e6;

/// How a slab profile is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Closed-form sum of two error functions.
    #[default]
    Erf,
    /// Fourier cosine series truncated after `series_terms` terms.
    Series,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Erf => write!(f, "erf"),
            Method::Series => write!(f, "series"),
        }
    }
}

impl FromStr for Method {
    type Err = DiffusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "erf" => Ok(Method::Erf),
            "series" | "infsum" => Ok(Method::Series),
            _ => Err(DiffusionError::UnknownMethod(s.to_string())),
        }
    }
}

/// Options shared by the slab, npi and whole-block models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    pub method: Method,
    /// Terms kept by [`Method::Series`].
    pub series_terms: usize,
    /// Grid size of generated profiles (and of each side of a 3D field).
    pub sample_points: usize,
    /// Observed positions run from one edge of the crystal and are shifted
    /// by half the length before comparison.
    pub center_positions: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            method: Method::Erf,
            series_terms: 100,
            sample_points: 50,
            center_positions: true,
        }
    }
}

impl ProfileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_series_terms(mut self, terms: usize) -> Self {
        self.series_terms = terms;
        self
    }

    pub fn with_sample_points(mut self, points: usize) -> Self {
        self.sample_points = points;
        self
    }

    pub fn with_center_positions(mut self, center: bool) -> Self {
        self.center_positions = center;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.sample_points < 2 {
            return Err(DiffusionError::InvalidInput(format!(
                "sample_points must be at least 2, got {}",
                self.sample_points
            )));
        }
        self.validate_method()
    }

    /// The part of [`validate`](Self::validate) that applies when evaluating
    /// at given positions.
    pub(crate) fn validate_method(&self) -> Result<()> {
        if self.method == Method::Series && self.series_terms == 0 {
            return Err(DiffusionError::InvalidInput(
                "series_terms must be positive for the series method".to_string(),
            ));
        }
        Ok(())
    }
}

/// Options of [`thin_slab_uptake`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThinSlabOptions {
    pub max_time_hours: f64,
    pub series_terms: usize,
    pub timesteps: usize,
}

impl Default for ThinSlabOptions {
    fn default() -> Self {
        Self {
            max_time_hours: 2000.0,
            series_terms: 200,
            timesteps: 300,
        }
    }
}

impl ThinSlabOptions {
    pub fn with_max_time_hours(mut self, hours: f64) -> Self {
        self.max_time_hours = hours;
        self
    }

    pub fn with_series_terms(mut self, terms: usize) -> Self {
        self.series_terms = terms;
        self
    }

    pub fn with_timesteps(mut self, timesteps: usize) -> Self {
        self.timesteps = timesteps;
        self
    }
}

/// Positions (microns) and model concentrations of one profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub positions: Array1<f64>,
    pub values: Array1<f64>,
}

impl Profile {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Paired observed positions (microns) and values along one direction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Observation {
    pub positions: Vec<f64>,
    pub values: Vec<f64>,
}

impl Observation {
    /// Pairs the two arrays, rejecting unequal lengths.
    pub fn new(positions: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        check_paired(positions.len(), values.len())?;
        Ok(Self { positions, values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) fn check_paired(positions: usize, values: usize) -> Result<()> {
    if positions != values {
        return Err(DiffusionError::DimensionMismatch(format!(
            "{} observed positions but {} observed values",
            positions, values
        )));
    }
    Ok(())
}

/// Which way the species moves and the two concentration levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Direction {
    pub going_out: bool,
    /// Upper level: the interior value when going out, the rim value when going in.
    pub solubility: f64,
    pub floor: f64,
}

impl Direction {
    pub fn new(initial_value: f64, final_value: f64) -> Self {
        if initial_value > final_value {
            Self {
                going_out: true,
                solubility: initial_value,
                floor: final_value,
            }
        } else {
            Self {
                going_out: false,
                solubility: final_value,
                floor: initial_value,
            }
        }
    }
}
