//! Parameter sets for the diffusion models.
//!
//! `setup_1d` and `setup_3d` build a fresh [`ParameterSet`] with the names the
//! models read. Length and time are always fixed; which diffusivities and
//! concentration bounds vary is chosen by the caller.

use serde::{Deserialize, Serialize};

use crate::error::{DiffusionError, Result};
use crate::parameters::{Link, Parameter, ParameterSet};

/// Canonical parameter names.
pub mod names {
    /// Full slab thickness in microns (1D).
    pub const LENGTH: &str = "length";
    /// log10 of the diffusivity in m²/s (1D).
    pub const LOG10_DIFFUSIVITY: &str = "log10_diffusivity";
    /// Elapsed time in seconds.
    pub const TIME: &str = "time";
    pub const INITIAL_VALUE: &str = "initial_value";
    pub const FINAL_VALUE: &str = "final_value";

    /// Full block dimensions in microns, one per axis (3D).
    pub const LENGTHS: [&str; 3] = ["length_x", "length_y", "length_z"];
    /// log10 diffusivities in m²/s, one per axis (3D).
    pub const LOG10_DIFFUSIVITIES: [&str; 3] = ["log10_dx", "log10_dy", "log10_dz"];
}

/// How the y and z diffusivities of a block relate to x.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    /// Each axis has its own diffusivity.
    #[default]
    Independent,
    /// Dy = Dz = Dx.
    Isotropic,
    /// log10 Dy = log10 Dx - 1, Dz = Dx.
    SlowB,
}

/// Builder for a 1D parameter set.
#[derive(Debug, Clone)]
pub struct Profile1dSetup {
    pub length: f64,
    pub log10_diffusivity: f64,
    pub time: f64,
    pub initial_value: f64,
    pub final_value: f64,
    pub vary_diffusivity: bool,
    pub vary_initial: bool,
    pub vary_final: bool,
}

impl Profile1dSetup {
    /// Diffusion out of a slab (initial 1, final 0) with only D varying.
    pub fn new(length_microns: f64, log10_diffusivity: f64, time_seconds: f64) -> Self {
        Self {
            length: length_microns,
            log10_diffusivity,
            time: time_seconds,
            initial_value: 1.0,
            final_value: 0.0,
            vary_diffusivity: true,
            vary_initial: false,
            vary_final: false,
        }
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    pub fn with_final_value(mut self, value: f64) -> Self {
        self.final_value = value;
        self
    }

    pub fn with_vary_diffusivity(mut self, vary: bool) -> Self {
        self.vary_diffusivity = vary;
        self
    }

    pub fn with_vary_initial(mut self, vary: bool) -> Self {
        self.vary_initial = vary;
        self
    }

    pub fn with_vary_final(mut self, vary: bool) -> Self {
        self.vary_final = vary;
        self
    }

    /// Build the five-parameter set.
    pub fn build(&self) -> Result<ParameterSet> {
        let mut params = ParameterSet::new();
        params.add_fixed(names::LENGTH, self.length)?;
        params.add(Parameter::with_vary(
            names::LOG10_DIFFUSIVITY,
            self.log10_diffusivity,
            self.vary_diffusivity,
        ))?;
        params.add_fixed(names::TIME, self.time)?;
        params.add(Parameter::with_vary(
            names::INITIAL_VALUE,
            self.initial_value,
            self.vary_initial,
        ))?;
        params.add(Parameter::with_vary(
            names::FINAL_VALUE,
            self.final_value,
            self.vary_final,
        ))?;
        Ok(params)
    }
}

/// 1D set with default concentrations (out of the slab, D free).
///
/// # Examples
///
/// ```
/// use hydiff_rs::setup::{names, setup_1d};
///
/// let params = setup_1d(200.0, -13.0, 3600.0).unwrap();
/// assert_eq!(params.len(), 5);
/// assert_eq!(params.free_names(), vec![names::LOG10_DIFFUSIVITY]);
/// ```
pub fn setup_1d(length_microns: f64, log10_diffusivity: f64, time_seconds: f64) -> Result<ParameterSet> {
    Profile1dSetup::new(length_microns, log10_diffusivity, time_seconds).build()
}

/// Builder for a 3D (block) parameter set.
#[derive(Debug, Clone)]
pub struct Block3dSetup {
    pub lengths: [f64; 3],
    pub log10_diffusivities: [f64; 3],
    pub time: f64,
    pub initial_value: f64,
    pub final_value: f64,
    pub linkage: Linkage,
    pub vary_diffusivities: [bool; 3],
    pub vary_initial: bool,
    pub vary_final: bool,
}

impl Block3dSetup {
    /// Requires exactly three lengths and three diffusivities.
    pub fn new(lengths_microns: &[f64], log10_diffusivities: &[f64], time_seconds: f64) -> Result<Self> {
        let lengths = three(lengths_microns, "lengths")?;
        let log10_diffusivities = three(log10_diffusivities, "log10 diffusivities")?;
        Ok(Self {
            lengths,
            log10_diffusivities,
            time: time_seconds,
            initial_value: 1.0,
            final_value: 0.0,
            linkage: Linkage::Independent,
            vary_diffusivities: [true; 3],
            vary_initial: false,
            vary_final: false,
        })
    }

    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    pub fn with_final_value(mut self, value: f64) -> Self {
        self.final_value = value;
        self
    }

    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    pub fn with_vary_diffusivities(mut self, vary: [bool; 3]) -> Self {
        self.vary_diffusivities = vary;
        self
    }

    pub fn with_vary_initial(mut self, vary: bool) -> Self {
        self.vary_initial = vary;
        self
    }

    pub fn with_vary_final(mut self, vary: bool) -> Self {
        self.vary_final = vary;
        self
    }

    pub fn build(&self) -> Result<ParameterSet> {
        let [dx, dy, dz] = names::LOG10_DIFFUSIVITIES;
        let mut params = ParameterSet::new();

        for (name, &length) in names::LENGTHS.iter().zip(self.lengths.iter()) {
            params.add_fixed(name, length)?;
        }
        params.add(Parameter::with_vary(
            dx,
            self.log10_diffusivities[0],
            self.vary_diffusivities[0],
        ))?;
        params.add_fixed(names::TIME, self.time)?;
        params.add(Parameter::with_vary(
            names::INITIAL_VALUE,
            self.initial_value,
            self.vary_initial,
        ))?;
        params.add(Parameter::with_vary(
            names::FINAL_VALUE,
            self.final_value,
            self.vary_final,
        ))?;

        match self.linkage {
            Linkage::Isotropic => {
                params.add_linked(dy, Link::identity(dx))?;
                params.add_linked(dz, Link::identity(dx))?;
            }
            Linkage::SlowB => {
                params.add_linked(dy, Link::offset(dx, -1.0))?;
                params.add_linked(dz, Link::identity(dx))?;
            }
            Linkage::Independent => {
                params.add(Parameter::with_vary(
                    dy,
                    self.log10_diffusivities[1],
                    self.vary_diffusivities[1],
                ))?;
                params.add(Parameter::with_vary(
                    dz,
                    self.log10_diffusivities[2],
                    self.vary_diffusivities[2],
                ))?;
            }
        }

        Ok(params)
    }
}

/// 3D set with default concentrations and independent diffusivities.
pub fn setup_3d(lengths_microns: &[f64], log10_diffusivities: &[f64], time_seconds: f64) -> Result<ParameterSet> {
    Block3dSetup::new(lengths_microns, log10_diffusivities, time_seconds)?.build()
}

fn three(values: &[f64], what: &str) -> Result<[f64; 3]> {
    <[f64; 3]>::try_from(values).map_err(|_| {
        DiffusionError::DimensionMismatch(format!(
            "expected 3 {}, one per axis, got {}",
            what,
            values.len()
        ))
    })
}

/// Model inputs of a 1D slab, read from a parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlabParams {
    pub length: f64,
    pub log10_diffusivity: f64,
    pub time: f64,
    pub initial_value: f64,
    pub final_value: f64,
}

impl SlabParams {
    pub fn from_set(params: &ParameterSet) -> Result<Self> {
        Ok(Self {
            length: lookup(params, names::LENGTH)?,
            log10_diffusivity: lookup(params, names::LOG10_DIFFUSIVITY)?,
            time: lookup(params, names::TIME)?,
            initial_value: lookup(params, names::INITIAL_VALUE)?,
            final_value: lookup(params, names::FINAL_VALUE)?,
        })
    }
}

/// Model inputs of a rectangular block, read from a parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    pub lengths: [f64; 3],
    pub log10_diffusivities: [f64; 3],
    pub time: f64,
    pub initial_value: f64,
    pub final_value: f64,
}

impl BlockParams {
    pub fn from_set(params: &ParameterSet) -> Result<Self> {
        let mut lengths = [0.0; 3];
        let mut log10_diffusivities = [0.0; 3];
        for k in 0..3 {
            lengths[k] = lookup(params, names::LENGTHS[k])?;
            log10_diffusivities[k] = lookup(params, names::LOG10_DIFFUSIVITIES[k])?;
        }
        Ok(Self {
            lengths,
            log10_diffusivities,
            time: lookup(params, names::TIME)?,
            initial_value: lookup(params, names::INITIAL_VALUE)?,
            final_value: lookup(params, names::FINAL_VALUE)?,
        })
    }

    /// The 1D slab seen along axis `k` with the given concentration bounds.
    pub fn slab(&self, k: usize, initial_value: f64, final_value: f64) -> SlabParams {
        SlabParams {
            length: self.lengths[k],
            log10_diffusivity: self.log10_diffusivities[k],
            time: self.time,
            initial_value,
            final_value,
        }
    }
}

fn lookup(params: &ParameterSet, name: &str) -> Result<f64> {
    params
        .value(name)
        .map_err(|_| DiffusionError::ParameterNotFound(name.to_string()))
}
