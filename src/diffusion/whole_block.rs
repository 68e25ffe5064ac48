//! Whole-block (path-integrated) profiles.
//!
//! A whole-block measurement sees the block field averaged along the ray
//! path. Each profile direction can be measured along either of the two
//! axes orthogonal to it, so a measurement set is described by one ray path
//! per profile direction, e.g. `"bca"`: profile || a seen along b, profile
//! || b along c, profile || c along a.

use log::debug;
use ndarray::{Array1, Array2, Axis as NdAxis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::diffusion::npi::{block_field, NpiField};
use crate::diffusion::{check_paired, Observation, ProfileOptions};
use crate::error::{DiffusionError, Result};
use crate::geometry::Axis;
use crate::parameters::ParameterSet;
use crate::setup::BlockParams;

/// Ray path used for each of the profiles || a, || b and || c.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RayPaths([Axis; 3]);

impl RayPaths {
    /// Checks that every ray path crosses its profile.
    ///
    /// # Examples
    ///
    /// ```
    /// use hydiff_rs::diffusion::RayPaths;
    /// use hydiff_rs::geometry::Axis;
    ///
    /// let raypaths = RayPaths::new([Axis::B, Axis::C, Axis::A]).unwrap();
    /// assert_eq!(raypaths.to_string(), "bca");
    /// assert!("acb".parse::<RayPaths>().is_err());
    /// ```
    pub fn new(raypaths: [Axis; 3]) -> Result<Self> {
        for (profile, raypath) in Axis::ALL.iter().zip(raypaths.iter()) {
            if profile == raypath {
                return Err(DiffusionError::InvalidRaypath {
                    profile: *profile,
                    found: raypath.to_string(),
                    allowed: profile.others(),
                });
            }
        }
        Ok(Self(raypaths))
    }

    pub fn get(&self, profile: Axis) -> Axis {
        self.0[profile.index()]
    }

    pub fn as_array(&self) -> [Axis; 3] {
        self.0
    }
}

impl fmt::Display for RayPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for axis in self.0 {
            write!(f, "{}", axis.letter())?;
        }
        Ok(())
    }
}

impl FromStr for RayPaths {
    type Err = DiffusionError;

    /// Three letters from `a`, `b`, `c`, one per profile direction.
    fn from_str(s: &str) -> Result<Self> {
        let letters: Vec<char> = s.trim().chars().collect();
        if letters.len() != 3 {
            return Err(DiffusionError::DimensionMismatch(format!(
                "ray paths need one letter per profile direction, got '{}'",
                s
            )));
        }

        let mut raypaths = [Axis::A; 3];
        for (profile, (&letter, slot)) in Axis::ALL.iter().zip(letters.iter().zip(raypaths.iter_mut())) {
            let allowed = profile.others();
            *slot = match allowed.iter().find(|axis| axis.letter() == letter) {
                Some(axis) => *axis,
                None => {
                    return Err(DiffusionError::InvalidRaypath {
                        profile: *profile,
                        found: letter.to_string(),
                        allowed,
                    })
                }
            };
        }
        Ok(Self(raypaths))
    }
}

impl TryFrom<String> for RayPaths {
    type Error = DiffusionError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RayPaths> for String {
    fn from(raypaths: RayPaths) -> String {
        raypaths.to_string()
    }
}

/// Path-averaged profiles with their positions, in a, b, c order.
#[derive(Debug, Clone, PartialEq)]
pub struct WholeBlockProfiles {
    /// `[0, L]` in microns.
    pub positions: [Array1<f64>; 3],
    pub profiles: [Array1<f64>; 3],
}

/// Whole-block profiles for a 3D parameter set.
pub fn evaluate_3d_wb(
    params: &ParameterSet,
    raypaths: &RayPaths,
    options: &ProfileOptions,
) -> Result<WholeBlockProfiles> {
    let block = BlockParams::from_set(params)?;
    let npi = block_field(&block, options)?;
    Ok(path_average(&npi, &block.lengths, raypaths))
}

/// `model - observed` for the three observations, concatenated a, b, c.
///
/// Observed positions are microns from the crystal face. Each is compared
/// with the nearest point of the model grid.
pub fn residuals_3d_wb(
    params: &ParameterSet,
    raypaths: &RayPaths,
    observed: &[Observation],
    options: &ProfileOptions,
) -> Result<Array1<f64>> {
    if observed.len() != 3 {
        return Err(DiffusionError::DimensionMismatch(format!(
            "expected observations along 3 axes, got {}",
            observed.len()
        )));
    }
    for obs in observed {
        check_paired(obs.positions.len(), obs.values.len())?;
    }

    let wb = evaluate_3d_wb(params, raypaths, options)?;
    let total: usize = observed.iter().map(Observation::len).sum();
    let mut residuals = Vec::with_capacity(total);
    for (k, obs) in observed.iter().enumerate() {
        for (&microns, &value) in obs.positions.iter().zip(obs.values.iter()) {
            let idx = nearest_index(&wb.positions[k], microns);
            residuals.push(wb.profiles[k][idx] - value);
        }
    }
    Ok(Array1::from(residuals))
}

pub(crate) fn path_average(npi: &NpiField, lengths: &[f64; 3], raypaths: &RayPaths) -> WholeBlockProfiles {
    let points = npi.field.shape()[0];
    let mid = npi.mid();

    // planes[r] is the field averaged along axis r
    let planes: Vec<Array2<f64>> = (0..3)
        .map(|r| {
            npi.field
                .mean_axis(NdAxis(r))
                .unwrap_or_else(|| Array2::zeros((points, points)))
        })
        .collect();

    let profiles = Axis::ALL.map(|profile| {
        let p = profile.index();
        let r = raypaths.get(profile).index();
        // Remaining plane axes are the two axes other than r, in order
        let along = if p < r { p } else { p - 1 };
        planes[r].index_axis(NdAxis(1 - along), mid).to_owned()
    });
    debug!("whole-block profiles for ray paths {}", raypaths);

    WholeBlockProfiles {
        positions: lengths.map(|length| Array1::linspace(0.0, length, points)),
        profiles,
    }
}

fn nearest_index(grid: &Array1<f64>, position: f64) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (idx, &x) in grid.iter().enumerate() {
        let distance = (x - position).abs();
        if distance < best_distance {
            best = idx;
            best_distance = distance;
        }
    }
    best
}
