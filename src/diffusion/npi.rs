//! Non-path-integrated diffusion in a rectangular block.
//!
//! The block field is the outer product of three slab profiles, one per
//! axis, sharing time and concentration levels. Uptake is handled by
//! computing the loss field of the swapped levels and inverting the product
//! once, after it is formed: inverting each axis first gives a different
//! field.

use log::{debug, warn};
use ndarray::{s, Array1, Array3};

use crate::diffusion::one_d::slab_profile;
use crate::diffusion::{check_paired, Direction, Observation, ProfileOptions};
use crate::error::{DiffusionError, Result};
use crate::parameters::ParameterSet;
use crate::setup::BlockParams;

/// A block concentration field with its centerline slices.
#[derive(Debug, Clone, PartialEq)]
pub struct NpiField {
    /// `sample_points³` concentrations indexed `[x, y, z]`.
    pub field: Array3<f64>,
    /// Profiles through the center of the block along x, y and z.
    pub slices: [Array1<f64>; 3],
    /// Slice positions in microns.
    pub positions: [Array1<f64>; 3],
}

impl NpiField {
    /// Index of the central grid point on each side.
    pub fn mid(&self) -> usize {
        self.field.shape()[0] / 2
    }
}

/// Evaluate the block field for a 3D parameter set.
///
/// Slice positions span `[-L/2, L/2]` when `options.center_positions` is
/// set and `[0, L]` otherwise.
pub fn evaluate_3d_npi(params: &ParameterSet, options: &ProfileOptions) -> Result<NpiField> {
    let block = BlockParams::from_set(params)?;
    block_field(&block, options)
}

/// Residual form of [`evaluate_3d_npi`].
///
/// Only the calling convention is in place: the three observations are
/// shape-checked and a zero vector of matching length is returned. Fitting
/// a centerline model to data is not implemented.
pub fn residuals_3d_npi(
    params: &ParameterSet,
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
    options.validate()?;
    BlockParams::from_set(params)?;

    warn!("npi residuals are not implemented; returning zeros");
    let total: usize = observed.iter().map(Observation::len).sum();
    Ok(Array1::zeros(total))
}

pub(crate) fn block_field(block: &BlockParams, options: &ProfileOptions) -> Result<NpiField> {
    options.validate()?;
    let points = options.sample_points;

    let scale = if block.initial_value > 1.0 {
        block.initial_value
    } else {
        1.0
    };
    let initial = block.initial_value / scale;
    let fin = block.final_value / scale;
    let direction = Direction::new(initial, fin);
    debug!(
        "npi field: {} points, lengths {:?}, log10 D {:?}, scale {}, going out {}",
        points, block.lengths, block.log10_diffusivities, scale, direction.going_out
    );

    let field = if initial == fin {
        Array3::from_elem((points, points, points), block.initial_value)
    } else {
        let (first, second) = if direction.going_out {
            (initial, fin)
        } else {
            (fin, initial)
        };

        let mut profiles = Vec::with_capacity(3);
        for k in 0..3 {
            profiles.push(slab_profile(&block.slab(k, first, second), options)?.values);
        }
        let (px, py, pz) = (&profiles[0], &profiles[1], &profiles[2]);

        let field = Array3::from_shape_fn((points, points, points), |(i, j, k)| px[i] * py[j] * pz[k]) * scale;
        if direction.going_out {
            field
        } else {
            field.mapv(|v| 1.0 - v + direction.floor)
        }
    };

    let mid = points / 2;
    let slices = [
        field.slice(s![.., mid, mid]).to_owned(),
        field.slice(s![mid, .., mid]).to_owned(),
        field.slice(s![mid, mid, ..]).to_owned(),
    ];

    let positions = block.lengths.map(|length| {
        if options.center_positions {
            Array1::linspace(-length / 2.0, length / 2.0, points)
        } else {
            Array1::linspace(0.0, length, points)
        }
    });

    Ok(NpiField {
        field,
        slices,
        positions,
    })
}
