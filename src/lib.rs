//! # hydiff-rs
//!
//! `hydiff-rs` models the diffusion of hydrogen into and out of mineral
//! crystals and fits diffusivities to measured concentration profiles.
//!
//! The library provides:
//! - Parameter sets with fixed, free and linked parameters ([`parameters`], [`setup`])
//! - 1D slab profiles, thin-slab uptake curves, 3D block fields and
//!   whole-block (path-averaged) profiles ([`diffusion`])
//! - A Levenberg-Marquardt minimizer with standard errors from the
//!   covariance of the fit ([`lm`], [`uncertainty`], [`fit`])
//! - Arrhenius fits of diffusivity against temperature ([`arrhenius`])
//!
//! ## Basic Usage
//!
//! ```
//! use hydiff_rs::diffusion::{evaluate_1d, ProfileOptions};
//! use hydiff_rs::fit::{fit_profile_1d, Profile1dData};
//! use hydiff_rs::lm::LmConfig;
//! use hydiff_rs::setup::{setup_1d, Profile1dSetup};
//!
//! // A 200 micron slab after one hour at log10 D = -13
//! let truth = setup_1d(200.0, -13.0, 3600.0).unwrap();
//! let profile = evaluate_1d(&truth, &ProfileOptions::default()).unwrap();
//!
//! let data = Profile1dData::new(profile.positions.to_vec(), profile.values.to_vec())
//!     .unwrap()
//!     .with_options(ProfileOptions::default().with_center_positions(false));
//! let guess = Profile1dSetup::new(200.0, -14.0, 3600.0);
//! let result = fit_profile_1d(&data, &guess, &LmConfig::default()).unwrap();
//!
//! assert!((result.log10_diffusivity + 13.0).abs() < 0.01);
//! ```

pub mod arrhenius;
pub mod diffusion;
pub mod error;
pub mod fit;
pub mod geometry;
pub mod lm;
pub mod parameters;
pub mod problem;
pub mod record;
pub mod setup;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use error::{DiffusionError, Result};
pub use fit::{fit, FitReport, ResidualModel};
pub use geometry::{Axis, Orientation};
pub use lm::{LevenbergMarquardt, LmConfig};
pub use parameters::ParameterSet;
pub use problem::Problem;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
