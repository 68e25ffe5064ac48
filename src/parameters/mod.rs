//! # Parameter System
//!
//! Named physical quantities (slab lengths, log10 diffusivities, time,
//! initial and final concentrations) shared between the diffusion models
//! and the optimizer.
//!
//! ## Key Features
//!
//! - **Named Parameters**: models read `"log10_diffusivity"`, not `params[1]`
//! - **Free / Fixed / Linked**: each parameter has exactly one role during a fit
//! - **Links**: a parameter can equal another one, or another one plus an offset
//! - **Bounds**: free parameters can be kept inside `[min, max]` while fitting
//! - **Serialization Support**: snapshot a set as JSON with serde
//!
//! ## Example Usage
//!
//! ```rust
//! use hydiff_rs::parameters::{Bounds, Link, ParameterSet};
//!
//! let mut params = ParameterSet::new();
//! params.add_fixed("time", 3600.0).unwrap();
//! params.add_free("log10_dx", -12.5).unwrap();
//! params.add_linked("log10_dz", Link::identity("log10_dx")).unwrap();
//! params.add_free("initial_value", 1.0).unwrap();
//! params.set_bounds("initial_value", Bounds::min_only(0.0)).unwrap();
//!
//! // Optimizer view: only the free parameters
//! let internal = params.free_internal_values().unwrap();
//! assert_eq!(internal.len(), 2);
//! ```

pub mod bounds;
pub mod link;
pub mod parameter;
pub mod parameters;

// Re-export key types
pub use bounds::{Bounds, BoundsError, BoundsTransform};
pub use link::{Link, LinkTransform};
pub use parameter::{Parameter, ParameterError, ParameterKind};
pub use parameters::ParameterSet;
