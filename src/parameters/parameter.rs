//! Parameter definition and implementation
//!
//! A parameter is a named scalar that is either varied by the optimizer,
//! held fixed, or derived from another parameter through a [`Link`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::parameters::bounds::{Bounds, BoundsError, BoundsTransform};
use crate::parameters::link::Link;

/// Errors that can occur when working with parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Parameter '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Parameter '{name}' not found")]
    ParameterNotFound { name: String },

    #[error("Parameter '{name}' is linked to '{reference}' and cannot be set directly")]
    LinkedParameter { name: String, reference: String },

    #[error("Parameter '{name}' links to '{reference}', which is missing or itself linked")]
    InvalidLinkTarget { name: String, reference: String },

    #[error("Cannot parse link '{text}': {message}")]
    InvalidLink { text: String, message: String },

    #[error("Expected {expected} free values, got {found}")]
    FreeCountMismatch { expected: usize, found: usize },

    #[error("Bounds error: {0}")]
    BoundsError(#[from] BoundsError),
}

/// Role of a parameter during fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Varied by the optimizer.
    Free,
    /// Held at its value.
    Fixed,
    /// Recomputed from another parameter; never optimized.
    Linked(Link),
}

/// A named scalar of a [`ParameterSet`](crate::parameters::ParameterSet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    name: String,
    value: f64,
    kind: ParameterKind,
    bounds: Bounds,
    /// Standard error of the parameter (set after fitting)
    pub stderr: Option<f64>,
}

impl Parameter {
    /// A parameter varied during fitting.
    ///
    /// # Examples
    ///
    /// ```
    /// use hydiff_rs::parameters::Parameter;
    ///
    /// let param = Parameter::free("log10_diffusivity", -13.0);
    /// assert!(param.is_free());
    /// assert_eq!(param.value(), -13.0);
    /// ```
    pub fn free(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            kind: ParameterKind::Free,
            bounds: Bounds::default(),
            stderr: None,
        }
    }

    /// A parameter held at `value`.
    pub fn fixed(name: &str, value: f64) -> Self {
        Self {
            kind: ParameterKind::Fixed,
            ..Self::free(name, value)
        }
    }

    /// Free or fixed depending on `vary`.
    pub fn with_vary(name: &str, value: f64, vary: bool) -> Self {
        if vary {
            Self::free(name, value)
        } else {
            Self::fixed(name, value)
        }
    }

    /// A parameter derived from another one. `initial` is reported until the
    /// owning set resolves the link.
    pub fn linked(name: &str, initial: f64, link: Link) -> Self {
        Self {
            kind: ParameterKind::Linked(link),
            ..Self::free(name, initial)
        }
    }

    /// Attach bounds, clamping the current value into them.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.value = bounds.clamp(self.value);
        self.bounds = bounds;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_free(&self) -> bool {
        matches!(self.kind, ParameterKind::Free)
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.kind, ParameterKind::Linked(_))
    }

    pub fn link(&self) -> Option<&Link> {
        match &self.kind {
            ParameterKind::Linked(link) => Some(link),
            _ => None,
        }
    }

    /// Set the value of a free or fixed parameter.
    pub fn set_value(&mut self, value: f64) -> Result<(), ParameterError> {
        if let ParameterKind::Linked(link) = &self.kind {
            return Err(ParameterError::LinkedParameter {
                name: self.name.clone(),
                reference: link.reference().to_string(),
            });
        }
        if !self.bounds.is_within_bounds(value) {
            return Err(BoundsError::ValueOutsideBounds {
                value,
                min: self.bounds.min,
                max: self.bounds.max,
            }
            .into());
        }
        self.value = value;
        Ok(())
    }

    /// Toggle between free and fixed. Linked parameters ignore the flag.
    pub fn set_vary(&mut self, vary: bool) {
        match self.kind {
            ParameterKind::Linked(_) => {}
            _ if vary => self.kind = ParameterKind::Free,
            _ => self.kind = ParameterKind::Fixed,
        }
    }

    /// Value in the optimizer's unbounded space.
    pub(crate) fn internal_value(&self) -> Result<f64, ParameterError> {
        Ok(BoundsTransform::new(self.bounds).to_internal(self.value)?)
    }

    /// Set from the optimizer's unbounded space.
    pub(crate) fn set_internal_value(&mut self, internal: f64) {
        self.value = BoundsTransform::new(self.bounds).to_external(internal);
    }

    /// Written only by the owning set while resolving links.
    pub(crate) fn set_derived_value(&mut self, value: f64) {
        self.value = value;
    }
}
