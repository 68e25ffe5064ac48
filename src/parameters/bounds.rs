//! Bounds on free parameters.
//!
//! A fitted initial concentration can be kept non-negative, or a log10
//! diffusivity kept inside a physically sensible window, by giving the
//! parameter [`Bounds`]. The optimizer never sees the bounds: it works on an
//! unbounded internal coordinate that [`BoundsTransform`] maps onto the
//! bounded interval (the sine / square-root mapping used by Minuit).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Parameter value {value} is outside bounds: [{min}, {max}]")]
    ValueOutsideBounds { value: f64, min: f64, max: f64 },

    #[error("Infinite parameter value is not allowed")]
    InfiniteValue,
}

/// Closed interval `[min, max]`; an infinite side is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "BoundsRepr", into = "BoundsRepr")]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// JSON form: an open side is `null` since JSON has no infinity.
#[derive(Serialize, Deserialize)]
struct BoundsRepr {
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

impl From<Bounds> for BoundsRepr {
    fn from(bounds: Bounds) -> Self {
        Self {
            min: bounds.has_lower_bound().then_some(bounds.min),
            max: bounds.has_upper_bound().then_some(bounds.max),
        }
    }
}

impl From<BoundsRepr> for Bounds {
    fn from(repr: BoundsRepr) -> Self {
        Self {
            min: repr.min.unwrap_or(f64::NEG_INFINITY),
            max: repr.max.unwrap_or(f64::INFINITY),
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl Bounds {
    /// Bounds on both sides, failing if `min > max`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hydiff_rs::parameters::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 1.5).unwrap();
    /// assert_eq!(bounds.max, 1.5);
    /// assert!(Bounds::new(2.0, 1.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::InvalidBounds { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn unbounded() -> Self {
        Self {
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn min_only(min: f64) -> Self {
        Self { min, ..Self::unbounded() }
    }

    pub fn max_only(max: f64) -> Self {
        Self { max, ..Self::unbounded() }
    }

    pub fn is_within_bounds(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min.is_finite()
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max.is_finite()
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn sides(&self) -> Sides {
        match (self.has_lower_bound(), self.has_upper_bound()) {
            (false, false) => Sides::Open,
            (true, false) => Sides::Lower(self.min),
            (false, true) => Sides::Upper(self.max),
            (true, true) => Sides::Both {
                min: self.min,
                half_width: (self.max - self.min) / 2.0,
            },
        }
    }
}

/// Which sides of an interval are closed.
enum Sides {
    Open,
    Lower(f64),
    Upper(f64),
    Both { min: f64, half_width: f64 },
}

/// Maps the optimizer's unbounded coordinate onto a bounded parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsTransform {
    bounds: Bounds,
}

impl BoundsTransform {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }

    /// Parameter value for an internal coordinate. Always inside the bounds.
    pub fn to_external(&self, internal: f64) -> f64 {
        let hyp = (internal * internal + 1.0).sqrt();
        match self.bounds.sides() {
            Sides::Open => internal,
            Sides::Lower(min) => min - 1.0 + hyp,
            Sides::Upper(max) => max + 1.0 - hyp,
            Sides::Both { min, half_width } => min + (internal.sin() + 1.0) * half_width,
        }
    }

    /// Internal coordinate of a parameter value inside the bounds.
    pub fn to_internal(&self, external: f64) -> Result<f64, BoundsError> {
        if !external.is_finite() {
            return Err(BoundsError::InfiniteValue);
        }
        if !self.bounds.is_within_bounds(external) {
            return Err(BoundsError::ValueOutsideBounds {
                value: external,
                min: self.bounds.min,
                max: self.bounds.max,
            });
        }

        Ok(match self.bounds.sides() {
            Sides::Open => external,
            Sides::Lower(min) => ((external - min + 1.0).powi(2) - 1.0).sqrt(),
            Sides::Upper(max) => ((max - external + 1.0).powi(2) - 1.0).sqrt(),
            // clamp guards asin against rounding at the edges
            Sides::Both { min, half_width } => ((external - min) / half_width - 1.0).clamp(-1.0, 1.0).asin(),
        })
    }

    /// d(external)/d(internal), used to carry standard errors from the
    /// optimizer's space back to parameter units.
    pub fn derivative(&self, internal: f64) -> f64 {
        let hyp = (internal * internal + 1.0).sqrt();
        match self.bounds.sides() {
            Sides::Open => 1.0,
            Sides::Lower(_) => internal / hyp,
            Sides::Upper(_) => -internal / hyp,
            Sides::Both { half_width, .. } => internal.cos() * half_width,
        }
    }
}
