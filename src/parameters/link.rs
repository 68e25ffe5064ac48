//! Links between parameters.
//!
//! A linked parameter is never optimized; its value is derived from another
//! parameter every time the set changes. Only the two transforms the
//! diffusion models need are representable: equality (isotropic
//! diffusivities) and a constant offset (e.g. one axis an order of magnitude
//! slower in log10 units).
//!
//! Links can also be written in a compact text notation:
//!
//! ```
//! use hydiff_rs::parameters::{Link, LinkTransform};
//!
//! let link: Link = "log10_dx - 1".parse().unwrap();
//! assert_eq!(link.reference(), "log10_dx");
//! assert_eq!(link.transform(), LinkTransform::Offset(-1.0));
//! assert_eq!(link.apply(-12.0), -13.0);
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{all_consuming, opt, recognize},
    multi::many0_count,
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::parameter::ParameterError;

/// How a linked parameter is derived from its reference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LinkTransform {
    /// Same value as the reference.
    Identity,
    /// Reference value plus a constant.
    Offset(f64),
}

/// A parameter's dependency on another parameter of the same set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    reference: String,
    transform: LinkTransform,
}

impl Link {
    /// Link that copies `reference`.
    pub fn identity(reference: &str) -> Self {
        Self {
            reference: reference.to_string(),
            transform: LinkTransform::Identity,
        }
    }

    /// Link that adds `delta` to `reference`.
    pub fn offset(reference: &str, delta: f64) -> Self {
        Self {
            reference: reference.to_string(),
            transform: LinkTransform::Offset(delta),
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn transform(&self) -> LinkTransform {
        self.transform
    }

    /// Value of the linked parameter given its reference value.
    pub fn apply(&self, reference_value: f64) -> f64 {
        match self.transform {
            LinkTransform::Identity => reference_value,
            LinkTransform::Offset(delta) => reference_value + delta,
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.transform {
            LinkTransform::Identity => write!(f, "{}", self.reference),
            LinkTransform::Offset(delta) if delta < 0.0 => {
                write!(f, "{} - {}", self.reference, -delta)
            }
            LinkTransform::Offset(delta) => write!(f, "{} + {}", self.reference, delta),
        }
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0_count(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn signed_offset(input: &str) -> IResult<&str, f64> {
    let (input, sign) = preceded(multispace0, alt((char('+'), char('-')))).parse(input)?;
    let (input, magnitude) = preceded(multispace0, double).parse(input)?;
    Ok((input, if sign == '-' { -magnitude } else { magnitude }))
}

fn link_notation(input: &str) -> IResult<&str, (&str, Option<f64>)> {
    all_consuming(delimited(
        multispace0,
        pair(identifier, opt(signed_offset)),
        multispace0,
    ))
    .parse(input)
}

impl FromStr for Link {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (reference, delta)) =
            link_notation(s).map_err(|e| ParameterError::InvalidLink {
                text: s.to_string(),
                message: e.to_string(),
            })?;

        Ok(match delta {
            None => Link::identity(reference),
            Some(delta) => Link::offset(reference, delta),
        })
    }
}
