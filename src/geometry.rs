//! Crystal directions.
//!
//! Profiles are measured parallel to one of three orthogonal crystal axes,
//! labelled `a`, `b` and `c`. Diffusivities compiled for Arrhenius diagrams
//! additionally carry an "unoriented" slot for isotropic or unoriented data.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DiffusionError, Result};

/// One of the three orthogonal directions of a rectangular crystal block.
///
/// Index 0, 1 and 2 correspond to the x, y and z model directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    A,
    B,
    C,
}

impl Axis {
    /// All axes in profile order (a, b, c).
    pub const ALL: [Axis; 3] = [Axis::A, Axis::B, Axis::C];

    /// Position of this axis in the 3D field (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Axis::A => 0,
            Axis::B => 1,
            Axis::C => 2,
        }
    }

    /// Axis for a field index.
    pub fn from_index(index: usize) -> Result<Self> {
        match index {
            0 => Ok(Axis::A),
            1 => Ok(Axis::B),
            2 => Ok(Axis::C),
            _ => Err(DiffusionError::InvalidInput(format!(
                "axis index must be 0, 1 or 2, got {}",
                index
            ))),
        }
    }

    /// The two axes orthogonal to this one, in ascending order.
    pub fn others(self) -> [Axis; 2] {
        match self {
            Axis::A => [Axis::B, Axis::C],
            Axis::B => [Axis::A, Axis::C],
            Axis::C => [Axis::A, Axis::B],
        }
    }

    /// Lower-case letter used in notation such as ray-path triples.
    pub fn letter(self) -> char {
        match self {
            Axis::A => 'a',
            Axis::B => 'b',
            Axis::C => 'c',
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl TryFrom<char> for Axis {
    type Error = DiffusionError;

    fn try_from(c: char) -> Result<Self> {
        match c.to_ascii_lowercase() {
            'a' | 'x' => Ok(Axis::A),
            'b' | 'y' => Ok(Axis::B),
            'c' | 'z' => Ok(Axis::C),
            other => Err(DiffusionError::InvalidInput(format!(
                "axis must be one of 'a', 'b', 'c', got '{}'",
                other
            ))),
        }
    }
}

impl FromStr for Axis {
    type Err = DiffusionError;

    fn from_str(s: &str) -> Result<Self> {
        let mut chars = s.trim().chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Axis::try_from(c),
            _ => Err(DiffusionError::InvalidInput(format!(
                "axis must be a single letter, got '{}'",
                s
            ))),
        }
    }
}

/// Orientation slot of a diffusivity measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    X,
    Y,
    Z,
    Unoriented,
}

impl Orientation {
    /// All slots in storage order.
    pub const ALL: [Orientation; 4] = [
        Orientation::X,
        Orientation::Y,
        Orientation::Z,
        Orientation::Unoriented,
    ];

    pub fn index(self) -> usize {
        match self {
            Orientation::X => 0,
            Orientation::Y => 1,
            Orientation::Z => 2,
            Orientation::Unoriented => 3,
        }
    }

    /// Label used for legends: the Miller index of the direction.
    pub fn label(self) -> &'static str {
        match self {
            Orientation::X => "|| [100]",
            Orientation::Y => "|| [010]",
            Orientation::Z => "|| [001]",
            Orientation::Unoriented => "not oriented",
        }
    }
}

impl From<Axis> for Orientation {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::A => Orientation::X,
            Axis::B => Orientation::Y,
            Axis::C => Orientation::Z,
        }
    }
}

impl TryFrom<usize> for Orientation {
    type Error = DiffusionError;

    fn try_from(index: usize) -> Result<Self> {
        Orientation::ALL.get(index).copied().ok_or_else(|| {
            DiffusionError::InvalidInput(format!(
                "orientation index must be 0-3, got {}",
                index
            ))
        })
    }
}

impl FromStr for Orientation {
    type Err = DiffusionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" | "0" => Ok(Orientation::X),
            "y" | "1" => Ok(Orientation::Y),
            "z" | "2" => Ok(Orientation::Z),
            "u" | "3" | "unoriented" => Ok(Orientation::Unoriented),
            _ => Err(DiffusionError::InvalidInput(format!(
                "orientation must be 'x' (=0), 'y' (=1), 'z' (=2), or 'u' (=3) for unoriented, got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Orientation::X => "x",
            Orientation::Y => "y",
            Orientation::Z => "z",
            Orientation::Unoriented => "u",
        };
        write!(f, "{}", letter)
    }
}
