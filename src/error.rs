use thiserror::Error;

use crate::geometry::Axis;

/// Error types for the hydiff-rs library.
#[derive(Error, Debug)]
pub enum DiffusionError {
    /// Error indicating a mismatch in array or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid input data (wrong shape, unsupported option, ...).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Evaluation method keyword that is neither erf nor series.
    #[error("Unknown method '{0}': expected \"erf\" or \"series\"")]
    UnknownMethod(String),

    /// Ray path chosen parallel to the profile it should cross, or not an axis at all.
    #[error("Ray path for profile || {profile} must be '{}' or '{}', got '{found}'", .allowed[0], .allowed[1])]
    InvalidRaypath {
        profile: Axis,
        found: String,
        allowed: [Axis; 2],
    },

    /// Physical input that would turn the model into NaN or infinity.
    #[error("Numerical degeneracy: {0}")]
    NumericalDegeneracy(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered: {0}")]
    SingularMatrix(String),

    /// Error indicating the optimizer failed to converge.
    #[error("Fit failed to converge after {iterations} iterations: {message}")]
    ConvergenceFailure { message: String, iterations: usize },

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Error for parameter-related problems.
    #[error("Parameter error: {0}")]
    Parameter(#[from] crate::parameters::ParameterError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiffusionError {
    /// True for the conditions under which a fit did not produce a result.
    pub fn is_fit_failure(&self) -> bool {
        matches!(
            self,
            DiffusionError::ConvergenceFailure { .. } | DiffusionError::SingularMatrix(_)
        )
    }
}

/// Result type alias for hydiff-rs operations.
pub type Result<T> = std::result::Result<T, DiffusionError>;
