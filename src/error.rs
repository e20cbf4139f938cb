/*!
Error type shared by every evaluation entry point.
*/

use crate::model::DensityKind;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Failures raised while evaluating a model or dispatching to it.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The model was asked for a capability it declares it does not provide.
    #[error("model `{model}` does not provide {capability}")]
    Configuration {
        model: String,
        capability: &'static str,
    },

    /// An operation that needs one density interface was handed a model using the other.
    #[error(
        "{operation} requires a model with a {required} density, but model `{model}` provides a {found} density"
    )]
    CapabilityMismatch {
        model: String,
        operation: &'static str,
        required: DensityKind,
        found: DensityKind,
    },

    /// Domain or runtime error raised by the density itself.
    #[error("{0}")]
    Domain(String),

    /// A discrete-parameter index outside of `0..len`.
    #[error("index {index} is out of range for a model with {len} discrete parameters")]
    OutOfRange { index: usize, len: usize },

    /// A variable context did not contain a requested variable.
    #[error("variable `{0}` not found in context")]
    MissingVariable(String),

    /// A variable context held the wrong number of values for a variable.
    #[error("variable `{name}` has {found} values, expected {expected}")]
    SizeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    /// An interrupt callback asked the running computation to stop.
    #[error("computation interrupted")]
    Interrupted,

    #[cfg(feature = "json")]
    #[error("could not parse variable context: {0}")]
    Json(#[from] serde_json::Error),
}

impl EvalError {
    /// Convenience constructor for density-level domain errors.
    pub fn domain(msg: impl Into<String>) -> Self {
        EvalError::Domain(msg.into())
    }
}
