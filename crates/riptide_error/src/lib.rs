//! Error types shared across the riptide crates.

/// Error for anything that can go wrong during planning or execution.
#[derive(Debug, thiserror::Error)]
pub enum RiptideError {
    /// A relation or column reference failed to resolve, or resolved to more
    /// than one candidate.
    ///
    /// Includes a rendering of the offending plan fragment.
    #[error("resolution error: {msg}\nfragment: {fragment}")]
    Resolution { msg: String, fragment: String },

    /// A fixed point rule batch failed to converge within its iteration cap.
    #[error("batch '{batch}' failed to reach a fixed point after {iterations} iterations")]
    Convergence { batch: String, iterations: usize },

    /// No strategy produced a physical plan for a logical operator.
    ///
    /// Indicates a mismatch between the analyzer/optimizer output and the
    /// configured strategy set. Should not happen for plans produced by this
    /// pipeline.
    #[error("no strategy matched logical operator: {operator}")]
    Planning { operator: String },

    /// Malformed arguments to a command.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RiptideError {
    pub fn resolution(msg: impl Into<String>, fragment: impl Into<String>) -> Self {
        RiptideError::Resolution {
            msg: msg.into(),
            fragment: fragment.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        RiptideError::InvalidArgument(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        RiptideError::Internal(msg.into())
    }
}

pub type Result<T, E = RiptideError> = std::result::Result<T, E>;
