/// Convenience result type used across keyspline.
pub type KeysplineResult<T> = Result<T, KeysplineError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Every load-side error is fatal to loading that document; there is no
/// partial-load mode. Query-side failures are limited to [`KeysplineError::Evaluation`].
#[derive(thiserror::Error, Debug)]
pub enum KeysplineError {
    /// Malformed expression syntax, unknown function, or wrong call arity.
    #[error("parse error: {0}")]
    Parse(String),

    /// An expression references an identifier that is not in scope.
    #[error("undefined symbol: {0}")]
    UndefinedSymbol(String),

    /// The dependency graph has a cycle; `cycle` holds the full path by node name.
    #[error("cyclic dependency: {}", cycle.join(" -> "))]
    CyclicDependency {
        /// Node names along the cycle, first node repeated at the end.
        cycle: Vec<String>,
    },

    /// Two keyframes within one channel share a position.
    #[error("duplicate keyframe at position {position} in channel '{channel}'")]
    DuplicateKeyframe {
        /// Qualified channel name.
        channel: String,
        /// The repeated keyframe position.
        position: f64,
    },

    /// An interpolation algorithm tag is not registered.
    #[error("unsupported interpolation '{0}'")]
    UnsupportedInterpolation(String),

    /// Invalid user-provided document data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while evaluating a query.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),
}

impl KeysplineError {
    /// Build a [`KeysplineError::Parse`] value.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Build a [`KeysplineError::UndefinedSymbol`] value.
    pub fn undefined_symbol(msg: impl Into<String>) -> Self {
        Self::UndefinedSymbol(msg.into())
    }

    /// Build a [`KeysplineError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KeysplineError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`KeysplineError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
