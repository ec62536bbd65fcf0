use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExprErrorKind {
    /// Malformed syntax, unknown function, or wrong arity.
    Syntax,
    /// A name that is not a variable, channel, or the time parameter.
    UndefinedSymbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExprError {
    pub(crate) kind: ExprErrorKind,
    pub(crate) offset: usize,
    pub(crate) message: String,
}

impl ExprError {
    pub(crate) fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ExprErrorKind::Syntax,
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn undefined(offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind: ExprErrorKind::UndefinedSymbol,
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at byte {}: {}", self.offset, self.message)
    }
}

impl std::error::Error for ExprError {}
