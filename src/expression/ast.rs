use crate::expression::builtins::Builtin;
use crate::foundation::ids::{ChannelId, VarId};

/// Closed expression tree. `Path` and `Call` exist only between parsing and
/// binding; a bound tree contains `Var`/`Channel`/`Time`/`Func` instead.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Num(f64),
    Unary {
        op: UnaryOp,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unresolved call target, e.g. `sin(x)`.
    Call {
        func: String,
        args: Vec<Expr>,
    },
    /// Unresolved dotted identifier path: `amp`, `pos.x`.
    Path(Vec<String>),
    /// Resolved builtin call with checked arity.
    Func {
        func: Builtin,
        args: Vec<Expr>,
    },
    /// Resolved variable reference.
    Var(VarId),
    /// Resolved channel reference.
    Channel(ChannelId),
    /// The query position in the channel-local domain (`@` or bare `t`).
    Time,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}
