//! Expression compiler for channel values: lexer, recursive-descent
//! parser, symbol binding and a pure tree-walk evaluator.

pub(crate) mod ast;
pub(crate) mod bind;
pub(crate) mod builtins;
pub(crate) mod error;
pub(crate) mod eval;
pub(crate) mod lexer;
pub(crate) mod parser;
