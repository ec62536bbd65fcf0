//! Keyspline evaluates declarative scenes of keyframed curves.
//!
//! A scene document declares named splines of channels; each channel
//! carries keyframes whose values are literal numbers or expressions
//! over variables, other channels, and the query position. A closed
//! expression grammar keeps documents free of host side effects. The
//! public API is query-oriented:
//!
//! - Parse a [`Scene`] from JSON
//! - Compile it into an immutable, thread-safe [`CompiledScene`]
//! - Query one channel, every channel, the published view, or many
//!   positions at once through a [`SampleBackend`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod compile;
mod curve;
mod eval;
mod expression;
mod foundation;
mod publish;
mod scene;

pub use crate::compile::compiler::{ChannelInfo, CompileOptions, CompiledScene};
pub use crate::eval::backend::{
    BackendKind, ParallelBackend, SampleBackend, ScalarBackend, create_backend,
};
pub use crate::eval::context::{Overrides, RangePolicy};
pub use crate::foundation::error::{KeysplineError, KeysplineResult};
pub use crate::publish::PublishPolicy;
pub use crate::scene::document::Scene;
