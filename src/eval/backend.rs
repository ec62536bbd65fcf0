//! Bulk sampling backends: the strategy seam for evaluating one channel
//! across many positions.

use rayon::prelude::*;

use crate::compile::compiler::CompiledScene;
use crate::eval::context::Overrides;
use crate::foundation::error::KeysplineResult;

/// Strategy for sampling one channel at many positions.
///
/// The contract is identical to repeated [`CompiledScene::query`] calls
/// with no overrides; each position owns an independent query context,
/// so implementations may order or spread the work however they like.
pub trait SampleBackend: Send + Sync {
    /// Samples `channel` at every position, preserving input order.
    fn sample_channel(
        &self,
        scene: &CompiledScene,
        channel: &str,
        positions: &[f64],
    ) -> KeysplineResult<Vec<f64>>;
}

/// Which sampling backend to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Reference implementation: one scalar query per position.
    #[default]
    Scalar,
    /// Rayon-parallel across positions.
    Parallel,
}

/// Creates a sampling backend of the given kind.
pub fn create_backend(kind: BackendKind) -> KeysplineResult<Box<dyn SampleBackend>> {
    Ok(match kind {
        BackendKind::Scalar => Box::new(ScalarBackend),
        BackendKind::Parallel => Box::new(ParallelBackend),
    })
}

/// Plain per-position loop.
#[derive(Debug, Default)]
pub struct ScalarBackend;

impl SampleBackend for ScalarBackend {
    fn sample_channel(
        &self,
        scene: &CompiledScene,
        channel: &str,
        positions: &[f64],
    ) -> KeysplineResult<Vec<f64>> {
        let overrides = Overrides::new();
        positions
            .iter()
            .map(|&p| scene.query(channel, p, &overrides))
            .collect()
    }
}

/// Splits positions across the rayon pool. Valid because queries only
/// read the compiled scene and every node draws from a position-keyed
/// random stream.
#[derive(Debug, Default)]
pub struct ParallelBackend;

impl SampleBackend for ParallelBackend {
    fn sample_channel(
        &self,
        scene: &CompiledScene,
        channel: &str,
        positions: &[f64],
    ) -> KeysplineResult<Vec<f64>> {
        let overrides = Overrides::new();
        positions
            .par_iter()
            .map(|&p| scene.query(channel, p, &overrides))
            .collect()
    }
}

impl CompiledScene {
    /// Samples one channel at many positions through the backend the
    /// scene was compiled with.
    #[tracing::instrument(skip(self, positions), fields(positions = positions.len()))]
    pub fn sample_bulk(&self, channel: &str, positions: &[f64]) -> KeysplineResult<Vec<f64>> {
        create_backend(self.options.backend)?.sample_channel(self, channel, positions)
    }
}
