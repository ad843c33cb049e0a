use crate::build::BuildData;
use crate::build::BuildStats;
use crate::error::OptimizerError;

/// The injected dependency that turns a build into numeric stats.
///
/// This is the trait boundary through which the core consumes the external
/// simulator described in §1: the core never interprets stat text, items,
/// or skills itself. Implementors may be internally slow (the spec allows
/// tens to hundreds of milliseconds per call); the core treats every call
/// as synchronous and, when `parallel` is enabled, fans calls for
/// independent candidates out across a `rayon` pool, so implementations
/// that hold interior state must be safe to call from multiple threads
/// (`Sync`) or must be wrapped one-per-thread by the caller.
///
/// Errors returned here never abort a run: a failure on any single
/// candidate is translated to a `-inf` score and the candidate is dropped
/// from contention. Only a failure evaluating the *baseline* build is
/// fatal (propagated out of [`crate::optimizer::optimize_build`]).
pub trait BuildEvaluator: Sync {
    /// Computes stats for `build`. Returns
    /// [`OptimizerError::Evaluator`] for an invalid build or internal
    /// evaluator failure, and [`OptimizerError::EvaluatorTimeout`] if the
    /// evaluator's own internal deadline was exceeded.
    fn calculate_build_stats(&self, build: &BuildData) -> Result<BuildStats, OptimizerError>;
}

impl<F> BuildEvaluator for F
where
    F: Fn(&BuildData) -> Result<BuildStats, OptimizerError> + Sync,
{
    fn calculate_build_stats(&self, build: &BuildData) -> Result<BuildStats, OptimizerError> {
        self(build)
    }
}
