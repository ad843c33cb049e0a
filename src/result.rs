use crate::build::BuildData;
use crate::build::BuildStats;
use crate::budget::BudgetUsage;
use crate::node::NodeId;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

/// Closed set of reasons an `optimize_build` run can end, per the
/// termination property in §8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvergenceReason {
    /// The [`crate::convergence::ConvergenceDetector`] patience window
    /// elapsed without a meaningful improvement.
    Converged,
    /// `max_iterations` was reached before convergence.
    MaxIterations,
    /// `max_time` elapsed before convergence.
    Timeout,
    /// The neighbor generator produced no legal mutation.
    NoValidNeighbors,
}

impl ConvergenceReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::MaxIterations => "max_iterations",
            Self::Timeout => "timeout",
            Self::NoValidNeighbors => "no_valid_neighbors",
        }
    }
}

/// Aggregate node churn across an entire run, surfaced so a caller can
/// explain *what* the optimizer changed without replaying every iteration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeChanges {
    pub added: BTreeSet<NodeId>,
    pub removed: BTreeSet<NodeId>,
    pub swaps: u32,
}

/// The output contract of a single `optimize_build` call.
///
/// `optimized_stats`'s score under the configured metric is always
/// `>= baseline_stats`'s (the monotonic-improvement property in §8):
/// the hill climber only ever commits to a strictly better neighbor, so
/// the worst case is a run that never moves.
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub baseline_build: BuildData,
    pub optimized_build: BuildData,
    pub baseline_stats: BuildStats,
    pub optimized_stats: BuildStats,
    pub improvement_pct: f64,
    pub budget_usage: BudgetUsage,
    pub iterations_run: u32,
    pub convergence_reason: ConvergenceReason,
    /// The [`crate::convergence::ConvergenceDetector`]'s fine-grained reason
    /// string (e.g. `"diminishing returns (<0.1% improvement)"` vs.
    /// `"no improvement for N iterations"`), set only when
    /// `convergence_reason` is [`ConvergenceReason::Converged`]. `None` for
    /// the other three termination reasons, which carry no such detail.
    pub convergence_detail: Option<String>,
    pub elapsed: Duration,
    pub node_changes: NodeChanges,
}

impl OptimizationResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// A caller-facing view that regroups the flat result fields under the
    /// headings a UI or report naturally wants: a top-level improvement
    /// number, the two stat snapshots it was computed from, and nested
    /// objects for budget/convergence/node-churn detail. `OptimizationResult`
    /// itself stays flat because the optimizer's internals build it field by
    /// field; this exists purely for serialization ergonomics at the edge.
    pub fn to_projection(&self) -> ResultProjection {
        ResultProjection {
            improvement_pct: self.improvement_pct,
            baseline_stats: self.baseline_stats,
            optimized_stats: self.optimized_stats,
            budget_usage: self.budget_usage,
            convergence: ConvergenceSummary {
                reason: self.convergence_reason,
                detail: self.convergence_detail.clone(),
                iterations_run: self.iterations_run,
                elapsed_seconds: self.elapsed_seconds(),
            },
            node_changes: self.node_changes.clone(),
        }
    }
}

/// Convergence detail nested under `to_projection()`'s `convergence` key.
#[derive(Debug, Clone, Serialize)]
pub struct ConvergenceSummary {
    pub reason: ConvergenceReason,
    pub detail: Option<String>,
    pub iterations_run: u32,
    pub elapsed_seconds: f64,
}

/// The regrouped, caller-facing shape of an [`OptimizationResult`].
#[derive(Debug, Clone, Serialize)]
pub struct ResultProjection {
    pub improvement_pct: f64,
    pub baseline_stats: BuildStats,
    pub optimized_stats: BuildStats,
    pub budget_usage: BudgetUsage,
    pub convergence: ConvergenceSummary,
    pub node_changes: NodeChanges,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::CharacterClass;

    #[test]
    fn projection_regroups_fields_without_losing_data() {
        let build = BuildData::new(CharacterClass::Witch, 50, [0]);
        let stats = BuildStats::new(100.0, 1000.0, 0.0, 0.0, 1000.0, 0.0, 0.0, 0.0, 0.0, 0.0, Default::default()).unwrap();
        let result = OptimizationResult {
            baseline_build: build.clone(),
            optimized_build: build,
            baseline_stats: stats,
            optimized_stats: stats,
            improvement_pct: 0.0,
            budget_usage: BudgetUsage {
                unallocated_available: 5,
                unallocated_used: 0,
                respec_available: Some(5),
                respec_used: 0,
            },
            iterations_run: 0,
            convergence_reason: ConvergenceReason::NoValidNeighbors,
            convergence_detail: None,
            elapsed: Duration::from_secs(0),
            node_changes: NodeChanges::default(),
        };
        let projection = result.to_projection();
        assert_eq!(projection.improvement_pct, result.improvement_pct);
        assert_eq!(projection.convergence.reason, ConvergenceReason::NoValidNeighbors);
        assert_eq!(projection.convergence.iterations_run, 0);
    }
}
