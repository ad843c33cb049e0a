use crate::build::BuildData;
use crate::build::BuildStats;
use crate::budget::BudgetState;
use crate::class::CharacterClass;
use crate::config::OptimizationConfiguration;
use crate::convergence::ConvergenceDetector;
use crate::error::OptimizerError;
use crate::error::Result;
use crate::evaluator::BuildEvaluator;
use crate::metric::calculate_metric;
use crate::mutation::TreeMutation;
use crate::neighbor::NeighborGenerator;
use crate::node::NodeId;
use crate::progress::ProgressTracker;
use crate::result::ConvergenceReason;
use crate::result::NodeChanges;
use crate::result::OptimizationResult;
use crate::tree::PassiveTreeGraph;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::iter::IntoParallelRefIterator;
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Scores every candidate mutation against a scratch build derived from
/// `current`, returning `(mutation, score)` pairs in the same order the
/// generator produced them. An evaluator failure on a single candidate is
/// translated to negative infinity rather than aborting the batch, per the
/// per-candidate error-recovery policy in §7.
fn score_candidates(
    current: &BuildData,
    mutations: &[TreeMutation],
    evaluator: &dyn BuildEvaluator,
    metric: crate::metric::Metric,
    baseline_stats: &BuildStats,
) -> Vec<(f64, Option<BuildStats>)> {
    let score_one = |mutation: &TreeMutation| -> (f64, Option<BuildStats>) {
        let trial = mutation.apply(current);
        match evaluator.calculate_build_stats(&trial) {
            Ok(stats) => (calculate_metric(&stats, metric, Some(baseline_stats)), Some(stats)),
            Err(err) => {
                log::debug!("candidate evaluation failed, rejecting: {err}");
                (f64::NEG_INFINITY, None)
            }
        }
    };

    #[cfg(feature = "parallel")]
    {
        mutations.par_iter().map(score_one).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        mutations.iter().map(score_one).collect()
    }
}

/// The orchestrator described in §4.7: evaluates a baseline, then repeatedly
/// generates, scores, and commits to the best strictly-improving neighbor
/// until one of the four termination conditions fires.
///
/// `tree` is expected to be a process-wide, already-loaded
/// [`PassiveTreeGraph`]; nothing about this function mutates it.
pub fn optimize_build(
    config: OptimizationConfiguration,
    tree: &PassiveTreeGraph,
    evaluator: &dyn BuildEvaluator,
) -> Result<OptimizationResult> {
    config.validate()?;

    let OptimizationConfiguration {
        starting_build,
        metric,
        unallocated_budget,
        respec_budget,
        max_iterations,
        max_time,
        patience,
        progress_callback,
    } = config;

    let started_at = Instant::now();
    let baseline_build = starting_build;
    let baseline_stats = evaluator.calculate_build_stats(&baseline_build)?;
    let baseline_score = calculate_metric(&baseline_stats, metric, Some(&baseline_stats));

    let mut current = baseline_build.clone();
    let mut current_stats = baseline_stats;
    let mut current_score = baseline_score;
    let mut best_score = baseline_score;

    let mut budget = BudgetState::new(unallocated_budget, respec_budget);
    let mut convergence = ConvergenceDetector::new(patience);
    let mut progress = ProgressTracker::new(progress_callback, baseline_score);
    let generator = NeighborGenerator::default();

    let mut node_changes = NodeChanges::default();
    let mut iterations_run: u32 = 0;
    let reason: ConvergenceReason;
    let mut detail: Option<String> = None;

    progress.report(0, best_score, budget.progress_snapshot());

    loop {
        if iterations_run >= max_iterations {
            reason = ConvergenceReason::MaxIterations;
            break;
        }
        if started_at.elapsed() >= max_time {
            reason = ConvergenceReason::Timeout;
            break;
        }

        let mutations = generator.generate(&current, tree, &budget)?;
        if mutations.is_empty() {
            reason = ConvergenceReason::NoValidNeighbors;
            break;
        }

        let scored = score_candidates(&current, &mutations, evaluator, metric, &baseline_stats);

        let winner = scored
            .iter()
            .enumerate()
            .max_by(|(_, (a, _)), (_, (b, _))| a.total_cmp(b));

        if let Some((index, &(score, ref stats))) = winner {
            if score > current_score {
                if let Some(stats) = stats.clone() {
                    let mutation = &mutations[index];
                    let trial = mutation.apply(&current);
                    debug_assert!(
                        tree.validate_tree_connectivity(&trial.allocated, trial.class)?,
                        "neighbor generator proposed a disconnected allocation"
                    );
                    budget = budget.apply(mutation);
                    node_changes.added.extend(mutation.nodes_added.iter().copied());
                    node_changes.removed.extend(mutation.nodes_removed.iter().copied());
                    if mutation.is_swap() {
                        node_changes.swaps += 1;
                    }

                    current = trial;
                    current_stats = stats;
                    current_score = score;
                    if current_score > best_score {
                        best_score = current_score;
                    }
                }
            }
        }

        convergence.update(best_score);
        if convergence.has_converged() {
            reason = ConvergenceReason::Converged;
            detail = convergence.reason().map(str::to_string);
            break;
        }

        iterations_run += 1;
        progress.report(iterations_run as u64, best_score, budget.progress_snapshot());
    }

    let elapsed = started_at.elapsed();
    let improvement_pct = if baseline_score != 0.0 {
        100.0 * (best_score - baseline_score) / baseline_score
    } else {
        0.0
    };

    Ok(OptimizationResult {
        baseline_build,
        optimized_build: current,
        baseline_stats,
        optimized_stats: current_stats,
        improvement_pct,
        budget_usage: budget.progress_snapshot(),
        iterations_run,
        convergence_reason: reason,
        convergence_detail: detail,
        elapsed,
        node_changes,
    })
}

/// All ids touched (added or removed) across a run, independent of whether
/// the net effect restored the original allocation. Exposed as a
/// convenience on top of [`OptimizationResult::node_changes`] for callers
/// that don't care about the add/remove split.
pub fn touched_nodes(result: &OptimizationResult) -> Vec<NodeId> {
    result
        .node_changes
        .added
        .iter()
        .chain(result.node_changes.removed.iter())
        .copied()
        .collect()
}
