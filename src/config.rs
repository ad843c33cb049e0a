use crate::build::BuildData;
use crate::budget::RespecBudget;
use crate::error::OptimizerError;
use crate::error::Result;
use crate::metric::Metric;
use crate::progress::ProgressReport;
use std::time::Duration;

/// Iterations run before the optimizer gives up and reports
/// [`crate::result::ConvergenceReason::MaxIterations`].
const DEFAULT_MAX_ITERATIONS: u32 = 600;
/// Wall-clock budget for a single `optimize_build` call.
const DEFAULT_MAX_TIME: Duration = Duration::from_secs(300);
/// Consecutive non-improving iterations tolerated before declaring
/// convergence.
const DEFAULT_PATIENCE: u32 = 3;

type ProgressCallback = dyn Fn(ProgressReport) + Send + Sync;

/// The input contract for a single optimization run.
///
/// Constructed with [`OptimizationConfiguration::new`] and refined with the
/// `with_*` builders; [`OptimizationConfiguration::validate`] enforces the
/// invariants in the data model (§3) before [`crate::optimizer::optimize_build`]
/// commits to a run.
pub struct OptimizationConfiguration {
    pub starting_build: BuildData,
    pub metric: Metric,
    pub unallocated_budget: u32,
    pub respec_budget: RespecBudget,
    pub max_iterations: u32,
    pub max_time: Duration,
    pub patience: u32,
    pub progress_callback: Option<Box<ProgressCallback>>,
}

impl OptimizationConfiguration {
    pub fn new(starting_build: BuildData, metric: Metric, unallocated_budget: u32) -> Self {
        Self {
            starting_build,
            metric,
            unallocated_budget,
            respec_budget: RespecBudget::Unlimited,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_time: DEFAULT_MAX_TIME,
            patience: DEFAULT_PATIENCE,
            progress_callback: None,
        }
    }

    pub fn with_respec_budget(mut self, respec: u32) -> Self {
        self.respec_budget = RespecBudget::Limited(respec);
        self
    }

    pub fn with_unlimited_respec(mut self) -> Self {
        self.respec_budget = RespecBudget::Unlimited;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_max_time(mut self, max_time: Duration) -> Self {
        self.max_time = max_time;
        self
    }

    pub fn with_patience(mut self, patience: u32) -> Self {
        self.patience = patience;
        self
    }

    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressReport) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Rejects a configuration the hill climber should never be asked to
    /// run: an unrecognized metric is unreachable through [`Metric`]'s
    /// closed enumeration, so only the numeric limits need checking here.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(OptimizerError::Configuration(
                "max_iterations must be greater than zero".to_string(),
            ));
        }
        if self.max_time.is_zero() {
            return Err(OptimizerError::Configuration(
                "max_time must be greater than zero".to_string(),
            ));
        }
        if self.patience == 0 {
            return Err(OptimizerError::Configuration(
                "patience must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
