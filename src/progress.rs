use crate::budget::BudgetUsage;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use std::time::Instant;

/// Iterations between throttled progress callbacks, beyond the mandatory
/// first one.
const REPORT_EVERY: u64 = 100;

/// Payload delivered to the optional progress callback once per reported
/// iteration.
#[derive(Debug, Clone, Copy)]
pub struct ProgressReport {
    pub iteration: u64,
    pub best_score: f64,
    pub improvement_pct: f64,
    pub budget: BudgetUsage,
    pub elapsed: Duration,
}

type Callback = dyn Fn(ProgressReport) + Send + Sync;

/// Invokes an optional user callback and a `log` line at iteration 1 and
/// every multiple of 100. Tracks the monotonically non-decreasing best
/// score and the run's start time so elapsed/"improvement so far" can be
/// computed without threading extra state through the hill climber.
pub struct ProgressTracker {
    callback: Option<Box<Callback>>,
    started_at: Instant,
    baseline_score: f64,
    best_score: f64,
}

impl ProgressTracker {
    pub fn new(callback: Option<Box<Callback>>, baseline_score: f64) -> Self {
        Self {
            callback,
            started_at: Instant::now(),
            baseline_score,
            best_score: baseline_score,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn should_report(iteration: u64) -> bool {
        iteration == 0 || iteration == 1 || iteration % REPORT_EVERY == 0
    }

    /// Records the latest best score and, if `iteration` falls on a
    /// reporting boundary, logs and invokes the callback. A panicking
    /// callback is caught and logged rather than allowed to unwind through
    /// the optimizer.
    pub fn report(&mut self, iteration: u64, current_best: f64, budget: BudgetUsage) {
        if current_best > self.best_score {
            self.best_score = current_best;
        }
        if !Self::should_report(iteration) {
            return;
        }

        let improvement_pct = if self.baseline_score != 0.0 {
            100.0 * (self.best_score - self.baseline_score) / self.baseline_score
        } else {
            0.0
        };
        let elapsed = self.elapsed();
        log::info!(
            "iteration {iteration}: best={:.4} improvement={:.2}% elapsed={:.2}s",
            self.best_score,
            improvement_pct,
            elapsed.as_secs_f64()
        );

        if let Some(callback) = &self.callback {
            let report = ProgressReport {
                iteration,
                best_score: self.best_score,
                improvement_pct,
                budget,
                elapsed,
            };
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| callback(report)));
            if outcome.is_err() {
                log::warn!("progress callback panicked; ignoring and continuing the optimization run");
            }
        }
    }
}
