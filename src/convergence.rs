/// Minimum relative improvement (0.1%) below which an improving move is
/// still counted toward the patience window as a "diminishing returns" step
/// rather than resetting it.
const DEFAULT_MIN_IMPROVEMENT: f64 = 0.001;

/// Stateful predicate over the sequence of best-score updates an
/// optimization run produces. Owns its own patience counter and a sticky
/// reason string; callers feed it one score per iteration via
/// [`ConvergenceDetector::update`] and poll [`ConvergenceDetector::has_converged`].
#[derive(Debug, Clone)]
pub struct ConvergenceDetector {
    patience: u32,
    min_improvement: f64,
    best_score: Option<f64>,
    stale_iterations: u32,
    reason: Option<String>,
}

impl ConvergenceDetector {
    pub fn new(patience: u32) -> Self {
        Self {
            patience,
            min_improvement: DEFAULT_MIN_IMPROVEMENT,
            best_score: None,
            stale_iterations: 0,
            reason: None,
        }
    }

    pub fn with_min_improvement(mut self, min_improvement: f64) -> Self {
        self.min_improvement = min_improvement;
        self
    }

    pub fn best_score(&self) -> Option<f64> {
        self.best_score
    }

    /// Feeds the current best score to the detector, updating its internal
    /// patience counter.
    pub fn update(&mut self, score: f64) {
        let Some(best) = self.best_score else {
            self.best_score = Some(score);
            self.stale_iterations = 0;
            return;
        };

        if score.is_nan() {
            self.stale_iterations += 1;
            return;
        }

        let delta = score - best;
        if delta > 0.0 {
            let rel = if best != 0.0 { delta / best.abs() } else { delta };
            if rel >= self.min_improvement {
                self.best_score = Some(score);
                self.stale_iterations = 0;
                self.reason = None;
            } else {
                self.best_score = Some(score);
                self.stale_iterations += 1;
                self.reason = Some("diminishing returns (<0.1% improvement)".to_string());
            }
        } else {
            self.stale_iterations += 1;
        }
    }

    /// True once `patience` consecutive iterations have failed to meet the
    /// minimum relative improvement. Idempotent: repeat calls after
    /// convergence keep returning true without re-deriving the reason.
    pub fn has_converged(&mut self) -> bool {
        let converged = self.stale_iterations >= self.patience;
        if converged && self.reason.is_none() {
            self.reason = Some(format!("no improvement for {} iterations", self.stale_iterations));
        }
        converged
    }

    /// The sticky human-readable reason, set the first time convergence is
    /// observed. `None` before convergence.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_never_converges() {
        let mut detector = ConvergenceDetector::new(3);
        detector.update(100.0);
        assert!(!detector.has_converged());
    }

    #[test]
    fn meaningful_improvement_resets_the_counter() {
        let mut detector = ConvergenceDetector::new(2);
        detector.update(100.0);
        detector.update(100.0); // stale 1
        detector.update(200.0); // big jump, resets
        assert!(!detector.has_converged());
    }

    #[test]
    fn patience_one_converges_after_single_stale_iteration() {
        let mut detector = ConvergenceDetector::new(1);
        detector.update(100.0);
        detector.update(100.0);
        assert!(detector.has_converged());
        assert!(detector.reason().unwrap().contains("no improvement"));
    }

    #[test]
    fn diminishing_returns_sets_sticky_reason() {
        let mut detector = ConvergenceDetector::new(3);
        for score in [100.0, 100.05, 100.09, 100.12, 100.14] {
            detector.update(score);
        }
        assert!(detector.has_converged());
        assert_eq!(
            detector.reason().unwrap(),
            "diminishing returns (<0.1% improvement)"
        );
    }

    #[test]
    fn regression_counts_as_no_improvement() {
        let mut detector = ConvergenceDetector::new(2);
        detector.update(100.0);
        detector.update(50.0);
        detector.update(50.0);
        assert!(detector.has_converged());
    }

    #[test]
    fn nan_counts_as_no_improvement() {
        let mut detector = ConvergenceDetector::new(1);
        detector.update(100.0);
        detector.update(f64::NAN);
        assert!(detector.has_converged());
    }
}
