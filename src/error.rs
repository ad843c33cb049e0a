use thiserror::Error;

/// The crate's single public error type.
///
/// Every fallible entry point returns `Result<T, OptimizerError>`. Per-candidate
/// evaluator failures during the hill-climb loop are *not* represented here —
/// they are caught, scored as negative infinity, and never escape
/// [`crate::optimizer::optimize_build`]. Only conditions that are fatal to the
/// whole request surface through this enum; bugs internal to the core itself
/// (a budget overrun, a disconnected allocation the generator should never have
/// proposed) are `debug_assert!`/`panic!`, not `Result`, per the design notes.
#[derive(Error, Debug)]
pub enum OptimizerError {
    /// The passive tree data source was missing, unparsable, or lacked a
    /// required field.
    #[error("passive tree data unavailable: {0}")]
    DataUnavailable(String),

    /// An `OptimizationConfiguration` failed its own validation.
    #[error("invalid optimizer configuration: {0}")]
    Configuration(String),

    /// `calculate_build_stats` rejected a build outright.
    #[error("evaluator error: {0}")]
    Evaluator(String),

    /// `calculate_build_stats` exceeded its own internal deadline.
    #[error("evaluator timed out: {0}")]
    EvaluatorTimeout(String),

    /// A character class has no registered class-start node.
    #[error("unknown character class: {0}")]
    UnknownClass(String),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
