pub mod build;
pub mod budget;
pub mod class;
pub mod config;
pub mod convergence;
pub mod error;
pub mod evaluator;
pub mod metric;
pub mod mutation;
pub mod neighbor;
pub mod node;
pub mod optimizer;
pub mod progress;
pub mod result;
pub mod tree;

/// initialize CLI logging for the bundled demo binary
#[cfg(feature = "cli")]
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
