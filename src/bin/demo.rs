//! Demo binary
//!
//! Runs the hill climber against the bundled fixture tree with a toy
//! evaluator that rewards Keystones and Notables, so the search has
//! something non-trivial to climb toward. Not a real build simulator: see
//! §1 of the write-up for why that piece is out of scope for this crate.

use anyhow::Context;
use ascendant_core::build::BuildData;
use ascendant_core::build::BuildStats;
use ascendant_core::build::Resistances;
use ascendant_core::class::CharacterClass;
use ascendant_core::config::OptimizationConfiguration;
use ascendant_core::error::OptimizerError;
use ascendant_core::evaluator::BuildEvaluator;
use ascendant_core::metric::Metric;
use ascendant_core::optimizer::optimize_build;
use ascendant_core::tree::PassiveTreeGraph;
use clap::Parser;
use clap::ValueEnum;
use colored::Colorize;

#[derive(Parser)]
#[command(author, version, about = "Passive skill tree hill-climb demo", long_about = None)]
struct Args {
    /// Character class to optimize for (must have a class-start node).
    #[arg(long, value_enum, default_value_t = ClassArg::Witch)]
    class: ClassArg,
    /// Character level, clamps the available point pool.
    #[arg(long, default_value_t = 60)]
    level: u32,
    /// Free (unallocated) passive points to spend.
    #[arg(long, default_value_t = 8)]
    free_points: u32,
    /// Respec points available; omit for unlimited.
    #[arg(long)]
    respec_points: Option<u32>,
    /// Objective to optimize.
    #[arg(long, value_enum, default_value_t = MetricArg::Dps)]
    metric: MetricArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Dps,
    Ehp,
    Balanced,
}

impl From<MetricArg> for Metric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Dps => Metric::Dps,
            MetricArg::Ehp => Metric::Ehp,
            MetricArg::Balanced => Metric::Balanced,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ClassArg {
    Witch,
    Warrior,
    Ranger,
    Monk,
    Mercenary,
    Sorceress,
    Huntress,
}

impl From<ClassArg> for CharacterClass {
    fn from(value: ClassArg) -> Self {
        match value {
            ClassArg::Witch => CharacterClass::Witch,
            ClassArg::Warrior => CharacterClass::Warrior,
            ClassArg::Ranger => CharacterClass::Ranger,
            ClassArg::Monk => CharacterClass::Monk,
            ClassArg::Mercenary => CharacterClass::Mercenary,
            ClassArg::Sorceress => CharacterClass::Sorceress,
            ClassArg::Huntress => CharacterClass::Huntress,
        }
    }
}

/// A toy stand-in for the real build simulator: total DPS and EHP both
/// scale with how many Keystones/Notables are allocated, so the optimizer
/// has a reason to prefer them over plain travel nodes.
struct ToyEvaluator<'a> {
    tree: &'a PassiveTreeGraph,
}

impl<'a> BuildEvaluator for ToyEvaluator<'a> {
    fn calculate_build_stats(&self, build: &BuildData) -> Result<BuildStats, OptimizerError> {
        let mut dps = 100.0;
        let mut life = 1000.0;
        for &id in build.allocated.iter() {
            let Some(node) = self.tree.node(id) else { continue };
            if node.is_keystone {
                dps += 150.0;
                life += 50.0;
            } else if node.is_notable {
                dps += 40.0;
                life += 80.0;
            } else {
                dps += 5.0;
                life += 10.0;
            }
        }
        BuildStats::new(dps, life, 0.0, 0.0, life, 0.0, 0.0, 0.0, 0.0, 0.0, Resistances::default())
    }
}

fn main() -> anyhow::Result<()> {
    ascendant_core::init_logging();
    let args = Args::parse();

    let class: CharacterClass = args.class.into();
    let tree = PassiveTreeGraph::fixture();
    let start = tree
        .class_start(class)
        .with_context(|| format!("resolving class-start node for {}", class))?;
    let build = BuildData::new(class, args.level, [start]);

    let mut config = OptimizationConfiguration::new(build, args.metric.into(), args.free_points)
        .with_progress_callback(|report| {
            println!(
                "{} iter={:>4} best={:>9.2} improvement={:>6.2}% elapsed={:.2}s",
                "progress".cyan(),
                report.iteration,
                report.best_score,
                report.improvement_pct,
                report.elapsed.as_secs_f64(),
            );
        });
    config = match args.respec_points {
        Some(points) => config.with_respec_budget(points),
        None => config.with_unlimited_respec(),
    };

    let evaluator = ToyEvaluator { tree: &tree };
    let result = optimize_build(config, &tree, &evaluator).context("running the hill climber")?;

    println!();
    println!("{}", "optimization result".green().bold());
    println!("  convergence:   {}", result.convergence_reason.as_str());
    if let Some(detail) = &result.convergence_detail {
        println!("    detail:      {detail}");
    }
    println!("  iterations:    {}", result.iterations_run);
    println!("  improvement:   {:.2}%", result.improvement_pct);
    println!("  nodes added:   {:?}", result.node_changes.added);
    println!("  nodes removed: {:?}", result.node_changes.removed);
    println!("  swaps:         {}", result.node_changes.swaps);
    println!("  elapsed:       {:.3}s", result.elapsed_seconds());
    Ok(())
}
