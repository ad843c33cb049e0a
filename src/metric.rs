use crate::build::BuildStats;
use serde::Deserialize;
use serde::Serialize;

/// The closed set of optimization objectives. Encoded as a tagged enum with
/// an exhaustive match in the hot path rather than string comparisons, per
/// the dispatch design note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Raw total damage per second.
    Dps,
    /// Life plus energy shield (MVP effective-hit-points formula).
    Ehp,
    /// `0.6 * normalized_dps_delta + 0.4 * normalized_ehp_delta` against a
    /// baseline. Callers should always supply a baseline when using this
    /// variant: without one the fallback mixes raw DPS and raw EHP on
    /// different scales and is documented as unreliable.
    Balanced,
}

/// Weight on the DPS component of [`Metric::Balanced`].
const BALANCED_DPS_WEIGHT: f64 = 0.6;
/// Weight on the EHP component of [`Metric::Balanced`].
const BALANCED_EHP_WEIGHT: f64 = 0.4;
/// Scale divisor used when a baseline component is exactly zero, to keep
/// the normalized delta on a comparable order of magnitude.
const ZERO_BASELINE_SCALE: f64 = 1000.0;

/// Reduces `stats` to a single comparable score for `metric`.
///
/// Pure and total: never panics, never returns NaN for finite inputs (stats
/// are already guaranteed finite by [`BuildStats::new`]).
pub fn calculate_metric(stats: &BuildStats, metric: Metric, baseline: Option<&BuildStats>) -> f64 {
    match metric {
        Metric::Dps => stats.total_dps,
        Metric::Ehp => stats.ehp(),
        Metric::Balanced => balanced_score(stats, baseline),
    }
}

fn normalized_delta(current: f64, base: f64) -> f64 {
    if base == 0.0 {
        current / ZERO_BASELINE_SCALE
    } else {
        (current - base) / base
    }
}

fn balanced_score(stats: &BuildStats, baseline: Option<&BuildStats>) -> f64 {
    match baseline {
        Some(baseline) => {
            let d = normalized_delta(stats.total_dps, baseline.total_dps);
            let e = normalized_delta(stats.ehp(), baseline.ehp());
            BALANCED_DPS_WEIGHT * d + BALANCED_EHP_WEIGHT * e
        }
        None => {
            log::warn!(
                "Metric::Balanced invoked without a baseline; falling back to an \
                 unnormalized weighted sum of raw DPS and raw EHP, which mixes \
                 incomparable scales and is unreliable"
            );
            BALANCED_DPS_WEIGHT * stats.total_dps + BALANCED_EHP_WEIGHT * stats.ehp()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Resistances;

    fn stats(dps: f64, life: f64, es: f64) -> BuildStats {
        BuildStats::new(dps, life, es, 0.0, life + es, 0.0, 0.0, 0.0, 0.0, 0.0, Resistances::default()).unwrap()
    }

    #[test]
    fn dps_metric_is_total_dps() {
        let s = stats(123.0, 0.0, 0.0);
        assert_eq!(calculate_metric(&s, Metric::Dps, None), 123.0);
    }

    #[test]
    fn ehp_metric_sums_life_and_es() {
        let s = stats(0.0, 1000.0, 500.0);
        assert_eq!(calculate_metric(&s, Metric::Ehp, None), 1500.0);
    }

    #[test]
    fn balanced_metric_weights_normalized_deltas() {
        let baseline = stats(100.0, 1000.0, 0.0);
        let current = stats(150.0, 1500.0, 0.0);
        let score = calculate_metric(&current, Metric::Balanced, Some(&baseline));
        // d = 0.5, e = 0.5 -> 0.6*0.5 + 0.4*0.5 = 0.5
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn balanced_metric_substitutes_scale_when_baseline_is_zero() {
        let baseline = stats(0.0, 0.0, 0.0);
        let current = stats(2000.0, 0.0, 0.0);
        let score = calculate_metric(&current, Metric::Balanced, Some(&baseline));
        // d = 2000/1000 = 2.0, e = 0 -> 0.6*2.0 = 1.2
        assert!((score - 1.2).abs() < 1e-9);
    }

    #[test]
    fn balanced_metric_without_baseline_uses_raw_weighted_sum() {
        let current = stats(100.0, 500.0, 0.0);
        let score = calculate_metric(&current, Metric::Balanced, None);
        assert!((score - (0.6 * 100.0 + 0.4 * 500.0)).abs() < 1e-9);
    }
}
