//! Independent replications of one line configuration over many seeds.
//!
//! Each replication builds its own line, so nothing is shared between runs.
//! With the `parallel` feature the runs are spread over rayon's thread pool;
//! results are identical either way and come back in seed order.

use crate::config::LineConfig;
use crate::line::{LineError, LineStats, ProductionLine};
use std::fmt;
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Outcome of one replication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Replication {
    pub seed: u64,
    pub stats: LineStats,
}

/// Mean, minimum and maximum of one counter across replications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub min: u64,
    pub max: u64,
}

impl Summary {
    fn of(values: impl Iterator<Item = u64>) -> Option<Self> {
        let mut count = 0u64;
        let mut total = 0u128;
        let mut min = u64::MAX;
        let mut max = 0;
        for v in values {
            count += 1;
            total += u128::from(v);
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| Self {
            mean: total as f64 / count as f64,
            min,
            max,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mean {:.2}, min {}, max {}", self.mean, self.min, self.max)
    }
}

/// Results of [`replicate`], in seed order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationReport {
    pub timeslots: usize,
    pub runs: Vec<Replication>,
}

impl ReplicationReport {
    /// Summary of product counts; `None` when there were no runs.
    pub fn products(&self) -> Option<Summary> {
        Summary::of(self.runs.iter().map(|r| r.stats.products))
    }

    /// Summary of drop counts; `None` when there were no runs.
    pub fn drops(&self) -> Option<Summary> {
        Summary::of(self.runs.iter().map(|r| r.stats.drops))
    }
}

fn run_one(config: &LineConfig, seed: u64, timeslots: usize) -> Result<Replication, LineError> {
    let mut line = ProductionLine::from_config(&config.clone().with_seed(seed))?;
    let stats = line.try_run(timeslots)?;
    Ok(Replication { seed, stats })
}

/// Run `config` once per seed for `timeslots` timeslots each.
///
/// The seed in `config` is ignored. Fails on the first invalid configuration
/// or broken run.
pub fn replicate(
    config: &LineConfig,
    seeds: impl IntoIterator<Item = u64>,
    timeslots: usize,
) -> Result<ReplicationReport, LineError> {
    config.validate()?;
    let seeds: Vec<u64> = seeds.into_iter().collect();

    #[cfg(feature = "parallel")]
    let runs = seeds
        .par_iter()
        .map(|&seed| run_one(config, seed, timeslots))
        .collect::<Result<Vec<_>, _>>()?;

    #[cfg(not(feature = "parallel"))]
    let runs = seeds
        .iter()
        .map(|&seed| run_one(config, seed, timeslots))
        .collect::<Result<Vec<_>, _>>()?;

    info!(replications = runs.len(), timeslots, "replications complete");
    Ok(ReplicationReport { timeslots, runs })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_values() {
        let s = Summary::of([2, 4, 9].into_iter()).unwrap();
        assert_eq!(s.min, 2);
        assert_eq!(s.max, 9);
        assert!((s.mean - 5.0).abs() < 1e-9);
        assert!(Summary::of(std::iter::empty()).is_none());
    }

    #[test]
    fn replications_keep_seed_order_and_match_single_runs() {
        let config = LineConfig::new(3, 1);
        let report = replicate(&config, [5, 1, 3], 100).unwrap();
        assert_eq!(report.runs.iter().map(|r| r.seed).collect::<Vec<_>>(), vec![5, 1, 3]);

        let mut single = ProductionLine::from_config(&config.clone().with_seed(1)).unwrap();
        let stats = single.try_run(100).unwrap();
        assert_eq!(report.runs[1].stats, stats);
    }

    #[test]
    fn empty_seed_list_has_no_summary() {
        let report = replicate(&LineConfig::default(), [], 10).unwrap();
        assert!(report.runs.is_empty());
        assert!(report.products().is_none());
        assert!(report.drops().is_none());
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let result = replicate(&LineConfig::new(0, 0), [1, 2], 10);
        assert!(matches!(result, Err(LineError::Config(_))));
    }
}
