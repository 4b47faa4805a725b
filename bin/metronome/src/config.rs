use clap::Parser;

/// Synthetic collection-driver workload for the aggregation engine.
#[derive(Clone, Parser)]
#[command(about)]
pub struct Config {
    /// Relative accuracy of distribution quantile estimates.
    #[arg(long, default_value_t = 0.01)]
    pub relative_accuracy: f64,

    /// Maximum number of populated bins per sketch store.
    #[arg(long, default_value_t = 2048)]
    pub max_bins: usize,

    /// Number of concurrent producer threads.
    #[arg(long, default_value_t = 4)]
    pub producers: usize,

    /// Measurements each producer records per collection interval.
    #[arg(long, default_value_t = 50_000)]
    pub values_per_interval: usize,

    /// Number of collection intervals to run.
    #[arg(long, default_value_t = 5)]
    pub intervals: usize,

    /// Seed for the synthetic latency distribution.
    #[arg(long, default_value_t = 0xC0FFEE)]
    pub seed: u64,
}
