//! Aggregation errors.

use snafu::Snafu;

/// An aggregation error.
///
/// Every variant is a local, recoverable condition surfaced to the immediate caller; nothing here should take down a
/// collection driver. `ConfigInvalid` is the only construction-time failure, and the rejection variants flow through
/// aggregator warning handlers rather than being returned from `update`.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)))]
#[snafu(visibility(pub(crate)))]
pub enum AggregationError {
    /// The sketch configuration was invalid.
    #[snafu(display("invalid aggregator configuration: {}", source))]
    ConfigInvalid {
        /// The underlying configuration error.
        source: logsketch::ConfigError,
    },

    /// A negative measurement was rejected by instrument policy.
    #[snafu(display("instrument '{}' does not permit negative values; measurement dropped", instrument))]
    NegativeValueRejected {
        /// Name of the instrument that rejected the measurement.
        instrument: String,
    },

    /// A NaN measurement was rejected.
    #[snafu(display("instrument '{}' received a NaN measurement; measurement dropped", instrument))]
    NanValueRejected {
        /// Name of the instrument that rejected the measurement.
        instrument: String,
    },

    /// An accessor was called against an absent or empty checkpoint.
    #[snafu(display("no checkpointed data to report"))]
    NoData,

    /// A quantile query fell outside of the populated domain.
    #[snafu(display("quantile {} is outside of the populated domain", q))]
    InvalidQuantile {
        /// The requested quantile.
        q: f64,
    },

    /// Two aggregators of different kinds were asked to merge.
    #[snafu(display("cannot merge '{}' checkpoint into '{}' aggregator", other, this))]
    MergeTypeMismatch {
        /// Kind of the aggregator being merged into.
        this: &'static str,

        /// Kind of the aggregator being merged from.
        other: &'static str,
    },
}
