//! Aggregator kinds and the checkpoint protocol.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use logsketch::SketchConfig;

use crate::descriptor::{AggregationKind, Descriptor};
use crate::error::AggregationError;
use crate::record::Record;
use crate::value::{MeasurementValue, NumericKind};

mod sum;
pub use self::sum::SumAggregator;

mod count;
pub use self::count::CountAggregator;

mod minmaxsumcount;
pub use self::minmaxsumcount::MinMaxSumCountAggregator;

mod distribution;
pub use self::distribution::DistributionAggregator;

/// Handler invoked for non-fatal conditions surfaced during aggregation, such as measurements rejected by instrument
/// policy. Handlers must be cheap and must not call back into the aggregator.
pub type WarningHandler = Arc<dyn Fn(&AggregationError) + Send + Sync>;

/// Returns the default warning handler, which emits each warning through `tracing`.
pub fn default_warning_handler() -> WarningHandler {
    Arc::new(|warning| tracing::warn!("{}", warning))
}

/// Validates a measurement against an instrument's policy before it is allowed to touch accumulation state.
pub(crate) fn range_test(value: MeasurementValue, descriptor: &Descriptor) -> Result<(), AggregationError> {
    if descriptor.numeric_kind() == NumericKind::Float && value.is_nan() {
        return Err(AggregationError::NanValueRejected {
            instrument: descriptor.name().to_string(),
        });
    }

    if !descriptor.allow_negative() && value.is_negative() {
        return Err(AggregationError::NegativeValueRejected {
            instrument: descriptor.name().to_string(),
        });
    }

    Ok(())
}

/// The checkpoint protocol implemented by every aggregator kind.
///
/// An aggregator owns two pieces of state: `current`, which continuously receives updates, and `checkpoint`, the
/// immutable snapshot frozen by the most recent [`checkpoint`](Self::checkpoint) call. Updates may arrive from any
/// number of threads without coordination; the checkpoint swap is atomic with respect to them, so every update lands
/// entirely in the pre-swap or entirely in the post-swap state.
///
/// Accessors ([`Sum`], [`Count`], [`Min`], [`Max`], [`Quantile`]) read only from the checkpoint and are reached by
/// downcasting through [`as_any`](Self::as_any) at the exporter boundary.
pub trait Aggregator: fmt::Debug + Send + Sync {
    /// Returns the name of this aggregator kind, used when reporting merge mismatches.
    fn kind(&self) -> &'static str;

    /// Incorporates one measurement into the current accumulation state.
    ///
    /// The value's kind must match the descriptor's numeric kind. Measurements rejected by instrument policy (a
    /// negative value against an instrument that forbids them, or a NaN) leave the current state untouched and are
    /// reported through the aggregator's warning handler.
    fn update(&self, value: MeasurementValue, record: &Record<'_>);

    /// Atomically replaces the current accumulation state with a fresh one and publishes the old state as the
    /// checkpoint.
    ///
    /// Safe to call concurrently with any number of in-flight updates. Always succeeds; callers are expected to skip
    /// exporting a checkpoint whose count is zero.
    fn checkpoint(&self, descriptor: &Descriptor);

    /// Returns the number of measurements in the most recent checkpoint, or zero if no checkpoint has been taken.
    fn checkpoint_count(&self) -> u64;

    /// Merges another aggregator's checkpoint into this one's, in place.
    ///
    /// Both aggregators must be checkpointed and not receiving concurrent updates or merges; that scheduling is the
    /// collection driver's responsibility, not enforced here.
    ///
    /// # Errors
    ///
    /// If the other aggregator is of a different kind, `MergeTypeMismatch` is returned and this aggregator's state is
    /// left exactly as it was.
    fn merge(&self, other: &dyn Aggregator, descriptor: &Descriptor) -> Result<(), AggregationError>;

    /// Returns this aggregator as `Any`, for downcasting to a concrete kind or capability trait.
    fn as_any(&self) -> &dyn Any;
}

/// Read access to a checkpointed sum.
pub trait Sum {
    /// Returns the sum of the checkpoint, or the zero value if no checkpoint has been taken.
    fn sum(&self) -> MeasurementValue;
}

/// Read access to a checkpointed count.
pub trait Count {
    /// Returns the count of the checkpoint, or zero if no checkpoint has been taken.
    fn count(&self) -> u64;
}

/// Read access to a checkpointed minimum.
pub trait Min {
    /// Returns the minimum of the checkpoint.
    ///
    /// # Errors
    ///
    /// If the checkpoint is absent or empty, `NoData` is returned.
    fn min(&self) -> Result<MeasurementValue, AggregationError>;
}

/// Read access to a checkpointed maximum.
pub trait Max {
    /// Returns the maximum of the checkpoint.
    ///
    /// # Errors
    ///
    /// If the checkpoint is absent or empty, `NoData` is returned.
    fn max(&self) -> Result<MeasurementValue, AggregationError>;
}

/// Read access to checkpointed quantile estimates.
pub trait Quantile {
    /// Returns the estimated value at the given quantile of the checkpoint.
    ///
    /// # Errors
    ///
    /// If the checkpoint is absent or empty, or `q` is outside of `[0, 1]`, `InvalidQuantile` is returned.
    fn quantile(&self, q: f64) -> Result<MeasurementValue, AggregationError>;
}

/// The min/max/sum/count capability bundle.
pub trait MinMaxSumCount: Min + Max + Sum + Count {}

/// The full distribution capability bundle: min/max/sum/count plus quantile estimates.
pub trait Distribution: MinMaxSumCount + Quantile {}

/// Creates a new aggregator of the kind selected by the descriptor.
///
/// `sketch_config` only applies to the distribution kind; the scalar kinds ignore it.
pub fn new_aggregator(descriptor: &Descriptor, sketch_config: &SketchConfig) -> Box<dyn Aggregator> {
    match descriptor.aggregation_kind() {
        AggregationKind::Sum => Box::new(SumAggregator::new(descriptor)),
        AggregationKind::Count => Box::new(CountAggregator::new()),
        AggregationKind::MinMaxSumCount => Box::new(MinMaxSumCountAggregator::new(descriptor)),
        AggregationKind::Distribution => Box::new(DistributionAggregator::new(sketch_config, descriptor)),
    }
}
