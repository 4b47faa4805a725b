//! Quantile-sketch distribution aggregator.

use std::any::Any;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use logsketch::{Sketch, SketchConfig};
use snafu::ResultExt as _;

use super::{
    default_warning_handler, range_test, Aggregator, Count, Distribution, Max, Min, MinMaxSumCount, Quantile, Sum,
    WarningHandler,
};
use crate::descriptor::Descriptor;
use crate::error::{AggregationError, ConfigInvalid};
use crate::record::Record;
use crate::value::{MeasurementValue, NumericKind};

/// An aggregator summarizing the full distribution of measurements through a quantile sketch.
///
/// Quantile estimates carry the sketch's bounded relative-error guarantee; the sum and count are exact. Measurements
/// are coerced to `f64` on the way into the sketch, and accessor results are coerced back to the instrument's numeric
/// kind.
pub struct DistributionAggregator {
    config: SketchConfig,
    numeric_kind: NumericKind,
    current: Mutex<Sketch>,
    checkpoint: ArcSwapOption<Sketch>,
    warnings: WarningHandler,
}

impl DistributionAggregator {
    /// Creates a new `DistributionAggregator` from an already-validated sketch configuration.
    pub fn new(config: &SketchConfig, descriptor: &Descriptor) -> Self {
        Self {
            current: Mutex::new(Sketch::new(config)),
            config: config.clone(),
            numeric_kind: descriptor.numeric_kind(),
            checkpoint: ArcSwapOption::empty(),
            warnings: default_warning_handler(),
        }
    }

    /// Creates a new `DistributionAggregator` with the given relative accuracy and bin-count cap.
    ///
    /// # Errors
    ///
    /// If the relative accuracy is not strictly between 0 and 1, or `max_bins` is zero, `ConfigInvalid` is returned.
    pub fn from_accuracy(
        relative_accuracy: f64, max_bins: usize, descriptor: &Descriptor,
    ) -> Result<Self, AggregationError> {
        let config = SketchConfig::new(relative_accuracy, max_bins).context(ConfigInvalid)?;
        Ok(Self::new(&config, descriptor))
    }

    /// Sets the handler invoked when a measurement is rejected by instrument policy.
    pub fn with_warning_handler(mut self, warnings: WarningHandler) -> Self {
        self.warnings = warnings;
        self
    }

    /// Returns the most recent checkpointed sketch, if any checkpoint has been taken.
    pub fn checkpointed(&self) -> Option<Arc<Sketch>> {
        self.checkpoint.load_full()
    }

    fn to_value(&self, value: f64) -> MeasurementValue {
        match self.numeric_kind {
            NumericKind::Integer => MeasurementValue::Integer(value as i64),
            NumericKind::Float => MeasurementValue::Float(value),
        }
    }
}

impl Aggregator for DistributionAggregator {
    fn kind(&self) -> &'static str {
        "distribution"
    }

    fn update(&self, value: MeasurementValue, record: &Record<'_>) {
        if let Err(warning) = range_test(value, record.descriptor()) {
            (self.warnings)(&warning);
            return;
        }

        let mut current = self.current.lock().unwrap();
        current.add(value.coerce_to_f64());
    }

    fn checkpoint(&self, _descriptor: &Descriptor) {
        let fresh = Sketch::new(&self.config);
        let frozen = {
            let mut current = self.current.lock().unwrap();
            mem::replace(&mut *current, fresh)
        };

        self.checkpoint.store(Some(Arc::new(frozen)));
    }

    fn checkpoint_count(&self) -> u64 {
        self.checkpoint.load().as_ref().map_or(0, |sketch| sketch.count())
    }

    fn merge(&self, other: &dyn Aggregator, _descriptor: &Descriptor) -> Result<(), AggregationError> {
        let other_kind = other.kind();
        let other = other
            .as_any()
            .downcast_ref::<Self>()
            .ok_or(AggregationError::MergeTypeMismatch {
                this: self.kind(),
                other: other_kind,
            })?;

        let Some(other_checkpoint) = other.checkpointed() else {
            return Ok(());
        };

        let merged = match self.checkpoint.swap(None) {
            Some(previous) => {
                let mut merged = Arc::try_unwrap(previous).unwrap_or_else(|shared| (*shared).clone());
                merged.merge(&other_checkpoint);
                merged
            }
            None => (*other_checkpoint).clone(),
        };

        self.checkpoint.store(Some(Arc::new(merged)));

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Sum for DistributionAggregator {
    fn sum(&self) -> MeasurementValue {
        let sum = self.checkpoint.load().as_ref().map_or(0.0, |sketch| sketch.sum());
        self.to_value(sum)
    }
}

impl Count for DistributionAggregator {
    fn count(&self) -> u64 {
        self.checkpoint_count()
    }
}

impl Min for DistributionAggregator {
    fn min(&self) -> Result<MeasurementValue, AggregationError> {
        let checkpoint = self.checkpointed().ok_or(AggregationError::NoData)?;
        checkpoint.min().map(|value| self.to_value(value)).ok_or(AggregationError::NoData)
    }
}

impl Max for DistributionAggregator {
    fn max(&self) -> Result<MeasurementValue, AggregationError> {
        let checkpoint = self.checkpointed().ok_or(AggregationError::NoData)?;
        checkpoint.max().map(|value| self.to_value(value)).ok_or(AggregationError::NoData)
    }
}

impl Quantile for DistributionAggregator {
    fn quantile(&self, q: f64) -> Result<MeasurementValue, AggregationError> {
        let checkpoint = self.checkpointed().ok_or(AggregationError::InvalidQuantile { q })?;
        checkpoint
            .quantile(q)
            .map(|value| self.to_value(value))
            .ok_or(AggregationError::InvalidQuantile { q })
    }
}

impl MinMaxSumCount for DistributionAggregator {}

impl Distribution for DistributionAggregator {}

impl fmt::Debug for DistributionAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DistributionAggregator")
            .field("config", &self.config)
            .field("numeric_kind", &self.numeric_kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::descriptor::AggregationKind;
    use crate::record::LabelSet;

    fn distribution_descriptor() -> Descriptor {
        Descriptor::new("request.latency", NumericKind::Float, AggregationKind::Distribution)
    }

    #[test]
    fn invalid_accuracy_fails_construction() {
        let descriptor = distribution_descriptor();
        let result = DistributionAggregator::from_accuracy(0.0, 2048, &descriptor);
        assert!(matches!(result, Err(AggregationError::ConfigInvalid { .. })));
    }

    #[test]
    fn accessors_before_first_checkpoint() {
        let descriptor = distribution_descriptor();
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        assert_eq!(aggregator.count(), 0);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(0.0));
        assert!(matches!(aggregator.min(), Err(AggregationError::NoData)));
        assert!(matches!(
            aggregator.quantile(0.5),
            Err(AggregationError::InvalidQuantile { .. })
        ));
    }

    #[test]
    fn update_checkpoint_read() {
        let descriptor = distribution_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        for i in 1..=100 {
            aggregator.update(MeasurementValue::Float(i as f64), &record);
        }
        aggregator.checkpoint(&descriptor);

        assert_eq!(aggregator.count(), 100);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(5050.0));

        let median = match aggregator.quantile(0.5).unwrap() {
            MeasurementValue::Float(value) => value,
            other => panic!("unexpected kind: {:?}", other),
        };
        assert!((49.5..=50.5).contains(&median), "median {} outside [49.5, 50.5]", median);
    }

    #[test]
    fn updates_after_checkpoint_do_not_leak_in() {
        let descriptor = distribution_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        aggregator.update(MeasurementValue::Float(1.0), &record);
        aggregator.checkpoint(&descriptor);
        aggregator.update(MeasurementValue::Float(100.0), &record);

        assert_eq!(aggregator.count(), 1);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(1.0));

        // The late update is waiting in the next cycle, not lost.
        aggregator.checkpoint(&descriptor);
        assert_eq!(aggregator.count(), 1);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(100.0));
    }

    #[test]
    fn negative_update_rejected_with_warning() {
        let descriptor = distribution_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);

        let rejections = Arc::new(AtomicUsize::new(0));
        let observed = Arc::clone(&rejections);
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor)
            .unwrap()
            .with_warning_handler(Arc::new(move |warning| {
                assert!(matches!(warning, AggregationError::NegativeValueRejected { .. }));
                observed.fetch_add(1, Ordering::Relaxed);
            }));

        aggregator.update(MeasurementValue::Float(-1.0), &record);
        aggregator.checkpoint(&descriptor);

        assert_eq!(aggregator.count(), 0);
        assert_eq!(rejections.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn negative_update_allowed_by_policy() {
        let descriptor = distribution_descriptor().with_allow_negative(true);
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        aggregator.update(MeasurementValue::Float(-2.5), &record);
        aggregator.checkpoint(&descriptor);

        assert_eq!(aggregator.count(), 1);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(-2.5));
    }

    #[test]
    fn integer_kind_coerces_accessor_results() {
        let descriptor = Descriptor::new("queue.depth", NumericKind::Integer, AggregationKind::Distribution);
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        for i in 1..=10 {
            aggregator.update(MeasurementValue::Integer(i), &record);
        }
        aggregator.checkpoint(&descriptor);

        assert_eq!(aggregator.sum(), MeasurementValue::Integer(55));
        assert!(matches!(aggregator.quantile(1.0).unwrap(), MeasurementValue::Integer(_)));
    }

    #[test]
    fn merge_combines_checkpoints() {
        let descriptor = distribution_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);

        let a = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();
        let b = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        for i in 1..=50 {
            a.update(MeasurementValue::Float(i as f64), &record);
        }
        for i in 51..=100 {
            b.update(MeasurementValue::Float(i as f64), &record);
        }
        a.checkpoint(&descriptor);
        b.checkpoint(&descriptor);

        a.merge(&b, &descriptor).unwrap();

        assert_eq!(a.count(), 100);
        assert_eq!(a.sum(), MeasurementValue::Float(5050.0));
    }

    #[test]
    fn merge_type_mismatch_leaves_state_untouched() {
        let descriptor = distribution_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

        aggregator.update(MeasurementValue::Float(7.0), &record);
        aggregator.checkpoint(&descriptor);

        let count_descriptor = Descriptor::new("request.count", NumericKind::Integer, AggregationKind::Count);
        let other = super::super::CountAggregator::new();
        other.checkpoint(&count_descriptor);

        let result = aggregator.merge(&other, &descriptor);
        assert!(matches!(result, Err(AggregationError::MergeTypeMismatch { .. })));

        assert_eq!(aggregator.count(), 1);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(7.0));
    }
}
