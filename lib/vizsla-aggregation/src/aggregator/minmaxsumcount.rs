//! Min/max/sum/count aggregator.

use std::any::Any;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;

use super::{default_warning_handler, range_test, Aggregator, Count, Max, Min, MinMaxSumCount, Sum, WarningHandler};
use crate::descriptor::Descriptor;
use crate::error::AggregationError;
use crate::record::Record;
use crate::value::{MeasurementValue, NumericKind};

#[derive(Clone, Copy, Debug)]
struct MmscState {
    min: MeasurementValue,
    max: MeasurementValue,
    sum: MeasurementValue,
    count: u64,
}

impl MmscState {
    fn empty(kind: NumericKind) -> Self {
        Self {
            min: MeasurementValue::zero(kind),
            max: MeasurementValue::zero(kind),
            sum: MeasurementValue::zero(kind),
            count: 0,
        }
    }

    fn record(&mut self, value: MeasurementValue) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
        }

        self.sum.add(value);
        self.count += 1;
    }

    fn merge(&mut self, other: &Self) {
        if other.count == 0 {
            return;
        }

        if self.count == 0 {
            *self = *other;
            return;
        }

        if other.min < self.min {
            self.min = other.min;
        }
        if other.max > self.max {
            self.max = other.max;
        }
        self.sum.add(other.sum);
        self.count += other.count;
    }
}

/// An aggregator tracking the exact minimum, maximum, sum, and count of measurements.
///
/// The cheaper alternative to a full distribution summary when only the envelope of the interval matters.
pub struct MinMaxSumCountAggregator {
    numeric_kind: NumericKind,
    current: Mutex<MmscState>,
    checkpoint: ArcSwapOption<MmscState>,
    warnings: WarningHandler,
}

impl MinMaxSumCountAggregator {
    /// Creates a new `MinMaxSumCountAggregator` for the given instrument.
    pub fn new(descriptor: &Descriptor) -> Self {
        Self {
            numeric_kind: descriptor.numeric_kind(),
            current: Mutex::new(MmscState::empty(descriptor.numeric_kind())),
            checkpoint: ArcSwapOption::empty(),
            warnings: default_warning_handler(),
        }
    }

    /// Sets the handler invoked when a measurement is rejected by instrument policy.
    pub fn with_warning_handler(mut self, warnings: WarningHandler) -> Self {
        self.warnings = warnings;
        self
    }

    fn checkpointed_nonempty(&self) -> Result<MmscState, AggregationError> {
        match self.checkpoint.load().as_ref() {
            Some(state) if state.count > 0 => Ok(**state),
            _ => Err(AggregationError::NoData),
        }
    }
}

impl Aggregator for MinMaxSumCountAggregator {
    fn kind(&self) -> &'static str {
        "minmaxsumcount"
    }

    fn update(&self, value: MeasurementValue, record: &Record<'_>) {
        if let Err(warning) = range_test(value, record.descriptor()) {
            (self.warnings)(&warning);
            return;
        }

        let mut current = self.current.lock().unwrap();
        current.record(value);
    }

    fn checkpoint(&self, _descriptor: &Descriptor) {
        let frozen = {
            let mut current = self.current.lock().unwrap();
            mem::replace(&mut *current, MmscState::empty(self.numeric_kind))
        };

        self.checkpoint.store(Some(Arc::new(frozen)));
    }

    fn checkpoint_count(&self) -> u64 {
        self.checkpoint.load().as_ref().map_or(0, |state| state.count)
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

        let Some(other_checkpoint) = other.checkpoint.load_full() else {
            return Ok(());
        };

        let merged = match self.checkpoint.swap(None) {
            Some(previous) => {
                let mut merged = *previous;
                merged.merge(&other_checkpoint);
                merged
            }
            None => *other_checkpoint,
        };

        self.checkpoint.store(Some(Arc::new(merged)));

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Sum for MinMaxSumCountAggregator {
    fn sum(&self) -> MeasurementValue {
        self.checkpoint
            .load()
            .as_ref()
            .map_or(MeasurementValue::zero(self.numeric_kind), |state| state.sum)
    }
}

impl Count for MinMaxSumCountAggregator {
    fn count(&self) -> u64 {
        self.checkpoint_count()
    }
}

impl Min for MinMaxSumCountAggregator {
    fn min(&self) -> Result<MeasurementValue, AggregationError> {
        self.checkpointed_nonempty().map(|state| state.min)
    }
}

impl Max for MinMaxSumCountAggregator {
    fn max(&self) -> Result<MeasurementValue, AggregationError> {
        self.checkpointed_nonempty().map(|state| state.max)
    }
}

impl MinMaxSumCount for MinMaxSumCountAggregator {}

impl fmt::Debug for MinMaxSumCountAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MinMaxSumCountAggregator")
            .field("numeric_kind", &self.numeric_kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::AggregationKind;
    use crate::record::LabelSet;

    fn mmsc_descriptor() -> Descriptor {
        Descriptor::new("payload.size", NumericKind::Float, AggregationKind::MinMaxSumCount).with_allow_negative(true)
    }

    #[test]
    fn tracks_envelope_exactly() {
        let descriptor = mmsc_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = MinMaxSumCountAggregator::new(&descriptor);

        for value in [3.0, -1.0, 7.5, 0.5] {
            aggregator.update(MeasurementValue::Float(value), &record);
        }
        aggregator.checkpoint(&descriptor);

        assert_eq!(aggregator.count(), 4);
        assert_eq!(aggregator.sum(), MeasurementValue::Float(10.0));
        assert_eq!(aggregator.min().unwrap(), MeasurementValue::Float(-1.0));
        assert_eq!(aggregator.max().unwrap(), MeasurementValue::Float(7.5));
    }

    #[test]
    fn empty_checkpoint_has_no_extrema() {
        let descriptor = mmsc_descriptor();
        let aggregator = MinMaxSumCountAggregator::new(&descriptor);

        assert!(matches!(aggregator.min(), Err(AggregationError::NoData)));

        aggregator.checkpoint(&descriptor);
        assert!(matches!(aggregator.min(), Err(AggregationError::NoData)));
        assert!(matches!(aggregator.max(), Err(AggregationError::NoData)));
        assert_eq!(aggregator.count(), 0);
    }

    #[test]
    fn merge_widens_envelope() {
        let descriptor = mmsc_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);

        let a = MinMaxSumCountAggregator::new(&descriptor);
        let b = MinMaxSumCountAggregator::new(&descriptor);
        a.update(MeasurementValue::Float(5.0), &record);
        b.update(MeasurementValue::Float(-3.0), &record);
        b.update(MeasurementValue::Float(9.0), &record);
        a.checkpoint(&descriptor);
        b.checkpoint(&descriptor);

        a.merge(&b, &descriptor).unwrap();

        assert_eq!(a.count(), 3);
        assert_eq!(a.min().unwrap(), MeasurementValue::Float(-3.0));
        assert_eq!(a.max().unwrap(), MeasurementValue::Float(9.0));
        assert_eq!(a.sum(), MeasurementValue::Float(11.0));
    }
}
