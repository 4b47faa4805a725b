//! Sum aggregator.

use std::any::Any;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;

use super::{default_warning_handler, range_test, Aggregator, Count, Sum, WarningHandler};
use crate::descriptor::Descriptor;
use crate::error::AggregationError;
use crate::record::Record;
use crate::value::{MeasurementValue, NumericKind};

#[derive(Clone, Copy, Debug)]
struct SumState {
    sum: MeasurementValue,
    count: u64,
}

impl SumState {
    fn empty(kind: NumericKind) -> Self {
        Self {
            sum: MeasurementValue::zero(kind),
            count: 0,
        }
    }
}

/// An aggregator maintaining a kind-matched running total of all measurements.
///
/// The number of accumulated updates is tracked alongside the total so that empty checkpoints can be recognized and
/// skipped at export time.
pub struct SumAggregator {
    numeric_kind: NumericKind,
    current: Mutex<SumState>,
    checkpoint: ArcSwapOption<SumState>,
    warnings: WarningHandler,
}

impl SumAggregator {
    /// Creates a new `SumAggregator` for the given instrument.
    pub fn new(descriptor: &Descriptor) -> Self {
        Self {
            numeric_kind: descriptor.numeric_kind(),
            current: Mutex::new(SumState::empty(descriptor.numeric_kind())),
            checkpoint: ArcSwapOption::empty(),
            warnings: default_warning_handler(),
        }
    }

    /// Sets the handler invoked when a measurement is rejected by instrument policy.
    pub fn with_warning_handler(mut self, warnings: WarningHandler) -> Self {
        self.warnings = warnings;
        self
    }
}

impl Aggregator for SumAggregator {
    fn kind(&self) -> &'static str {
        "sum"
    }

    fn update(&self, value: MeasurementValue, record: &Record<'_>) {
        if let Err(warning) = range_test(value, record.descriptor()) {
            (self.warnings)(&warning);
            return;
        }

        let mut current = self.current.lock().unwrap();
        current.sum.add(value);
        current.count += 1;
    }

    fn checkpoint(&self, _descriptor: &Descriptor) {
        let frozen = {
            let mut current = self.current.lock().unwrap();
            mem::replace(&mut *current, SumState::empty(self.numeric_kind))
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
                merged.sum.add(other_checkpoint.sum);
                merged.count += other_checkpoint.count;
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

impl Sum for SumAggregator {
    fn sum(&self) -> MeasurementValue {
        self.checkpoint
            .load()
            .as_ref()
            .map_or(MeasurementValue::zero(self.numeric_kind), |state| state.sum)
    }
}

impl Count for SumAggregator {
    fn count(&self) -> u64 {
        self.checkpoint_count()
    }
}

impl fmt::Debug for SumAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SumAggregator")
            .field("numeric_kind", &self.numeric_kind)
            .finish_non_exhaustive()
    }
}
