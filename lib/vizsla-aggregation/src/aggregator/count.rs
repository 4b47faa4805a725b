//! Count aggregator.

use std::any::Any;
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;

use super::{default_warning_handler, range_test, Aggregator, Count, WarningHandler};
use crate::descriptor::Descriptor;
use crate::error::AggregationError;
use crate::record::Record;
use crate::value::MeasurementValue;

/// An aggregator tallying how many measurements arrived in the interval.
pub struct CountAggregator {
    current: Mutex<u64>,
    checkpoint: ArcSwapOption<u64>,
    warnings: WarningHandler,
}

impl CountAggregator {
    /// Creates a new `CountAggregator`.
    pub fn new() -> Self {
        Self {
            current: Mutex::new(0),
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

impl Aggregator for CountAggregator {
    fn kind(&self) -> &'static str {
        "count"
    }

    fn update(&self, value: MeasurementValue, record: &Record<'_>) {
        if let Err(warning) = range_test(value, record.descriptor()) {
            (self.warnings)(&warning);
            return;
        }

        let mut current = self.current.lock().unwrap();
        *current += 1;
    }

    fn checkpoint(&self, _descriptor: &Descriptor) {
        let frozen = {
            let mut current = self.current.lock().unwrap();
            mem::replace(&mut *current, 0)
        };

        self.checkpoint.store(Some(Arc::new(frozen)));
    }

    fn checkpoint_count(&self) -> u64 {
        self.checkpoint.load().as_ref().map_or(0, |count| **count)
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

        let merged = self.checkpoint.swap(None).map_or(*other_checkpoint, |previous| {
            *previous + *other_checkpoint
        });

        self.checkpoint.store(Some(Arc::new(merged)));

        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Count for CountAggregator {
    fn count(&self) -> u64 {
        self.checkpoint_count()
    }
}

impl fmt::Debug for CountAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountAggregator").finish_non_exhaustive()
    }
}
