//! The exporter boundary.

use crate::aggregator::Aggregator;
use crate::record::Record;

/// Consumer of completed checkpoints.
///
/// An exporter is invoked once per non-empty checkpoint per collection interval. The snapshot is read-only: the
/// exporter reads it through the capability traits (downcasting via [`Aggregator::as_any`]) and must not retain it
/// past the call, since the driver may recycle aggregator instances between intervals.
pub trait Exporter {
    /// Exports one checkpointed aggregator for the given record.
    fn export(&mut self, record: &Record<'_>, snapshot: &dyn Aggregator);
}

/// Runs one collection pass over an aggregator: checkpoint, then export.
///
/// The checkpoint swap happens first, atomically with respect to concurrent updates; the exporter is then invoked
/// outside of any lock, and only when the fresh checkpoint actually holds data.
pub fn collect(aggregator: &dyn Aggregator, record: &Record<'_>, exporter: &mut dyn Exporter) {
    aggregator.checkpoint(record.descriptor());

    if aggregator.checkpoint_count() != 0 {
        exporter.export(record, aggregator);
    }
}

#[cfg(test)]
mod tests {
    use logsketch::SketchConfig;

    use super::*;
    use crate::aggregator::new_aggregator;
    use crate::descriptor::{AggregationKind, Descriptor};
    use crate::record::LabelSet;
    use crate::value::{MeasurementValue, NumericKind};

    #[derive(Default)]
    struct RecordingExporter {
        exports: Vec<(String, u64)>,
    }

    impl Exporter for RecordingExporter {
        fn export(&mut self, record: &Record<'_>, snapshot: &dyn Aggregator) {
            self.exports
                .push((record.descriptor().name().to_string(), snapshot.checkpoint_count()));
        }
    }

    #[test]
    fn empty_checkpoints_are_skipped() {
        let descriptor = Descriptor::new("request.latency", NumericKind::Float, AggregationKind::Distribution);
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = new_aggregator(&descriptor, &SketchConfig::default());
        let mut exporter = RecordingExporter::default();

        collect(aggregator.as_ref(), &record, &mut exporter);
        assert!(exporter.exports.is_empty());

        aggregator.update(MeasurementValue::Float(1.25), &record);
        collect(aggregator.as_ref(), &record, &mut exporter);

        assert_eq!(exporter.exports, vec![("request.latency".to_string(), 1)]);
    }
}
