use tracing::info;
use vizsla_aggregation::aggregator::{
    Count as _, CountAggregator, DistributionAggregator, Max as _, Min as _, MinMaxSumCountAggregator, Quantile as _,
    Sum as _, SumAggregator,
};
use vizsla_aggregation::{Aggregator, Exporter, MeasurementValue, Record};

/// An exporter that renders each checkpoint as a structured log line.
pub struct ConsoleExporter {
    quantiles: Vec<f64>,
}

impl ConsoleExporter {
    /// Creates a new `ConsoleExporter` reporting the given quantiles for distribution checkpoints.
    pub fn new(quantiles: Vec<f64>) -> Self {
        Self { quantiles }
    }
}

fn fmt_value(value: Result<MeasurementValue, vizsla_aggregation::AggregationError>) -> String {
    value.map_or_else(|_| "n/a".to_string(), |value| value.to_string())
}

impl Exporter for ConsoleExporter {
    fn export(&mut self, record: &Record<'_>, snapshot: &dyn Aggregator) {
        let instrument = record.descriptor().name();
        let labels = record.labels();

        if let Some(distribution) = snapshot.as_any().downcast_ref::<DistributionAggregator>() {
            let quantiles = self
                .quantiles
                .iter()
                .map(|q| format!("p{:02.0}={}", q * 100.0, fmt_value(distribution.quantile(*q))))
                .collect::<Vec<_>>()
                .join(" ");
            info!(
                instrument,
                labels = %labels,
                count = distribution.count(),
                sum = %distribution.sum(),
                min = %fmt_value(distribution.min()),
                max = %fmt_value(distribution.max()),
                %quantiles,
                "distribution checkpoint",
            );
        } else if let Some(mmsc) = snapshot.as_any().downcast_ref::<MinMaxSumCountAggregator>() {
            info!(
                instrument,
                labels = %labels,
                count = mmsc.count(),
                sum = %mmsc.sum(),
                min = %fmt_value(mmsc.min()),
                max = %fmt_value(mmsc.max()),
                "minmaxsumcount checkpoint",
            );
        } else if let Some(sum) = snapshot.as_any().downcast_ref::<SumAggregator>() {
            info!(instrument, labels = %labels, sum = %sum.sum(), "sum checkpoint");
        } else if let Some(count) = snapshot.as_any().downcast_ref::<CountAggregator>() {
            info!(instrument, labels = %labels, count = count.count(), "count checkpoint");
        } else {
            info!(instrument, labels = %labels, kind = snapshot.kind(), "checkpoint");
        }
    }
}
