use std::thread;
use std::time::Instant;

use logsketch::SketchConfig;
use rand::rngs::SmallRng;
use rand::SeedableRng as _;
use rand_distr::{Distribution as _, Pareto};
use tracing::{debug, info};
use vizsla_aggregation::{
    collect, AggregationKind, Aggregator, Descriptor, LabelSet, MeasurementValue, NumericKind, Record,
};
use vizsla_error::{generic_error, ErrorContext as _, GenericError};

use crate::config::Config;
use crate::exporter::ConsoleExporter;

/// One registered instrument stream: descriptor, label set, and its aggregator.
struct Instrument {
    descriptor: Descriptor,
    labels: LabelSet,
    aggregator: Box<dyn Aggregator>,
}

impl Instrument {
    fn new(descriptor: Descriptor, labels: LabelSet, sketch_config: &SketchConfig) -> Self {
        let aggregator = vizsla_aggregation::new_aggregator(&descriptor, sketch_config);
        Self {
            descriptor,
            labels,
            aggregator,
        }
    }

    fn record(&self) -> Record<'_> {
        Record::new(&self.descriptor, &self.labels)
    }
}

/// Workload driver.
///
/// Owns a small instrument registry and runs the collection loop: per interval, scoped producer threads record
/// measurements concurrently, then every instrument is checkpointed and flushed to the exporter.
pub struct Driver {
    config: Config,
    sketch_config: SketchConfig,
}

impl Driver {
    /// Creates a new `Driver` based on the given configuration.
    ///
    /// # Errors
    ///
    /// If the sketch configuration or workload shape is invalid, an error is returned.
    pub fn new(config: Config) -> Result<Self, GenericError> {
        if config.producers == 0 {
            return Err(generic_error!("at least one producer is required"));
        }

        if config.values_per_interval == 0 {
            return Err(generic_error!("producers must record at least one value per interval"));
        }

        let sketch_config = SketchConfig::new(config.relative_accuracy, config.max_bins)
            .error_context("Invalid sketch configuration.")?;

        Ok(Self { config, sketch_config })
    }

    /// Runs the collection loop to completion.
    ///
    /// # Errors
    ///
    /// If a producer thread panics, an error is returned.
    pub fn run(self) -> Result<(), GenericError> {
        let labels = LabelSet::from_labels([("service", "demo-api"), ("env", "synthetic")]);

        let latency = Instrument::new(
            Descriptor::new("request.latency", NumericKind::Float, AggregationKind::Distribution),
            labels.clone(),
            &self.sketch_config,
        );
        let payload_size = Instrument::new(
            Descriptor::new("request.payload_size", NumericKind::Integer, AggregationKind::MinMaxSumCount),
            labels.clone(),
            &self.sketch_config,
        );
        let errors = Instrument::new(
            Descriptor::new("request.errors", NumericKind::Integer, AggregationKind::Count),
            labels,
            &self.sketch_config,
        );
        let instruments = [&latency, &payload_size, &errors];

        let mut exporter = ConsoleExporter::new(vec![0.5, 0.9, 0.99]);
        let values_per_interval = self.config.values_per_interval;

        for interval in 0..self.config.intervals {
            let started = Instant::now();

            thread::scope(|s| {
                for producer in 0..self.config.producers {
                    let seed = self.config.seed ^ ((interval as u64) << 32) ^ producer as u64;
                    let latency = &latency;
                    let payload_size = &payload_size;
                    let errors = &errors;
                    s.spawn(move || {
                        produce(seed, values_per_interval, latency, payload_size, errors);
                    });
                }
            });

            debug!(
                interval,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "interval complete, flushing checkpoints"
            );

            for instrument in instruments {
                collect(instrument.aggregator.as_ref(), &instrument.record(), &mut exporter);
            }
        }

        info!(intervals = self.config.intervals, "workload complete.");

        Ok(())
    }
}

/// Records one producer's worth of synthetic measurements for a single interval.
fn produce(seed: u64, values: usize, latency: &Instrument, payload_size: &Instrument, errors: &Instrument) {
    // Latencies shaped like a typical web service, in microseconds: a big hump at the low end with a long tail,
    // bounded to [15ms, 10s].
    let distribution = Pareto::new(1.0, 1.0).expect("pareto distribution should be valid");
    let mut rng = SmallRng::seed_from_u64(seed);

    let latency_record = latency.record();
    let payload_record = payload_size.record();
    let errors_record = errors.record();

    let mut recorded = 0;
    for sample in distribution.sample_iter(&mut rng) {
        let micros = sample * 10_000.0;
        if !(15_000.0..10_000_000.0).contains(&micros) {
            continue;
        }

        latency.aggregator.update(MeasurementValue::Float(micros), &latency_record);

        let bytes = 200 + (micros as i64 % 32_000);
        payload_size
            .aggregator
            .update(MeasurementValue::Integer(bytes), &payload_record);

        // Slow requests double as the synthetic error condition.
        if micros > 5_000_000.0 {
            errors.aggregator.update(MeasurementValue::Integer(1), &errors_record);
        }

        recorded += 1;
        if recorded == values {
            break;
        }
    }
}
