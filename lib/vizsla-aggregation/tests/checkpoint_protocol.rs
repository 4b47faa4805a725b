//! End-to-end tests of the aggregator checkpoint protocol through the public trait surface.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use logsketch::SketchConfig;
use ordered_float::OrderedFloat;
use proptest::collection::vec as arb_vec;
use proptest::prelude::*;
use vizsla_aggregation::aggregator::{Count as _, Distribution, DistributionAggregator, Quantile as _, Sum as _};
use vizsla_aggregation::{
    AggregationError, AggregationKind, Aggregator, Descriptor, LabelSet, MeasurementValue, NumericKind, Record,
};

fn latency_descriptor() -> Descriptor {
    Descriptor::new("request.latency", NumericKind::Float, AggregationKind::Distribution)
}

fn float_of(value: MeasurementValue) -> f64 {
    match value {
        MeasurementValue::Float(value) => value,
        other => panic!("expected a float measurement, got {:?}", other),
    }
}

#[test]
fn median_scenario() {
    let descriptor = latency_descriptor();
    let labels = LabelSet::default();
    let record = Record::new(&descriptor, &labels);
    let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

    for i in 1..=100 {
        aggregator.update(MeasurementValue::Float(i as f64), &record);
    }
    aggregator.checkpoint(&descriptor);

    assert_eq!(aggregator.count(), 100);
    assert_eq!(float_of(aggregator.sum()), 5050.0);

    let median = float_of(aggregator.quantile(0.5).unwrap());
    assert!((49.5..=50.5).contains(&median), "median {} outside [49.5, 50.5]", median);
}

#[test]
fn empty_state() {
    let descriptor = latency_descriptor();
    let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

    assert_eq!(aggregator.count(), 0);
    assert!(matches!(
        aggregator.quantile(0.5),
        Err(AggregationError::InvalidQuantile { .. })
    ));

    // A checkpoint with no updates behaves the same.
    aggregator.checkpoint(&descriptor);
    assert_eq!(aggregator.count(), 0);
    assert!(matches!(
        aggregator.quantile(0.5),
        Err(AggregationError::InvalidQuantile { .. })
    ));
}

#[test]
fn rejected_negative_fires_warning_exactly_once() {
    let descriptor = latency_descriptor();
    let labels = LabelSet::default();
    let record = Record::new(&descriptor, &labels);

    let warnings = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&warnings);
    let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor)
        .unwrap()
        .with_warning_handler(Arc::new(move |_| {
            observed.fetch_add(1, Ordering::Relaxed);
        }));

    aggregator.update(MeasurementValue::Float(-1.0), &record);
    aggregator.checkpoint(&descriptor);

    assert_eq!(aggregator.count(), 0);
    assert_eq!(warnings.load(Ordering::Relaxed), 1);
}

#[test]
fn zero_alpha_is_config_invalid() {
    let descriptor = latency_descriptor();
    let result = DistributionAggregator::from_accuracy(0.0, 2048, &descriptor);
    assert!(matches!(result, Err(AggregationError::ConfigInvalid { .. })));
}

#[test]
fn checkpoint_isolation() {
    let descriptor = latency_descriptor();
    let labels = LabelSet::default();
    let record = Record::new(&descriptor, &labels);
    let aggregator = DistributionAggregator::from_accuracy(0.01, 2048, &descriptor).unwrap();

    aggregator.update(MeasurementValue::Float(10.0), &record);
    aggregator.checkpoint(&descriptor);
    let snapshot = aggregator.checkpointed().unwrap();

    for i in 0..100 {
        aggregator.update(MeasurementValue::Float(i as f64), &record);
    }

    // Neither the held snapshot nor the accessors see updates issued after the swap.
    assert_eq!(snapshot.count(), 1);
    assert_eq!(snapshot.sum(), 10.0);
    assert_eq!(aggregator.count(), 1);
    assert_eq!(float_of(aggregator.sum()), 10.0);
}

#[test]
fn exporter_side_capability_access() {
    let descriptor = latency_descriptor();
    let labels = LabelSet::default();
    let record = Record::new(&descriptor, &labels);

    let aggregator: Box<dyn Aggregator> =
        vizsla_aggregation::new_aggregator(&descriptor, &SketchConfig::default());
    for i in 1..=10 {
        aggregator.update(MeasurementValue::Float(i as f64), &record);
    }
    aggregator.checkpoint(&descriptor);

    // The exporter reaches quantiles by downcasting the opaque snapshot to the distribution bundle.
    let distribution = aggregator
        .as_any()
        .downcast_ref::<DistributionAggregator>()
        .map(|concrete| concrete as &dyn Distribution)
        .expect("distribution instrument must yield a distribution aggregator");

    assert_eq!(distribution.count(), 10);
    let p99 = float_of(distribution.quantile(0.99).unwrap());
    assert!((p99 - 10.0).abs() <= 0.2, "p99 {} too far from 10.0", p99);
}

proptest! {
    #[test]
    fn property_merge_exactness(
        left in arb_vec(0.001f64..1e6f64, 0..200),
        right in arb_vec(0.001f64..1e6f64, 0..200),
    ) {
        let descriptor = latency_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);

        let a = DistributionAggregator::from_accuracy(0.01, 64, &descriptor).unwrap();
        let b = DistributionAggregator::from_accuracy(0.01, 64, &descriptor).unwrap();
        for value in &left {
            a.update(MeasurementValue::Float(*value), &record);
        }
        for value in &right {
            b.update(MeasurementValue::Float(*value), &record);
        }
        a.checkpoint(&descriptor);
        b.checkpoint(&descriptor);

        let expected_sum = float_of(a.sum()) + float_of(b.sum());
        a.merge(&b, &descriptor).unwrap();

        prop_assert_eq!(a.count(), (left.len() + right.len()) as u64);
        prop_assert_eq!(float_of(a.sum()), expected_sum);
    }

    #[test]
    fn property_quantiles_within_relative_error(values in arb_vec(0.001f64..1e6f64, 1..150)) {
        let relative_accuracy = 0.01;
        let descriptor = latency_descriptor();
        let labels = LabelSet::default();
        let record = Record::new(&descriptor, &labels);
        let aggregator = DistributionAggregator::from_accuracy(relative_accuracy, 4096, &descriptor).unwrap();

        for value in &values {
            aggregator.update(MeasurementValue::Float(*value), &record);
        }
        aggregator.checkpoint(&descriptor);

        let mut sorted = values.clone();
        sorted.sort_by_key(|value| OrderedFloat(*value));

        let max_ratio = relative_accuracy / (1.0 - relative_accuracy);
        let n = sorted.len() as f64;
        for (i, value) in sorted.iter().enumerate() {
            let q = (i as f64 + 0.5) / n;
            let estimate = float_of(aggregator.quantile(q).unwrap());
            prop_assert!(
                (estimate - value).abs() <= max_ratio * value,
                "rank {}: estimate {} for value {}", i, estimate, value
            );
        }
    }
}
