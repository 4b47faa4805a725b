//! In-process metrics aggregation.
//!
//! This crate is the aggregation engine at the heart of the SDK: measurements arrive tagged with an instrument
//! [`Descriptor`] and a label set, accumulate per distinct (instrument, label-set) pair in an [`Aggregator`], and get
//! frozen into immutable checkpoints at collection-interval boundaries for hand-off to an exporter.
//!
//! Producers may call [`Aggregator::update`] concurrently without coordination; a single collection driver calls
//! [`Aggregator::checkpoint`] (or the [`collect`] helper) at interval boundaries. Each update lands entirely in the
//! accumulation state either before or after any given checkpoint swap, never split across it, and a published
//! checkpoint is never touched by later updates.
//!
//! Four aggregator kinds implement the protocol: running sums, update counts, exact min/max/sum/count summaries, and
//! quantile-sketch distributions with exact sum/count and approximate, bounded-relative-error quantiles.
#![deny(warnings)]
#![deny(missing_docs)]

mod value;
pub use self::value::{MeasurementValue, NumericKind};

mod descriptor;
pub use self::descriptor::{AggregationKind, Descriptor};

mod record;
pub use self::record::{LabelSet, Record};

mod error;
pub use self::error::AggregationError;

pub mod aggregator;
pub use self::aggregator::{default_warning_handler, new_aggregator, Aggregator, WarningHandler};

mod export;
pub use self::export::{collect, Exporter};
