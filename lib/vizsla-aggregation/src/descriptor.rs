//! Instrument descriptors.

use crate::value::NumericKind;

/// The aggregation applied to an instrument's measurements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregationKind {
    /// Running total of all measurements.
    Sum,

    /// Count of measurements.
    Count,

    /// Exact minimum, maximum, sum, and count.
    MinMaxSumCount,

    /// Quantile-sketch distribution summary with exact sum and count.
    Distribution,
}

/// Static metadata describing an instrument.
///
/// A descriptor is created once when an instrument is registered and shared, read-only, across every aggregator
/// instance created for that instrument (one per distinct label set). The external registry typically wraps it in an
/// `Arc`.
#[derive(Clone, Debug)]
pub struct Descriptor {
    name: String,
    numeric_kind: NumericKind,
    allow_negative: bool,
    aggregation_kind: AggregationKind,
}

impl Descriptor {
    /// Creates a new `Descriptor`.
    ///
    /// Negative measurements are rejected by default; see [`with_allow_negative`](Self::with_allow_negative).
    pub fn new<S>(name: S, numeric_kind: NumericKind, aggregation_kind: AggregationKind) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            numeric_kind,
            allow_negative: false,
            aggregation_kind,
        }
    }

    /// Sets whether negative measurements are permitted for this instrument.
    pub fn with_allow_negative(mut self, allow_negative: bool) -> Self {
        self.allow_negative = allow_negative;
        self
    }

    /// Returns the instrument name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the numeric kind of the instrument's measurements.
    pub fn numeric_kind(&self) -> NumericKind {
        self.numeric_kind
    }

    /// Returns `true` if negative measurements are permitted.
    pub fn allow_negative(&self) -> bool {
        self.allow_negative
    }

    /// Returns the aggregation applied to this instrument.
    pub fn aggregation_kind(&self) -> AggregationKind {
        self.aggregation_kind
    }
}
