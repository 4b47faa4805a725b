//! Measurement values.

use std::cmp::Ordering;
use std::fmt;

/// The numeric kind of an instrument's measurements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NumericKind {
    /// Signed 64-bit integer measurements.
    Integer,

    /// 64-bit floating-point measurements.
    Float,
}

/// A single measured value, tagged with its numeric kind.
///
/// Values are immutable once constructed (accumulation produces new values). The kind tag always matches the
/// instrument's [`NumericKind`](crate::NumericKind): handing an aggregator a value of the wrong kind is a caller
/// contract violation, not a runtime error this layer checks for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MeasurementValue {
    /// An integer measurement.
    Integer(i64),

    /// A floating-point measurement.
    Float(f64),
}

impl MeasurementValue {
    /// Returns the zero value for the given kind.
    pub fn zero(kind: NumericKind) -> Self {
        match kind {
            NumericKind::Integer => Self::Integer(0),
            NumericKind::Float => Self::Float(0.0),
        }
    }

    /// Returns the numeric kind of this value.
    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Integer(_) => NumericKind::Integer,
            Self::Float(_) => NumericKind::Float,
        }
    }

    /// Coerces this value to an `f64`.
    ///
    /// Exact for integers within f64's exact integer range; approximate beyond it.
    pub fn coerce_to_f64(&self) -> f64 {
        match self {
            Self::Integer(value) => *value as f64,
            Self::Float(value) => *value,
        }
    }

    /// Returns `true` if this value is negative.
    ///
    /// The sign is read from the tagged representation directly, without coercion, so very large integers are never
    /// misjudged through truncation. Negative zero and NaN are not negative.
    pub fn is_negative(&self) -> bool {
        match self {
            Self::Integer(value) => *value < 0,
            Self::Float(value) => *value < 0.0,
        }
    }

    /// Returns `true` if this value is a floating-point NaN.
    pub fn is_nan(&self) -> bool {
        match self {
            Self::Integer(_) => false,
            Self::Float(value) => value.is_nan(),
        }
    }

    /// Adds another value of the same kind into this one.
    ///
    /// Integer accumulation wraps on overflow.
    pub fn add(&mut self, other: Self) {
        debug_assert_eq!(self.kind(), other.kind(), "kind mismatch in accumulation");

        match (self, other) {
            (Self::Integer(value), Self::Integer(other)) => *value = value.wrapping_add(other),
            (Self::Float(value), Self::Float(other)) => *value += other,
            (Self::Integer(value), Self::Float(other)) => *value = value.wrapping_add(other as i64),
            (Self::Float(value), Self::Integer(other)) => *value += other as f64,
        }
    }
}

impl From<i64> for MeasurementValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for MeasurementValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl PartialOrd for MeasurementValue {
    /// Values of different kinds are incomparable; mixing kinds is a caller contract violation.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(value), Self::Integer(other)) => Some(value.cmp(other)),
            (Self::Float(value), Self::Float(other)) => value.partial_cmp(other),
            _ => None,
        }
    }
}

impl fmt::Display for MeasurementValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{}", value),
            Self::Float(value) => write!(f, "{}", value),
        }
    }
}
