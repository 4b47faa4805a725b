//! Logarithmic index mapping.

use crate::config::ConfigError;

/// Maps values to bin indices logarithmically.
///
/// For a relative accuracy `alpha` in `(0, 1)`, the mapping derives `gamma = (1 + alpha) / (1 - alpha)` and assigns a
/// positive value `v` the index `ceil(log(v) / log(gamma))`. Successive bins therefore grow geometrically, which is
/// what makes the relative-error guarantee hold at any magnitude: a bin's representative value is never further than
/// `alpha * v` from any `v` that maps into it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct LogarithmicMapping {
    /// Base of the logarithm, determines bin widths.
    gamma: f64,

    /// Precomputed 1/ln(gamma).
    multiplier: f64,

    /// The relative accuracy guarantee.
    relative_accuracy: f64,

    /// Smallest positive value that maps to a usable index.
    min_indexable_value: f64,

    /// Largest positive value that maps to a usable index.
    max_indexable_value: f64,
}

impl LogarithmicMapping {
    /// Creates a new `LogarithmicMapping` with the given relative accuracy.
    ///
    /// # Errors
    ///
    /// If the relative accuracy is not strictly between 0 and 1, an error is returned.
    pub fn new(relative_accuracy: f64) -> Result<Self, ConfigError> {
        if !(relative_accuracy > 0.0 && relative_accuracy < 1.0) {
            return Err(ConfigError::InvalidRelativeAccuracy {
                value: relative_accuracy,
            });
        }

        let gamma = (1.0 + relative_accuracy) / (1.0 - relative_accuracy);
        let multiplier = 1.0 / gamma.ln();

        // The indexable range is bounded below by the smallest positive f64 and on both ends by what fits into an
        // i32 index without overflow.
        let min_indexable_value = f64::MIN_POSITIVE.max(gamma.powf(i32::MIN as f64 + 1.0));
        let max_indexable_value = gamma.powf(i32::MAX as f64 - 1.0).min(f64::MAX / gamma);

        Ok(Self {
            gamma,
            multiplier,
            relative_accuracy,
            min_indexable_value,
            max_indexable_value,
        })
    }

    /// Returns the index of the bin that the given positive value falls into.
    pub fn index(&self, value: f64) -> i32 {
        (value.ln() * self.multiplier).ceil() as i32
    }

    /// Returns the representative value for the given index.
    ///
    /// This is the midpoint of the bin's bounds in log space: `gamma^(index - 1) * (1 + gamma) / 2`.
    pub fn value(&self, index: i32) -> f64 {
        self.lower_bound(index) * (1.0 + self.gamma) / 2.0
    }

    /// Returns the lower bound of the bin at the given index.
    pub fn lower_bound(&self, index: i32) -> f64 {
        self.gamma.powf((index - 1) as f64)
    }

    /// Returns the upper bound of the bin at the given index.
    pub fn upper_bound(&self, index: i32) -> f64 {
        self.gamma.powf(index as f64)
    }

    /// Returns the relative accuracy of this mapping.
    pub fn relative_accuracy(&self) -> f64 {
        self.relative_accuracy
    }

    /// Returns the gamma value (base of the logarithm) of this mapping.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Returns the smallest positive value that can be indexed.
    ///
    /// Values at or below this magnitude are tracked in the sketch's zero bin instead, since the logarithm is
    /// undefined or unstable that close to zero.
    pub fn min_indexable_value(&self) -> f64 {
        self.min_indexable_value
    }

    /// Returns the largest positive value that can be indexed.
    pub fn max_indexable_value(&self) -> f64 {
        self.max_indexable_value
    }
}
