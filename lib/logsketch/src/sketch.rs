//! The two-sided quantile sketch.

use float_cmp::ApproxEqRatio as _;

use crate::config::SketchConfig;
use crate::mapping::LogarithmicMapping;
use crate::store::CollapsingLowestStore;

/// Ratio-based approximate equality for the exact statistics, tolerant of differing accumulation order.
fn float_eq(l_value: f64, r_value: f64) -> bool {
    const RATIO_ERROR: f64 = 0.00000001;

    l_value == r_value || (l_value.is_nan() && r_value.is_nan()) || l_value.approx_eq_ratio(&r_value, RATIO_ERROR)
}

/// A mergeable quantile sketch with a bounded relative-error guarantee and bounded memory.
///
/// Positive and negative magnitudes are tracked in two independent [`CollapsingLowestStore`]s, with values too close
/// to zero to index (and zero itself) counted in a dedicated zero bin. On top of the binned distribution, the sketch
/// keeps an exact running sum, so `sum()` and the mean are exact even though quantiles are approximate.
///
/// # Example
///
/// ```
/// use logsketch::{Sketch, SketchConfig};
///
/// let config = SketchConfig::new(0.01, 2048).unwrap();
/// let mut sketch = Sketch::new(&config);
/// sketch.add(1.0);
/// sketch.add(2.0);
/// sketch.add(3.0);
///
/// let median = sketch.quantile(0.5).unwrap();
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Sketch {
    /// The index mapping for this sketch.
    mapping: LogarithmicMapping,

    /// Store for positive-magnitude values.
    positive: CollapsingLowestStore,

    /// Store for negative-magnitude values.
    negative: CollapsingLowestStore,

    /// Count of values that map to zero.
    zero_count: u64,

    /// Exact sum of all values added to the sketch.
    sum: f64,
}

impl Sketch {
    /// Creates an empty `Sketch` with the given configuration.
    pub fn new(config: &SketchConfig) -> Self {
        Self {
            mapping: config.mapping().clone(),
            positive: CollapsingLowestStore::new(config.max_bins()),
            negative: CollapsingLowestStore::new(config.max_bins()),
            zero_count: 0,
            sum: 0.0,
        }
    }

    /// Adds a single value to the sketch.
    ///
    /// NaN values are ignored.
    pub fn add(&mut self, value: f64) {
        self.add_n(value, 1);
    }

    /// Adds a value to the sketch with the given count.
    ///
    /// NaN values are ignored.
    pub fn add_n(&mut self, value: f64, n: u64) {
        if n == 0 || value.is_nan() {
            return;
        }

        if value > self.mapping.min_indexable_value() {
            self.positive.add(self.mapping.index(value), n);
        } else if value < -self.mapping.min_indexable_value() {
            self.negative.add(self.mapping.index(-value), n);
        } else {
            self.zero_count += n;
        }

        self.sum += value * n as f64;
    }

    /// Returns the approximate value at the given quantile.
    ///
    /// The target rank is `ceil(q * count)`, clamped to the first observation, and the estimate is the representative
    /// value of the bin holding that rank when walking the distribution from the most negative value upward.
    ///
    /// Returns `None` if the sketch is empty or `q` is outside of `[0, 1]` (including NaN).
    pub fn quantile(&self, q: f64) -> Option<f64> {
        let count = self.count();
        if count == 0 || !(0.0..=1.0).contains(&q) {
            return None;
        }

        let target = ((q * count as f64).ceil() as u64).max(1);
        let rank = target - 1;

        let negative_count = self.negative.total_count();
        let non_positive_count = negative_count + self.zero_count;

        if rank < negative_count {
            // Negative values sort ascending by descending magnitude, so the rank is reversed against the magnitude
            // store's ascending-index walk.
            let reverse_rank = negative_count - rank - 1;
            self.negative.key_at_rank(reverse_rank).map(|key| -self.mapping.value(key))
        } else if rank < non_positive_count {
            Some(0.0)
        } else {
            self.positive
                .key_at_rank(rank - non_positive_count)
                .map(|key| self.mapping.value(key))
        }
    }

    /// Returns the approximate minimum value, read directly from the lowest populated bin.
    ///
    /// Returns `None` if the sketch is empty.
    pub fn min(&self) -> Option<f64> {
        if !self.negative.is_empty() {
            self.negative.max_key().map(|key| -self.mapping.value(key))
        } else if self.zero_count > 0 {
            Some(0.0)
        } else {
            self.positive.min_key().map(|key| self.mapping.value(key))
        }
    }

    /// Returns the approximate maximum value, read directly from the highest populated bin.
    ///
    /// Returns `None` if the sketch is empty.
    pub fn max(&self) -> Option<f64> {
        if !self.positive.is_empty() {
            self.positive.max_key().map(|key| self.mapping.value(key))
        } else if self.zero_count > 0 {
            Some(0.0)
        } else {
            self.negative.min_key().map(|key| -self.mapping.value(key))
        }
    }

    /// Returns the exact sum of all values added to the sketch.
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Returns the total number of values added to the sketch.
    pub fn count(&self) -> u64 {
        self.negative.total_count() + self.positive.total_count() + self.zero_count
    }

    /// Returns `true` if the sketch is empty.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the count of values that mapped to zero.
    pub fn zero_count(&self) -> u64 {
        self.zero_count
    }

    /// Returns the number of populated bins across both stores.
    pub fn bin_count(&self) -> usize {
        self.positive.bins().len() + self.negative.bins().len()
    }

    /// Returns `true` if either store has had to collapse bins together.
    ///
    /// Once true, the relative-accuracy guarantee no longer holds for the specific values that were folded into a
    /// collapsed bin; the sum and count remain exact.
    pub fn is_collapsed(&self) -> bool {
        self.positive.is_collapsed() || self.negative.is_collapsed()
    }

    /// Returns the relative accuracy of this sketch.
    pub fn relative_accuracy(&self) -> f64 {
        self.mapping.relative_accuracy()
    }

    /// Returns a reference to the index mapping.
    pub fn mapping(&self) -> &LogarithmicMapping {
        &self.mapping
    }

    /// Merges another sketch into this one.
    ///
    /// Bin counts are added bin-wise, with the low-end collapse rule reapplied if the combined bin set exceeds the
    /// cap; the sum and count combine exactly. Both sketches must have been built with an identical configuration.
    pub fn merge(&mut self, other: &Self) {
        debug_assert!(
            float_eq(self.mapping.gamma(), other.mapping.gamma()),
            "merged sketches must share a configuration"
        );

        self.positive.merge(&other.positive);
        self.negative.merge(&other.negative);
        self.zero_count += other.zero_count;
        self.sum += other.sum;
    }

    /// Clears the sketch, removing all values.
    pub fn clear(&mut self) {
        self.positive.clear();
        self.negative.clear();
        self.zero_count = 0;
        self.sum = 0.0;
    }
}

impl Default for Sketch {
    fn default() -> Self {
        Self::new(&SketchConfig::default())
    }
}

impl PartialEq for Sketch {
    fn eq(&self, other: &Self) -> bool {
        self.mapping == other.mapping
            && self.positive == other.positive
            && self.negative == other.negative
            && self.zero_count == other.zero_count
            && float_eq(self.sum, other.sum)
    }
}
