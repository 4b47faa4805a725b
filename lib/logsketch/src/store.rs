//! Bin storage with low-end collapsing.

use smallvec::SmallVec;

/// A sketch bin: an index paired with the number of observations that mapped to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Bin {
    /// The bin index.
    k: i32,

    /// The number of observations within the bin.
    n: u64,
}

impl Bin {
    /// Returns the index of the bin.
    pub fn key(&self) -> i32 {
        self.k
    }

    /// Returns the number of observations within the bin.
    pub fn count(&self) -> u64 {
        self.n
    }
}

/// An ordered bin store that collapses its lowest-indexed bins when a bin-count cap is exceeded.
///
/// Bins are kept sorted by index. Whenever admitting a new bin would push the number of populated bins past the
/// configured cap, the two lowest-indexed bins are merged into one: their counts are summed and the surviving bin
/// keeps the higher of the two indices. Collapsing toward the low-magnitude end sacrifices accuracy for the values
/// that matter least to the extreme-low quantiles, and it is deterministic, so two stores built from the same
/// insertion sequence always hold identical bin layouts.
///
/// Collapsing never changes the total count held by the store; it only coarsens where that count sits.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CollapsingLowestStore {
    /// The bins, ordered by index ascending. Every bin holds a non-zero count.
    bins: SmallVec<[Bin; 4]>,

    /// Maximum number of populated bins.
    max_bins: usize,

    /// Total count across all bins.
    count: u64,

    /// Whether any collapse has occurred.
    collapsed: bool,
}

impl CollapsingLowestStore {
    /// Creates an empty `CollapsingLowestStore` holding at most `max_bins` populated bins.
    pub fn new(max_bins: usize) -> Self {
        debug_assert!(max_bins >= 1, "max_bins must be at least 1");
        Self {
            bins: SmallVec::new(),
            max_bins,
            count: 0,
            collapsed: false,
        }
    }

    /// Adds a count to the bin at the given index, collapsing the lowest bins if the cap is exceeded.
    pub fn add(&mut self, key: i32, n: u64) {
        if n == 0 {
            return;
        }

        match self.bins.binary_search_by_key(&key, |bin| bin.k) {
            Ok(idx) => self.bins[idx].n = self.bins[idx].n.saturating_add(n),
            Err(idx) => {
                self.bins.insert(idx, Bin { k: key, n });
                while self.bins.len() > self.max_bins {
                    self.collapse_lowest_pair();
                }
            }
        }

        self.count = self.count.saturating_add(n);
    }

    /// Merges the two lowest-indexed bins, keeping the higher index.
    fn collapse_lowest_pair(&mut self) {
        let lowest = self.bins.remove(0);
        self.bins[0].n = self.bins[0].n.saturating_add(lowest.n);
        self.collapsed = true;
    }

    /// Returns the total count across all bins.
    pub fn total_count(&self) -> u64 {
        self.count
    }

    /// Returns `true` if the store holds no observations.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns `true` if this store has collapsed bins together.
    ///
    /// Once true, the relative-accuracy guarantee no longer holds for values that were folded into a collapsed bin.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Returns the lowest populated bin index, or `None` if the store is empty.
    pub fn min_key(&self) -> Option<i32> {
        self.bins.first().map(|bin| bin.k)
    }

    /// Returns the highest populated bin index, or `None` if the store is empty.
    pub fn max_key(&self) -> Option<i32> {
        self.bins.last().map(|bin| bin.k)
    }

    /// Returns the index of the bin containing the observation at the given rank.
    ///
    /// Ranks are zero-based and ordered by ascending bin index, so rank 0 is in the lowest populated bin. Returns
    /// `None` if the rank is past the last observation.
    pub fn key_at_rank(&self, rank: u64) -> Option<i32> {
        let mut cumulative = 0u64;
        for bin in &self.bins {
            cumulative += bin.n;
            if cumulative > rank {
                return Some(bin.k);
            }
        }

        None
    }

    /// Merges another store into this one, bin-wise, reapplying the collapse rule if the cap is exceeded.
    pub fn merge(&mut self, other: &Self) {
        if other.collapsed {
            self.collapsed = true;
        }

        for bin in &other.bins {
            self.add(bin.k, bin.n);
        }
    }

    /// Clears the store, removing all bins.
    pub fn clear(&mut self) {
        self.bins.clear();
        self.count = 0;
        self.collapsed = false;
    }

    /// Returns the populated bins, ordered by index ascending.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }
}
