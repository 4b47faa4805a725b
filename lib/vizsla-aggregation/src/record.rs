//! Measurement records.

use std::fmt;

use crate::descriptor::Descriptor;

/// An ordered set of key/value labels identifying one stream of an instrument.
///
/// Label-set management (interning, canonical ordering, eviction) belongs to the external registry; this type only
/// carries the labels across the aggregation boundary for routing and export metadata.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelSet {
    labels: Vec<(String, String)>,
}

impl LabelSet {
    /// Creates a `LabelSet` from key/value pairs.
    pub fn from_labels<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Returns the labels as key/value pairs.
    pub fn labels(&self) -> &[(String, String)] {
        &self.labels
    }

    /// Returns `true` if there are no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (key, value)) in self.labels.iter().enumerate() {
            if idx > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        write!(f, "}}")
    }
}

/// A correlation token binding one measurement (or one collection pass) to its descriptor and label set.
///
/// Records are owned by the calling collection framework and borrowed by the aggregator for the duration of a call;
/// the aggregator never retains or mutates them.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    descriptor: &'a Descriptor,
    labels: &'a LabelSet,
}

impl<'a> Record<'a> {
    /// Creates a new `Record`.
    pub fn new(descriptor: &'a Descriptor, labels: &'a LabelSet) -> Self {
        Self { descriptor, labels }
    }

    /// Returns the instrument descriptor.
    pub fn descriptor(&self) -> &'a Descriptor {
        self.descriptor
    }

    /// Returns the label set.
    pub fn labels(&self) -> &'a LabelSet {
        self.labels
    }
}
