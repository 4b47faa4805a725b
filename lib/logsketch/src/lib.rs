//! An approximate, mergeable quantile sketch with a bounded relative-error guarantee and bounded memory.
//!
//! Values are bucketed into logarithmically-sized bins so that every bin spans a fixed *relative* width: for a
//! configured relative accuracy `alpha`, any value can be reconstructed from its bin to within `alpha * |value|`.
//! Memory stays bounded by capping the number of populated bins and collapsing the lowest-magnitude bins together
//! once the cap is hit, trading accuracy at the low extreme for a hard memory ceiling.
//!
//! The sum and count of inserted values are tracked exactly, independent of any bin collapsing: only quantile
//! estimates are approximate.
#![deny(warnings)]
#![deny(missing_docs)]

mod config;
pub use self::config::{ConfigError, SketchConfig};

mod mapping;
pub use self::mapping::LogarithmicMapping;

mod store;
pub use self::store::{Bin, CollapsingLowestStore};

mod sketch;
pub use self::sketch::Sketch;
