//! Read-only presentation projections over the merged task set.
//!
//! Nothing here touches storage; every function is a pure derivation.

pub mod format;
pub mod grouping;
