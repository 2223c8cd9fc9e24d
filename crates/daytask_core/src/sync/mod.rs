//! Offline/online reconciliation between the local and remote task stores.
//!
//! # Responsibility
//! - Track connectivity and react to transitions.
//! - Merge, replay and persist task sets in serialized passes.
//! - Tell the user about connectivity and pending uploads.

pub mod connectivity;
pub mod engine;
pub mod merge;
pub mod notify;
pub mod runtime;
