//! Domain model for tasks and the signed-in user.
//!
//! # Responsibility
//! - Define the canonical task record used by every layer.
//! - Carry the opaque user identity that scopes remote storage.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Tasks are never deleted by core.

pub mod session;
pub mod task;
