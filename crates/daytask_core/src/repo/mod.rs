//! Local persistence contracts and the SQLite implementation.
//!
//! # Responsibility
//! - Define the on-device task store contract used by the sync engine.
//! - Keep SQL details out of sync and presentation code.
//!
//! # Invariants
//! - Writes validate the task before touching storage.
//! - Reads reject corrupted rows instead of masking them.

pub mod task_repo;
