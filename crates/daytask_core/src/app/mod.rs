//! Explicit presentation state driven by discrete actions.

pub mod state;
