//! Cooperative shutdown of a running batch.

pub mod shutdown;
