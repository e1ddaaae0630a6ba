//! Store abstractions used by the moderation state rebuild.
//!
//! - [`entity`] reads the content entities being reconciled
//! - [`moderation`] reads and writes moderation state records
//! - [`checkpoint`] persists the batch context between chunks
//!
//! The [`both`] module provides implementations backing entities and moderation state records
//! with a single system, in memory or in Postgres.

pub mod both;
pub mod checkpoint;
pub mod entity;
pub mod moderation;
