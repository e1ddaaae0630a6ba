//! Helpers shared by the unit and integration tests of the moderation state rebuild.
//!
//! [`entity`] builds entities, workflows and records, [`faults`] injects store failures and
//! [`database`] spawns throwaway Postgres databases with the migrations applied.
#[cfg(feature = "test-utils")]
pub mod database;
pub mod entity;
pub mod faults;
