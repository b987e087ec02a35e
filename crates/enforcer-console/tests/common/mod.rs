//! Common test utilities and helpers
//!
//! Shared infrastructure for the console integration tests: the in-memory
//! governance adapter, entity builders, and a fully wired console harness.

pub mod adapters;
pub mod fixtures;

#[allow(unused_imports)]
pub use adapters::*;
#[allow(unused_imports)]
pub use fixtures::*;
