//! Shared types, the governance adapter trait, and error types for the
//! Enforcer artifact governance console.
//!
//! This crate contains the foundational types shared between the console
//! crates and the adapter implementations. Extracting these into a separate
//! crate allows adapter crates to compile in parallel with the console's
//! view controllers.

pub mod error;
pub mod governance_adapter;
pub mod model;
pub mod prelude;

// vim: ts=4
