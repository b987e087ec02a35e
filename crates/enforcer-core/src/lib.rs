//! Core infrastructure for the Enforcer console.
//!
//! The pieces every view controller builds on: the process-wide event hub,
//! the single-selection discipline, the list state machine with its cascade
//! fetch engine, and the authenticated session.

pub mod cascade;
pub mod hub;
pub mod selection;
pub mod session;
pub mod state;

// vim: ts=4
