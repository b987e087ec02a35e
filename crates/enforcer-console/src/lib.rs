//! View controllers for the Enforcer governance console.
//!
//! One controller per grid. Each consumes upstream selection events from
//! the hub to reset and reload its own data, and produces its own selection
//! event when the user picks a row, cascading to the dependent views. The
//! artifact usage controller additionally resolves which projects hold
//! permission for the focused LIMITED artifact and drives grant/revoke.

pub mod artifact;
pub mod build;
pub mod console;
pub mod permitted;
pub mod project;
pub mod usage;

pub use console::Console;

// vim: ts=4
