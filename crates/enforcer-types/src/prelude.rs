pub use crate::error::{EnfResult, Error, Notice, Problem};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
