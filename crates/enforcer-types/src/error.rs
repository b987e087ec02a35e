//! Error types shared across the Enforcer crates.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type EnfResult<T> = Result<T, Error>;

/// Server-supplied error body, surfaced to the user verbatim.
///
/// The management services answer failed requests with an RFC 7807 style
/// document; nothing in the console interprets it beyond display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Problem {
	#[serde(rename = "type", default)]
	pub kind: Box<str>,
	#[serde(default)]
	pub title: Box<str>,
	#[serde(default)]
	pub status: u16,
	#[serde(default)]
	pub detail: Box<str>,
}

impl fmt::Display for Problem {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "status code: {} {} {}", self.status, self.title, self.detail)
	}
}

#[derive(Debug)]
pub enum Error {
	NotFound,
	Unauthorized,
	PermissionDenied,
	ValidationError(String),
	/// The request failed before an HTTP status was obtained.
	Transport(String),
	/// Non-success HTTP status with a server-supplied error body.
	Api(Problem),
	Parse,
	Internal(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::Unauthorized => write!(f, "not authenticated"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Transport(msg) => write!(f, "Exception: {}", msg),
			Error::Api(problem) => write!(f, "{}", problem),
			Error::Parse => write!(f, "parse error"),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
	fn from(_err: serde_json::Error) -> Self {
		Error::Parse
	}
}

/// User-visible failure notice, in the shape the views show it: a short
/// title and the rendered error detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub title: Box<str>,
	pub detail: String,
}

impl Notice {
	pub fn new(title: &str, error: &Error) -> Self {
		Self { title: title.into(), detail: error.to_string() }
	}
}

impl fmt::Display for Notice {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.title, self.detail)
	}
}


// vim: ts=4
