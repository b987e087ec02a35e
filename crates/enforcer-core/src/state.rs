//! Shared list-view state for cascade controllers.

use enforcer_types::error::Notice;

use crate::selection::{Keyed, Selection};

/// Lifecycle of one grid's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
	/// No data; either never loaded, reset by an upstream change, or
	/// degraded by a failed fetch.
	Empty,
	/// A fetch for the current parent is in flight.
	Loading,
	/// The last fetch completed; `rows` reflect it.
	Loaded,
}

#[derive(Debug)]
pub struct ListState<T: Keyed> {
	pub phase: LoadPhase,
	pub rows: Vec<T>,
	pub selection: Selection<T>,
	pub last_error: Option<Notice>,
}

impl<T: Keyed> Default for ListState<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Keyed> ListState<T> {
	pub fn new() -> Self {
		Self {
			phase: LoadPhase::Empty,
			rows: Vec::new(),
			selection: Selection::new(),
			last_error: None,
		}
	}

	/// Drop rows and focus before a new fetch. A stale child row must
	/// never outlive its parent selection.
	pub fn reset(&mut self) {
		self.phase = LoadPhase::Empty;
		self.rows.clear();
		self.selection.clear();
	}

	pub fn begin_loading(&mut self) {
		self.phase = LoadPhase::Loading;
	}

	pub fn loaded(&mut self, rows: Vec<T>) {
		self.rows = rows;
		self.phase = LoadPhase::Loaded;
		self.last_error = None;
	}

	/// Failed fetch: degrade to `Empty` and keep the user-visible notice.
	pub fn failed(&mut self, notice: Notice) {
		self.reset();
		self.last_error = Some(notice);
	}
}


// vim: ts=4
