//! Single-selection discipline shared by every grid controller.
//!
//! Each grid keeps at most one focused row. The discipline lives here, not
//! in any grid library: activation replaces the focus, and a deselect is
//! honored only while it still refers to the focused row, which guards
//! against stale deselect notifications arriving after a newer selection
//! has already superseded them.

use enforcer_types::model::{
	AllowedArtifact, Artifact, Build, BuildItem, Component, LicensedArtifact, Project,
	ProjectComponentBuild,
};

/// Row identity, as the grids compare it.
pub trait Keyed {
	type Key: Copy + PartialEq + std::fmt::Debug;

	fn key(&self) -> Self::Key;
}

impl Keyed for Project {
	type Key = i64;
	fn key(&self) -> i64 {
		self.project_id
	}
}

impl Keyed for Artifact {
	type Key = i64;
	fn key(&self) -> i64 {
		self.artifact_id
	}
}

impl Keyed for Component {
	type Key = i64;
	fn key(&self) -> i64 {
		self.component_id
	}
}

impl Keyed for Build {
	type Key = i64;
	fn key(&self) -> i64 {
		self.build_id
	}
}

impl Keyed for BuildItem {
	type Key = i64;
	fn key(&self) -> i64 {
		self.builditem_id
	}
}

impl Keyed for AllowedArtifact {
	type Key = i64;
	fn key(&self) -> i64 {
		self.allowed_artifact_id
	}
}

impl Keyed for LicensedArtifact {
	type Key = i64;
	fn key(&self) -> i64 {
		self.licensed_artifact_id
	}
}

/// Usage rows are identified by the (project, component) pair; the same
/// project may appear once per component using the artifact.
impl Keyed for ProjectComponentBuild {
	type Key = (i64, i64);
	fn key(&self) -> (i64, i64) {
		(self.project.project_id, self.component.component_id)
	}
}

/// The focused row of one grid.
#[derive(Debug)]
pub struct Selection<T: Keyed> {
	current: Option<T>,
}

impl<T: Keyed> Default for Selection<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Keyed> Selection<T> {
	pub fn new() -> Self {
		Self { current: None }
	}

	/// Focus the given row, replacing any previous focus.
	pub fn activate(&mut self, row: T) {
		self.current = Some(row);
	}

	/// Honor a deselect only when it still refers to the focused row.
	/// Returns whether the focus was cleared.
	pub fn deactivate(&mut self, row: &T) -> bool {
		if self.current.as_ref().is_some_and(|cur| cur.key() == row.key()) {
			self.current = None;
			true
		} else {
			false
		}
	}

	pub fn clear(&mut self) {
		self.current = None;
	}

	pub fn get(&self) -> Option<&T> {
		self.current.as_ref()
	}

	pub fn key(&self) -> Option<T::Key> {
		self.current.as_ref().map(Keyed::key)
	}

	pub fn is(&self, key: T::Key) -> bool {
		self.key() == Some(key)
	}

	pub fn is_empty(&self) -> bool {
		self.current.is_none()
	}
}


// vim: ts=4
