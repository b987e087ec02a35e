//! Artifact view: the artifact master list, filtered by status.
//!
//! Focus broadcast on `artifact_selected` drives the usage view. CRUD
//! patches the grid directly after a confirmed success; a created or
//! updated artifact only stays in the grid while its status matches the
//! active filter.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use enforcer_core::cascade::CascadeList;
use enforcer_core::hub::{EventHub, Subscription};
use enforcer_core::selection::Keyed;
use enforcer_core::state::{ListState, LoadPhase};
use enforcer_types::governance_adapter::GovernanceAdapter;
use enforcer_types::model::Artifact;
use enforcer_types::prelude::*;

const LOAD_FAILED: &str = "Data Load Failed";

pub struct ArtifactListController {
	inner: Arc<ArtifactListInner>,
	_subs: Vec<Subscription>,
}

struct ArtifactListInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<Artifact, ()>,
	/// Uppercased status the grid is filtered to. Read at fetch time, so a
	/// queued reload always queries the newest filter; the epoch stamp
	/// drops the older completion.
	status_filter: Mutex<Box<str>>,
}

impl ArtifactListInner {
	fn fetcher(self: &Arc<Self>) -> impl Fn(()) -> BoxFuture<'static, EnfResult<Vec<Artifact>>> + use<> {
		let inner = self.clone();
		move |()| {
			let inner = inner.clone();
			async move {
				let status = inner.status_filter.lock().clone();
				inner.adapter.find_artifacts_by_status(&status).await
			}
			.boxed()
		}
	}
}

impl ArtifactListController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner = Arc::new(ArtifactListInner {
			adapter,
			hub: hub.clone(),
			list: CascadeList::new(),
			status_filter: Mutex::new(Artifact::STATUS_LIMITED.into()),
		});
		// The artifact grid stays empty until the user asks for a status;
		// login alone loads nothing here.
		Self { inner, _subs: Vec::new() }
	}

	/// Switch the status filter and reload. The previous focus is gone
	/// after the reset, and the dependent usage view is told so.
	pub fn load_by_status(&self, status: &str) {
		*self.inner.status_filter.lock() = status.to_uppercase().into();
		self.inner.list.on_upstream(Some(()));
		self.inner.hub.artifact_selected.emit(&None);
	}

	/// Reload with the filter unchanged.
	pub fn refresh(&self) {
		self.inner.list.on_upstream(Some(()));
		self.inner.hub.artifact_selected.emit(&None);
	}

	pub fn status_filter(&self) -> Box<str> {
		self.inner.status_filter.lock().clone()
	}

	pub fn on_row_activated(&self, row: Artifact, selected: bool) {
		let focus = self.inner.list.activate_row(row, selected);
		self.inner.hub.artifact_selected.emit(&focus);
	}

	pub async fn create_artifact(&self, artifact: Artifact) -> EnfResult<Artifact> {
		match self.inner.adapter.create_artifact(&artifact).await {
			Ok(created) => {
				let filter = self.inner.status_filter.lock().clone();
				if created.status == filter {
					self.inner.list.with_state_mut(|state| {
						state.rows.push(created.clone());
						state.phase = LoadPhase::Loaded;
					});
				}
				self.inner.hub.artifact_created.emit(&created);
				Ok(created)
			}
			Err(err) => {
				self.record_failure("Insert of Artifact Failed", &err);
				Err(err)
			}
		}
	}

	pub async fn update_artifact(&self, artifact: Artifact) -> EnfResult<Artifact> {
		match self.inner.adapter.update_artifact(&artifact).await {
			Ok(updated) => {
				let filter = self.inner.status_filter.lock().clone();
				let lost_focus = self.inner.list.with_state_mut(|state| {
					if updated.status == filter {
						if let Some(row) =
							state.rows.iter_mut().find(|row| row.artifact_id == updated.artifact_id)
						{
							*row = updated.clone();
						}
						if state.selection.is(updated.key()) {
							state.selection.activate(updated.clone());
						}
						false
					} else {
						// Status moved out of the filtered view.
						state.rows.retain(|row| row.artifact_id != updated.artifact_id);
						state.selection.deactivate(&updated)
					}
				});
				self.inner.hub.artifact_changed.emit(&updated);
				if lost_focus {
					self.inner.hub.artifact_selected.emit(&None);
				}
				Ok(updated)
			}
			Err(err) => {
				self.record_failure("Update of Artifact Failed", &err);
				Err(err)
			}
		}
	}

	pub async fn delete_artifact(&self, artifact: &Artifact) -> EnfResult<()> {
		match self.inner.adapter.delete_artifact(artifact.artifact_id).await {
			Ok(()) => {
				let was_focused = self.inner.list.with_state_mut(|state| {
					state.rows.retain(|row| row.artifact_id != artifact.artifact_id);
					state.selection.deactivate(artifact)
				});
				self.inner.hub.artifact_deleted.emit(artifact);
				if was_focused {
					self.inner.hub.artifact_selected.emit(&None);
				}
				Ok(())
			}
			Err(err) => {
				self.record_failure("Delete of Artifact Failed", &err);
				Err(err)
			}
		}
	}

	fn record_failure(&self, title: &str, err: &Error) {
		self.inner.list.with_state_mut(|state| state.last_error = Some(Notice::new(title, err)));
	}

	pub async fn drain(&self) -> bool {
		self.inner.list.drain(LOAD_FAILED, self.inner.fetcher()).await
	}

	pub fn spawn_pump(&self) -> JoinHandle<()> {
		let inner = self.inner.clone();
		tokio::spawn(async move { inner.list.run(LOAD_FAILED, inner.fetcher()).await })
	}

	pub fn rows(&self) -> Vec<Artifact> {
		self.inner.list.rows()
	}

	pub fn selected(&self) -> Option<Artifact> {
		self.inner.list.selected()
	}

	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<Artifact>) -> R) -> R {
		self.inner.list.with_state(read)
	}
}

// vim: ts=4
