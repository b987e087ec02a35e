//! Project view: the project master list with its CRUD operations, the
//! artifacts-for-project list, and the project's permission record lists.

use std::sync::Arc;

use chrono::{NaiveDate, TimeDelta};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;

use enforcer_core::cascade::CascadeList;
use enforcer_core::hub::{EventHub, LoginNotice, Subscription};
use enforcer_core::selection::Keyed;
use enforcer_core::state::{ListState, LoadPhase};
use enforcer_types::governance_adapter::GovernanceAdapter;
use enforcer_types::model::{AllowedArtifact, Artifact, LicensedArtifact, Project};
use enforcer_types::prelude::*;

const LOAD_FAILED: &str = "Data Load Failed";

/// Lifecycle verdict for a project row: missing schedule and ended
/// projects are alerts, projects ending within a week are warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectHealth {
	Active,
	EndingSoon,
	Ended,
	MissingSchedule,
}

/// Presentation rule for the project grids. Dates the backend sends in a
/// shape chrono cannot parse are treated as open-ended.
pub fn project_health(project: &Project, today: NaiveDate) -> ProjectHealth {
	if project.begin_date.as_deref().is_none_or(str::is_empty) {
		return ProjectHealth::MissingSchedule;
	}
	let Some(end) = project.end_date.as_deref().filter(|date| !date.is_empty()) else {
		return ProjectHealth::Active;
	};
	match NaiveDate::parse_from_str(end, "%Y-%m-%d") {
		Ok(end) if end < today => ProjectHealth::Ended,
		Ok(end) if end <= today + TimeDelta::days(7) => ProjectHealth::EndingSoon,
		_ => ProjectHealth::Active,
	}
}

// ProjectListController
//***********************

/// Master list of the project view. Loads on login, broadcasts row focus
/// on `project_selected`, and patches its own grid directly after each
/// confirmed CRUD success (the full resulting row is known, unlike
/// permission mutations, which must re-derive from the server).
pub struct ProjectListController {
	inner: Arc<ProjectListInner>,
	_subs: Vec<Subscription>,
}

struct ProjectListInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<Project, ()>,
}

impl ProjectListInner {
	fn fetcher(self: &Arc<Self>) -> impl Fn(()) -> BoxFuture<'static, EnfResult<Vec<Project>>> + use<> {
		let adapter = self.adapter.clone();
		move |()| {
			let adapter = adapter.clone();
			async move { adapter.list_projects().await }.boxed()
		}
	}
}

impl ProjectListController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner =
			Arc::new(ProjectListInner { adapter, hub: hub.clone(), list: CascadeList::new() });

		let login_inner = inner.clone();
		let subs = vec![hub.login.subscribe(move |notice| {
			if matches!(notice, LoginNotice::Success { .. }) {
				login_inner.list.on_upstream(Some(()));
			}
		})];
		Self { inner, _subs: subs }
	}

	pub fn on_row_activated(&self, row: Project, selected: bool) {
		let focus = self.inner.list.activate_row(row, selected);
		self.inner.hub.project_selected.emit(&focus);
	}

	pub async fn create_project(&self, project: Project) -> EnfResult<Project> {
		match self.inner.adapter.create_project(&project).await {
			Ok(created) => {
				self.inner.list.with_state_mut(|state| {
					state.rows.push(created.clone());
					state.phase = LoadPhase::Loaded;
				});
				self.inner.hub.project_created.emit(&created);
				Ok(created)
			}
			Err(err) => {
				self.record_failure("Insert of Project Failed", &err);
				Err(err)
			}
		}
	}

	pub async fn update_project(&self, project: Project) -> EnfResult<Project> {
		match self.inner.adapter.update_project(&project).await {
			Ok(updated) => {
				self.inner.list.with_state_mut(|state| {
					if let Some(row) =
						state.rows.iter_mut().find(|row| row.project_id == updated.project_id)
					{
						*row = updated.clone();
					}
					if state.selection.is(updated.key()) {
						state.selection.activate(updated.clone());
					}
				});
				self.inner.hub.project_changed.emit(&updated);
				Ok(updated)
			}
			Err(err) => {
				self.record_failure("Update of Project Failed", &err);
				Err(err)
			}
		}
	}

	pub async fn delete_project(&self, project: &Project) -> EnfResult<()> {
		match self.inner.adapter.delete_project(project.project_id).await {
			Ok(()) => {
				let was_focused = self.inner.list.with_state_mut(|state| {
					state.rows.retain(|row| row.project_id != project.project_id);
					state.selection.deactivate(project)
				});
				self.inner.hub.project_deleted.emit(project);
				if was_focused {
					// Dependent views must not keep a deleted parent.
					self.inner.hub.project_selected.emit(&None);
				}
				Ok(())
			}
			Err(err) => {
				self.record_failure("Delete of Project Failed", &err);
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

	pub fn rows(&self) -> Vec<Project> {
		self.inner.list.rows()
	}

	pub fn selected(&self) -> Option<Project> {
		self.inner.list.selected()
	}

	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<Project>) -> R) -> R {
		self.inner.list.with_state(read)
	}
}

// ProjectArtifactsController
//****************************

/// Artifacts used by the focused project.
pub struct ProjectArtifactsController {
	inner: Arc<ProjectArtifactsInner>,
	_subs: Vec<Subscription>,
}

struct ProjectArtifactsInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<Artifact>,
}

impl ProjectArtifactsInner {
	fn fetcher(
		self: &Arc<Self>,
	) -> impl Fn(i64) -> BoxFuture<'static, EnfResult<Vec<Artifact>>> + use<> {
		let adapter = self.adapter.clone();
		move |project_id| {
			let adapter = adapter.clone();
			async move { adapter.find_artifacts_by_project(project_id).await }.boxed()
		}
	}
}

impl ProjectArtifactsController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner =
			Arc::new(ProjectArtifactsInner { adapter, hub: hub.clone(), list: CascadeList::new() });

		let upstream_inner = inner.clone();
		let subs = vec![hub.project_selected.subscribe(move |sel: &Option<Project>| {
			let parent = sel.as_ref().filter(|p| p.has_id()).map(|p| p.project_id);
			upstream_inner.list.on_upstream(parent);
		})];
		Self { inner, _subs: subs }
	}

	pub fn on_row_activated(&self, row: Artifact, selected: bool) {
		let focus = self.inner.list.activate_row(row, selected);
		self.inner.hub.project_artifact_selected.emit(&focus);
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

	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<Artifact>) -> R) -> R {
		self.inner.list.with_state(read)
	}
}

// Permit lists
//**************

/// The two permission tables share one controller shape; only the fetch
/// differs.
pub trait PermitRecord: Keyed<Key = i64> + Clone + Send + Sync + 'static {
	fn fetch_by_project(
		adapter: Arc<dyn GovernanceAdapter>,
		project_id: i64,
	) -> BoxFuture<'static, EnfResult<Vec<Self>>>;
}

impl PermitRecord for AllowedArtifact {
	fn fetch_by_project(
		adapter: Arc<dyn GovernanceAdapter>,
		project_id: i64,
	) -> BoxFuture<'static, EnfResult<Vec<Self>>> {
		async move { adapter.find_allowed_by_project(project_id).await }.boxed()
	}
}

impl PermitRecord for LicensedArtifact {
	fn fetch_by_project(
		adapter: Arc<dyn GovernanceAdapter>,
		project_id: i64,
	) -> BoxFuture<'static, EnfResult<Vec<Self>>> {
		async move { adapter.find_licensed_by_project(project_id).await }.boxed()
	}
}

/// Permission records held by the focused project, for one of the two
/// tables. These grids are leaves; they broadcast nothing.
pub struct PermitListController<R: PermitRecord> {
	inner: Arc<PermitListInner<R>>,
	_subs: Vec<Subscription>,
}

struct PermitListInner<R: Keyed> {
	adapter: Arc<dyn GovernanceAdapter>,
	list: CascadeList<R>,
}

pub type ProjectAllowedController = PermitListController<AllowedArtifact>;
pub type ProjectLicensedController = PermitListController<LicensedArtifact>;

impl<R: PermitRecord> PermitListController<R> {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner = Arc::new(PermitListInner { adapter, list: CascadeList::new() });

		let upstream_inner = inner.clone();
		let subs = vec![hub.project_selected.subscribe(move |sel: &Option<Project>| {
			let parent = sel.as_ref().filter(|p| p.has_id()).map(|p| p.project_id);
			upstream_inner.list.on_upstream(parent);
		})];
		Self { inner, _subs: subs }
	}

	pub fn on_row_activated(&self, row: R, selected: bool) {
		self.inner.list.activate_row(row, selected);
	}

	pub async fn drain(&self) -> bool {
		let adapter = self.inner.adapter.clone();
		self.inner
			.list
			.drain(LOAD_FAILED, move |project_id| R::fetch_by_project(adapter.clone(), project_id))
			.await
	}

	pub fn spawn_pump(&self) -> JoinHandle<()> {
		let inner = self.inner.clone();
		tokio::spawn(async move {
			let adapter = inner.adapter.clone();
			inner
				.list
				.run(LOAD_FAILED, move |project_id| R::fetch_by_project(adapter.clone(), project_id))
				.await;
		})
	}

	pub fn rows(&self) -> Vec<R> {
		self.inner.list.rows()
	}

	pub fn with_state<S>(&self, read: impl FnOnce(&ListState<R>) -> S) -> S {
		self.inner.list.with_state(read)
	}
}


// vim: ts=4
