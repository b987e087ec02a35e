//! Build view: the Project → Component → Build → BuildItem drill-down.
//!
//! Each list consumes every upstream selection channel of its level, so a
//! change anywhere above it resets it directly; only the immediate parent
//! triggers a fetch. The controllers are correct under any subscription
//! order: all they assume of an upstream event is its payload.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;

use enforcer_core::cascade::CascadeList;
use enforcer_core::hub::{EventHub, LoginNotice, Subscription};
use enforcer_core::state::ListState;
use enforcer_types::governance_adapter::GovernanceAdapter;
use enforcer_types::model::{Build, BuildItem, Component, Project};
use enforcer_types::prelude::*;

const LOAD_FAILED: &str = "Data Load Failed";

/// Build items carry a precomputed verdict; disallowed ones are flagged
/// in the grid.
pub fn build_item_flagged(item: &BuildItem) -> bool {
	!item.allowed
}

// BuildProjectsController
//*************************

/// Master project list of the build view. Loads on login and broadcasts
/// focus on `build_project_selected`.
pub struct BuildProjectsController {
	inner: Arc<BuildProjectsInner>,
	_subs: Vec<Subscription>,
}

struct BuildProjectsInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<Project, ()>,
}

impl BuildProjectsInner {
	fn fetcher(self: &Arc<Self>) -> impl Fn(()) -> BoxFuture<'static, EnfResult<Vec<Project>>> + use<> {
		let adapter = self.adapter.clone();
		move |()| {
			let adapter = adapter.clone();
			async move { adapter.list_projects().await }.boxed()
		}
	}
}

impl BuildProjectsController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner =
			Arc::new(BuildProjectsInner { adapter, hub: hub.clone(), list: CascadeList::new() });

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
		self.inner.hub.build_project_selected.emit(&focus);
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

// BuildComponentsController
//***************************

/// Components of the focused project.
pub struct BuildComponentsController {
	inner: Arc<BuildComponentsInner>,
	_subs: Vec<Subscription>,
}

struct BuildComponentsInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<Component>,
}

impl BuildComponentsInner {
	fn fetcher(
		self: &Arc<Self>,
	) -> impl Fn(i64) -> BoxFuture<'static, EnfResult<Vec<Component>>> + use<> {
		let adapter = self.adapter.clone();
		move |project_id| {
			let adapter = adapter.clone();
			async move { adapter.find_components_by_project(project_id).await }.boxed()
		}
	}
}

impl BuildComponentsController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner =
			Arc::new(BuildComponentsInner { adapter, hub: hub.clone(), list: CascadeList::new() });

		let upstream_inner = inner.clone();
		let subs = vec![hub.build_project_selected.subscribe(move |sel: &Option<Project>| {
			let parent = sel.as_ref().filter(|p| p.has_id()).map(|p| p.project_id);
			upstream_inner.list.on_upstream(parent);
		})];
		Self { inner, _subs: subs }
	}

	pub fn on_row_activated(&self, row: Component, selected: bool) {
		let focus = self.inner.list.activate_row(row, selected);
		self.inner.hub.build_component_selected.emit(&focus);
	}

	pub async fn drain(&self) -> bool {
		self.inner.list.drain(LOAD_FAILED, self.inner.fetcher()).await
	}

	pub fn spawn_pump(&self) -> JoinHandle<()> {
		let inner = self.inner.clone();
		tokio::spawn(async move { inner.list.run(LOAD_FAILED, inner.fetcher()).await })
	}

	pub fn rows(&self) -> Vec<Component> {
		self.inner.list.rows()
	}

	pub fn selected(&self) -> Option<Component> {
		self.inner.list.selected()
	}

	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<Component>) -> R) -> R {
		self.inner.list.with_state(read)
	}
}

// BuildBuildsController
//***********************

/// Builds of the focused component. A project change two levels up resets
/// this list without fetching; only a component selection fetches.
pub struct BuildBuildsController {
	inner: Arc<BuildBuildsInner>,
	_subs: Vec<Subscription>,
}

struct BuildBuildsInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<Build>,
}

impl BuildBuildsInner {
	fn fetcher(self: &Arc<Self>) -> impl Fn(i64) -> BoxFuture<'static, EnfResult<Vec<Build>>> + use<> {
		let adapter = self.adapter.clone();
		move |component_id| {
			let adapter = adapter.clone();
			async move { adapter.find_builds_by_component(component_id).await }.boxed()
		}
	}
}

impl BuildBuildsController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner =
			Arc::new(BuildBuildsInner { adapter, hub: hub.clone(), list: CascadeList::new() });

		let project_inner = inner.clone();
		let component_inner = inner.clone();
		let subs = vec![
			hub.build_project_selected
				.subscribe(move |_sel: &Option<Project>| project_inner.list.on_upstream(None)),
			hub.build_component_selected.subscribe(move |sel: &Option<Component>| {
				let parent = sel.as_ref().filter(|c| c.has_id()).map(|c| c.component_id);
				component_inner.list.on_upstream(parent);
			}),
		];
		Self { inner, _subs: subs }
	}

	pub fn on_row_activated(&self, row: Build, selected: bool) {
		let focus = self.inner.list.activate_row(row, selected);
		self.inner.hub.build_build_selected.emit(&focus);
	}

	pub async fn drain(&self) -> bool {
		self.inner.list.drain(LOAD_FAILED, self.inner.fetcher()).await
	}

	pub fn spawn_pump(&self) -> JoinHandle<()> {
		let inner = self.inner.clone();
		tokio::spawn(async move { inner.list.run(LOAD_FAILED, inner.fetcher()).await })
	}

	pub fn rows(&self) -> Vec<Build> {
		self.inner.list.rows()
	}

	pub fn selected(&self) -> Option<Build> {
		self.inner.list.selected()
	}

	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<Build>) -> R) -> R {
		self.inner.list.with_state(read)
	}
}

// BuildItemsController
//**********************

/// Artifacts declared by the focused build.
pub struct BuildItemsController {
	inner: Arc<BuildItemsInner>,
	_subs: Vec<Subscription>,
}

struct BuildItemsInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	list: CascadeList<BuildItem>,
}

impl BuildItemsInner {
	fn fetcher(
		self: &Arc<Self>,
	) -> impl Fn(i64) -> BoxFuture<'static, EnfResult<Vec<BuildItem>>> + use<> {
		let adapter = self.adapter.clone();
		move |build_id| {
			let adapter = adapter.clone();
			async move { adapter.find_build_items_by_build(build_id).await }.boxed()
		}
	}
}

impl BuildItemsController {
	pub fn new(hub: &Arc<EventHub>, adapter: Arc<dyn GovernanceAdapter>) -> Self {
		let inner =
			Arc::new(BuildItemsInner { adapter, hub: hub.clone(), list: CascadeList::new() });

		let project_inner = inner.clone();
		let component_inner = inner.clone();
		let build_inner = inner.clone();
		let subs = vec![
			hub.build_project_selected
				.subscribe(move |_sel: &Option<Project>| project_inner.list.on_upstream(None)),
			hub.build_component_selected
				.subscribe(move |_sel: &Option<Component>| component_inner.list.on_upstream(None)),
			hub.build_build_selected.subscribe(move |sel: &Option<Build>| {
				let parent = sel.as_ref().filter(|b| b.has_id()).map(|b| b.build_id);
				build_inner.list.on_upstream(parent);
			}),
		];
		Self { inner, _subs: subs }
	}

	pub fn on_row_activated(&self, row: BuildItem, selected: bool) {
		let focus = self.inner.list.activate_row(row, selected);
		self.inner.hub.build_item_selected.emit(&focus);
	}

	pub async fn drain(&self) -> bool {
		self.inner.list.drain(LOAD_FAILED, self.inner.fetcher()).await
	}

	pub fn spawn_pump(&self) -> JoinHandle<()> {
		let inner = self.inner.clone();
		tokio::spawn(async move { inner.list.run(LOAD_FAILED, inner.fetcher()).await })
	}

	pub fn rows(&self) -> Vec<BuildItem> {
		self.inner.list.rows()
	}

	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<BuildItem>) -> R) -> R {
		self.inner.list.with_state(read)
	}
}


// vim: ts=4
