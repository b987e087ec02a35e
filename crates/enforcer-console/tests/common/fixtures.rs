//! Entity builders and a fully wired console harness.

use std::sync::Arc;

use parking_lot::Mutex;

use enforcer_console::Console;
use enforcer_core::hub::{Channel, EventHub, Subscription};
use enforcer_core::session::Session;
use enforcer_types::governance_adapter::{GovernanceAdapter, TokenStore};
use enforcer_types::model::{
	Artifact, Build, BuildItem, Component, Project, ProjectComponentBuild,
};

use super::adapters::MockGovernance;

pub fn project(id: i64, acronym: &str) -> Project {
	Project { project_id: id, acronym: acronym.into(), ..Default::default() }
}

pub fn component(id: i64, project_id: i64, name: &str) -> Component {
	Component { component_id: id, project_id, name: name.into() }
}

pub fn build(id: i64, project_id: i64, component_id: i64, version: &str) -> Build {
	Build {
		build_id: id,
		project_id,
		component_id,
		component_version: version.into(),
		..Default::default()
	}
}

pub fn build_item(id: i64, build_id: i64, allowed: bool) -> BuildItem {
	BuildItem {
		builditem_id: id,
		build_id,
		group_name: "org.example".into(),
		artifact_name: "widget".into(),
		version_name: "1.0".into(),
		artifact_status_snapshot: if allowed { "APPROVED" } else { "RETIRED" }.into(),
		allowed,
	}
}

pub fn artifact(id: i64, status: &str, vendor_licensed: bool) -> Artifact {
	Artifact {
		artifact_id: id,
		status: status.into(),
		group_name: "org.example".into(),
		artifact_name: format!("lib{}", id).into(),
		version_name: "2.1".into(),
		is_vendor_licensed: vendor_licensed,
		..Default::default()
	}
}

pub fn usage_row(project_id: i64, component_id: i64, build_id: i64) -> ProjectComponentBuild {
	ProjectComponentBuild {
		project: project(project_id, &format!("P{}", project_id)),
		component: component(component_id, project_id, &format!("c{}", component_id)),
		build: build(build_id, project_id, component_id, "1.0"),
	}
}

/// Collect every payload emitted on a channel.
pub fn probe<T: Clone + Send + Sync + 'static>(
	channel: &Channel<T>,
) -> (Subscription, Arc<Mutex<Vec<T>>>) {
	let log = Arc::new(Mutex::new(Vec::new()));
	let sink = log.clone();
	let sub = channel.subscribe(move |payload: &T| sink.lock().push(payload.clone()));
	(sub, log)
}

/// A hub, a session, the full console, and the mock behind them.
pub struct TestConsole {
	pub hub: Arc<EventHub>,
	pub mock: Arc<MockGovernance>,
	pub session: Arc<Session>,
	pub console: Console,
}

impl TestConsole {
	pub fn new() -> Self {
		let hub = EventHub::new();
		let mock = MockGovernance::new();
		let adapter: Arc<dyn GovernanceAdapter> = mock.clone();
		let session = Arc::new(Session::new(adapter.clone(), hub.clone(), TokenStore::default()));
		let console = Console::new(&hub, adapter, session.clone());
		Self { hub, mock, session, console }
	}

	/// Log in as "pat" and settle the resulting master-list loads.
	pub async fn login(&self) {
		self.session.login("pat", "secret").await.unwrap();
		self.console.drain().await;
	}
}
