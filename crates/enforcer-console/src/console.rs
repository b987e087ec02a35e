//! The assembled console: every controller wired to one hub and one
//! adapter.

use std::sync::Arc;

use tokio::task::JoinHandle;

use enforcer_core::hub::EventHub;
use enforcer_core::session::Session;
use enforcer_types::governance_adapter::GovernanceAdapter;

use crate::artifact::ArtifactListController;
use crate::build::{
	BuildBuildsController, BuildComponentsController, BuildItemsController,
	BuildProjectsController,
};
use crate::project::{
	ProjectAllowedController, ProjectArtifactsController, ProjectLicensedController,
	ProjectListController,
};
use crate::usage::ArtifactUsageController;

pub struct Console {
	pub project_list: ProjectListController,
	pub project_artifacts: ProjectArtifactsController,
	pub project_allowed: ProjectAllowedController,
	pub project_licensed: ProjectLicensedController,
	pub build_projects: BuildProjectsController,
	pub build_components: BuildComponentsController,
	pub build_builds: BuildBuildsController,
	pub build_items: BuildItemsController,
	pub artifact_list: ArtifactListController,
	pub artifact_usage: ArtifactUsageController,
}

impl Console {
	/// Wire every controller to the hub. Construction order carries no
	/// meaning; the controllers are correct under any subscription order.
	pub fn new(
		hub: &Arc<EventHub>,
		adapter: Arc<dyn GovernanceAdapter>,
		session: Arc<Session>,
	) -> Self {
		Self {
			project_list: ProjectListController::new(hub, adapter.clone()),
			project_artifacts: ProjectArtifactsController::new(hub, adapter.clone()),
			project_allowed: ProjectAllowedController::new(hub, adapter.clone()),
			project_licensed: ProjectLicensedController::new(hub, adapter.clone()),
			build_projects: BuildProjectsController::new(hub, adapter.clone()),
			build_components: BuildComponentsController::new(hub, adapter.clone()),
			build_builds: BuildBuildsController::new(hub, adapter.clone()),
			build_items: BuildItemsController::new(hub, adapter.clone()),
			artifact_list: ArtifactListController::new(hub, adapter.clone()),
			artifact_usage: ArtifactUsageController::new(hub, adapter, session),
		}
	}

	/// Spawn every controller's fetch pump. The returned handles live as
	/// long as the application; aborting them stops all fetching.
	pub fn spawn_pumps(&self) -> Vec<JoinHandle<()>> {
		vec![
			self.project_list.spawn_pump(),
			self.project_artifacts.spawn_pump(),
			self.project_allowed.spawn_pump(),
			self.project_licensed.spawn_pump(),
			self.build_projects.spawn_pump(),
			self.build_components.spawn_pump(),
			self.build_builds.spawn_pump(),
			self.build_items.spawn_pump(),
			self.artifact_list.spawn_pump(),
			self.artifact_usage.spawn_pump(),
		]
	}

	/// Settle every queued fetch deterministically: keep draining until a
	/// full pass over all controllers finds nothing queued. Intended for
	/// tests and headless (pumpless) use.
	pub async fn drain(&self) {
		loop {
			let mut processed = false;
			processed |= self.project_list.drain().await;
			processed |= self.project_artifacts.drain().await;
			processed |= self.project_allowed.drain().await;
			processed |= self.project_licensed.drain().await;
			processed |= self.build_projects.drain().await;
			processed |= self.build_components.drain().await;
			processed |= self.build_builds.drain().await;
			processed |= self.build_items.drain().await;
			processed |= self.artifact_list.drain().await;
			processed |= self.artifact_usage.drain().await;
			if !processed {
				break;
			}
		}
	}
}

// vim: ts=4
