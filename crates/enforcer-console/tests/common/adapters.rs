//! In-memory governance adapter.
//!
//! Behaves like the management services as far as the controllers can
//! tell: permission creates/deletes mutate the permitted-projects answer,
//! so a resync observes the server-side effect of a mutation. Failure
//! toggles let tests degrade individual endpoints.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use enforcer_types::error::{EnfResult, Error, Problem};
use enforcer_types::governance_adapter::GovernanceAdapter;
use enforcer_types::model::{
	AllowedArtifact, Artifact, Build, BuildItem, Component, LicensedArtifact, Project,
	ProjectComponentBuild,
};

#[derive(Debug, Default)]
pub struct MockGovernance {
	pub projects: Mutex<Vec<Project>>,
	/// Components by project id.
	pub components: Mutex<HashMap<i64, Vec<Component>>>,
	/// Builds by component id.
	pub builds: Mutex<HashMap<i64, Vec<Build>>>,
	/// Build items by build id.
	pub build_items: Mutex<HashMap<i64, Vec<BuildItem>>>,
	pub artifacts: Mutex<Vec<Artifact>>,
	/// Artifacts by project id.
	pub artifacts_by_project: Mutex<HashMap<i64, Vec<Artifact>>>,
	/// Usage rows by artifact id.
	pub usages: Mutex<HashMap<i64, Vec<ProjectComponentBuild>>>,
	/// Permitted projects by artifact id; the source of the cache.
	pub permitted: Mutex<HashMap<i64, Vec<Project>>>,
	pub allowed_records: Mutex<Vec<AllowedArtifact>>,
	pub licensed_records: Mutex<Vec<LicensedArtifact>>,
	pub deleted_allowed: Mutex<Vec<(i64, i64)>>,
	pub deleted_licensed: Mutex<Vec<(i64, i64)>>,
	pub auth_attempts: Mutex<Vec<Box<str>>>,

	pub fail_component_fetch: AtomicBool,
	pub fail_permitted_fetch: AtomicBool,
	pub fail_mutations: AtomicBool,

	next_id: AtomicI64,
}

impl MockGovernance {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	fn alloc_id(&self) -> i64 {
		1000 + self.next_id.fetch_add(1, Ordering::Relaxed)
	}

	fn conflict(detail: &str) -> Error {
		Error::Api(Problem {
			kind: "about:blank".into(),
			title: "Conflict".into(),
			status: 409,
			detail: detail.into(),
		})
	}

	fn check_mutations(&self) -> EnfResult<()> {
		if self.fail_mutations.load(Ordering::Relaxed) {
			Err(Self::conflict("mutation rejected by test toggle"))
		} else {
			Ok(())
		}
	}

	fn permit(&self, artifact_id: i64, project_id: i64) {
		let mut permitted = self.permitted.lock();
		let projects = permitted.entry(artifact_id).or_default();
		if !projects.iter().any(|p| p.project_id == project_id) {
			projects.push(Project {
				project_id,
				acronym: format!("P{}", project_id).into(),
				..Default::default()
			});
		}
	}

	fn unpermit(&self, artifact_id: i64, project_id: i64) {
		if let Some(projects) = self.permitted.lock().get_mut(&artifact_id) {
			projects.retain(|p| p.project_id != project_id);
		}
	}
}

#[async_trait]
impl GovernanceAdapter for MockGovernance {
	async fn authenticate(&self, username: &str, _password: &str) -> EnfResult<Box<str>> {
		self.auth_attempts.lock().push(username.into());
		if username.is_empty() {
			return Err(Error::Unauthorized);
		}
		Ok(format!("token-{}", username).into())
	}

	async fn list_projects(&self) -> EnfResult<Vec<Project>> {
		Ok(self.projects.lock().clone())
	}

	async fn create_project(&self, project: &Project) -> EnfResult<Project> {
		self.check_mutations()?;
		let mut created = project.clone();
		created.project_id = self.alloc_id();
		self.projects.lock().push(created.clone());
		Ok(created)
	}

	async fn update_project(&self, project: &Project) -> EnfResult<Project> {
		self.check_mutations()?;
		let mut projects = self.projects.lock();
		match projects.iter_mut().find(|p| p.project_id == project.project_id) {
			Some(row) => {
				*row = project.clone();
				Ok(project.clone())
			}
			None => Err(Error::NotFound),
		}
	}

	async fn delete_project(&self, project_id: i64) -> EnfResult<()> {
		self.check_mutations()?;
		self.projects.lock().retain(|p| p.project_id != project_id);
		Ok(())
	}

	async fn find_permitted_projects(&self, artifact_id: i64) -> EnfResult<Vec<Project>> {
		if self.fail_permitted_fetch.load(Ordering::Relaxed) {
			return Err(Error::Transport("connection reset".into()));
		}
		Ok(self.permitted.lock().get(&artifact_id).cloned().unwrap_or_default())
	}

	async fn find_artifacts_by_status(&self, status: &str) -> EnfResult<Vec<Artifact>> {
		Ok(self.artifacts.lock().iter().filter(|a| a.status.as_ref() == status).cloned().collect())
	}

	async fn find_artifacts_by_project(&self, project_id: i64) -> EnfResult<Vec<Artifact>> {
		Ok(self.artifacts_by_project.lock().get(&project_id).cloned().unwrap_or_default())
	}

	async fn create_artifact(&self, artifact: &Artifact) -> EnfResult<Artifact> {
		self.check_mutations()?;
		let mut created = artifact.clone();
		created.artifact_id = self.alloc_id();
		self.artifacts.lock().push(created.clone());
		Ok(created)
	}

	async fn update_artifact(&self, artifact: &Artifact) -> EnfResult<Artifact> {
		self.check_mutations()?;
		let mut artifacts = self.artifacts.lock();
		match artifacts.iter_mut().find(|a| a.artifact_id == artifact.artifact_id) {
			Some(row) => {
				*row = artifact.clone();
				Ok(artifact.clone())
			}
			None => Err(Error::NotFound),
		}
	}

	async fn delete_artifact(&self, artifact_id: i64) -> EnfResult<()> {
		self.check_mutations()?;
		self.artifacts.lock().retain(|a| a.artifact_id != artifact_id);
		Ok(())
	}

	async fn find_components_by_project(&self, project_id: i64) -> EnfResult<Vec<Component>> {
		if self.fail_component_fetch.load(Ordering::Relaxed) {
			return Err(Error::Transport("connection refused".into()));
		}
		Ok(self.components.lock().get(&project_id).cloned().unwrap_or_default())
	}

	async fn find_builds_by_component(&self, component_id: i64) -> EnfResult<Vec<Build>> {
		Ok(self.builds.lock().get(&component_id).cloned().unwrap_or_default())
	}

	async fn find_build_items_by_build(&self, build_id: i64) -> EnfResult<Vec<BuildItem>> {
		Ok(self.build_items.lock().get(&build_id).cloned().unwrap_or_default())
	}

	async fn find_usages_by_artifact(
		&self,
		artifact_id: i64,
	) -> EnfResult<Vec<ProjectComponentBuild>> {
		Ok(self.usages.lock().get(&artifact_id).cloned().unwrap_or_default())
	}

	async fn find_allowed_by_project(&self, project_id: i64) -> EnfResult<Vec<AllowedArtifact>> {
		Ok(self
			.allowed_records
			.lock()
			.iter()
			.filter(|r| r.project_id == project_id)
			.cloned()
			.collect())
	}

	async fn create_allowed_artifact(
		&self,
		record: &AllowedArtifact,
	) -> EnfResult<AllowedArtifact> {
		self.check_mutations()?;
		let mut created = record.clone();
		created.allowed_artifact_id = self.alloc_id();
		self.allowed_records.lock().push(created.clone());
		self.permit(record.artifact_id, record.project_id);
		Ok(created)
	}

	async fn delete_allowed_artifact(&self, project_id: i64, artifact_id: i64) -> EnfResult<()> {
		self.check_mutations()?;
		self.deleted_allowed.lock().push((project_id, artifact_id));
		self.allowed_records
			.lock()
			.retain(|r| !(r.project_id == project_id && r.artifact_id == artifact_id));
		self.unpermit(artifact_id, project_id);
		Ok(())
	}

	async fn find_licensed_by_project(&self, project_id: i64) -> EnfResult<Vec<LicensedArtifact>> {
		Ok(self
			.licensed_records
			.lock()
			.iter()
			.filter(|r| r.project_id == project_id)
			.cloned()
			.collect())
	}

	async fn create_licensed_artifact(
		&self,
		record: &LicensedArtifact,
	) -> EnfResult<LicensedArtifact> {
		self.check_mutations()?;
		let mut created = record.clone();
		created.licensed_artifact_id = self.alloc_id();
		self.licensed_records.lock().push(created.clone());
		self.permit(record.artifact_id, record.project_id);
		Ok(created)
	}

	async fn delete_licensed_artifact(&self, project_id: i64, artifact_id: i64) -> EnfResult<()> {
		self.check_mutations()?;
		self.deleted_licensed.lock().push((project_id, artifact_id));
		self.licensed_records
			.lock()
			.retain(|r| !(r.project_id == project_id && r.artifact_id == artifact_id));
		self.unpermit(artifact_id, project_id);
		Ok(())
	}
}
