//! Adapter that talks to the Enforcer management services.
//!
//! Everything the console knows about the backend goes through this trait,
//! so tests can substitute an in-memory implementation and the HTTP
//! transport stays in its own crate.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};

use crate::error::EnfResult;
use crate::model::{
	AllowedArtifact, Artifact, Build, BuildItem, Component, LicensedArtifact, Project,
	ProjectComponentBuild,
};

/// Shared bearer-token slot.
///
/// The session writes it once at login; the transport reads it per request.
/// Cheap to clone, clones share the slot.
#[derive(Clone, Debug, Default)]
pub struct TokenStore(Arc<RwLock<Option<Box<str>>>>);

impl TokenStore {
	pub fn set(&self, token: Box<str>) {
		match self.0.write() {
			Ok(mut guard) => *guard = Some(token),
			Err(poisoned) => *poisoned.into_inner() = Some(token),
		}
	}

	pub fn clear(&self) {
		match self.0.write() {
			Ok(mut guard) => *guard = None,
			Err(poisoned) => *poisoned.into_inner() = None,
		}
	}

	pub fn get(&self) -> Option<Box<str>> {
		match self.0.read() {
			Ok(guard) => guard.clone(),
			Err(poisoned) => poisoned.into_inner().clone(),
		}
	}

	pub fn is_set(&self) -> bool {
		self.get().is_some()
	}
}

#[async_trait]
pub trait GovernanceAdapter: Debug + Send + Sync {
	/// Exchanges credentials for a bearer token.
	async fn authenticate(&self, username: &str, password: &str) -> EnfResult<Box<str>>;

	/// # Projects
	async fn list_projects(&self) -> EnfResult<Vec<Project>>;
	async fn create_project(&self, project: &Project) -> EnfResult<Project>;
	async fn update_project(&self, project: &Project) -> EnfResult<Project>;
	async fn delete_project(&self, project_id: i64) -> EnfResult<()>;

	/// Projects currently holding a permission record for the artifact.
	/// This is the source of the permitted cache.
	async fn find_permitted_projects(&self, artifact_id: i64) -> EnfResult<Vec<Project>>;

	/// # Artifacts
	async fn find_artifacts_by_status(&self, status: &str) -> EnfResult<Vec<Artifact>>;
	async fn find_artifacts_by_project(&self, project_id: i64) -> EnfResult<Vec<Artifact>>;
	async fn create_artifact(&self, artifact: &Artifact) -> EnfResult<Artifact>;
	async fn update_artifact(&self, artifact: &Artifact) -> EnfResult<Artifact>;
	async fn delete_artifact(&self, artifact_id: i64) -> EnfResult<()>;

	/// # Component inventory
	async fn find_components_by_project(&self, project_id: i64) -> EnfResult<Vec<Component>>;
	async fn find_builds_by_component(&self, component_id: i64) -> EnfResult<Vec<Build>>;
	async fn find_build_items_by_build(&self, build_id: i64) -> EnfResult<Vec<BuildItem>>;

	/// Usage rows for an artifact: every project/component/build triple
	/// whose build declares it.
	async fn find_usages_by_artifact(&self, artifact_id: i64)
	-> EnfResult<Vec<ProjectComponentBuild>>;

	/// # Permission records (non-vendor-licensed table)
	async fn find_allowed_by_project(&self, project_id: i64) -> EnfResult<Vec<AllowedArtifact>>;
	async fn create_allowed_artifact(&self, record: &AllowedArtifact)
	-> EnfResult<AllowedArtifact>;
	/// Revocation is keyed by (project, artifact); the caller may not hold
	/// the record id.
	async fn delete_allowed_artifact(&self, project_id: i64, artifact_id: i64) -> EnfResult<()>;

	/// # Permission records (vendor-licensed table)
	async fn find_licensed_by_project(&self, project_id: i64) -> EnfResult<Vec<LicensedArtifact>>;
	async fn create_licensed_artifact(
		&self,
		record: &LicensedArtifact,
	) -> EnfResult<LicensedArtifact>;
	async fn delete_licensed_artifact(&self, project_id: i64, artifact_id: i64) -> EnfResult<()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn token_store_clones_share_the_slot() {
		let store = TokenStore::default();
		let view = store.clone();
		assert!(!view.is_set());
		store.set("abc123".into());
		assert_eq!(view.get().as_deref(), Some("abc123"));
		view.clear();
		assert!(!store.is_set());
	}
}

// vim: ts=4
