//! Wire-level value types of the governance domain.
//!
//! Everything here is shaped exactly like the management services' JSON.
//! Identity fields are positive on anything the backend has persisted; a
//! zero id means "not yet assigned / no selection". Dates and timestamps
//! are carried as opaque strings and never interpreted by the console,
//! except where a new approval is stamped (see the usage controller).

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

/// A software project under governance.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Project {
	#[serde(default)]
	pub project_id: i64,
	#[serde(default)]
	pub acronym: Box<str>,
	pub business_owner: Option<Box<str>>,
	pub it_owner: Option<Box<str>>,
	pub begin_date: Option<Box<str>>,
	pub end_date: Option<Box<str>>,
}

impl Project {
	/// Whether this value carries a backend-assigned identity.
	pub fn has_id(&self) -> bool {
		self.project_id > 0
	}
}

/// A library version tracked by governance.
///
/// `status` is a free-form string owned by the backend. The console treats
/// exactly one value, [`Artifact::STATUS_LIMITED`], as the trigger for
/// permission gating; `is_vendor_licensed` selects which of the two
/// permission tables governs the artifact.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Artifact {
	#[serde(default)]
	pub artifact_id: i64,
	#[serde(default)]
	pub status: Box<str>,
	#[serde(default)]
	pub group_name: Box<str>,
	#[serde(default)]
	pub artifact_name: Box<str>,
	#[serde(default)]
	pub version_name: Box<str>,
	#[serde(default)]
	pub is_vendor_licensed: bool,
	pub created_date: Option<Box<str>>,
	pub approval_authorization: Option<Box<str>>,
	pub approval_date: Option<Box<str>>,
	pub approval_ts: Option<Box<str>>,
	pub deprecation_authorization: Option<Box<str>>,
	pub deprecation_date: Option<Box<str>>,
	pub deprecation_ts: Option<Box<str>>,
	pub retirement_authorization: Option<Box<str>>,
	pub retirement_date: Option<Box<str>>,
	pub retirement_ts: Option<Box<str>>,
}

impl Artifact {
	/// The one status value that gates usage behind permission records.
	pub const STATUS_LIMITED: &'static str = "LIMITED";

	pub fn has_id(&self) -> bool {
		self.artifact_id > 0
	}

	pub fn is_limited(&self) -> bool {
		self.status.as_ref() == Self::STATUS_LIMITED
	}
}

/// A deliverable of a project.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Component {
	#[serde(default)]
	pub component_id: i64,
	#[serde(default)]
	pub project_id: i64,
	#[serde(default)]
	pub name: Box<str>,
}

impl Component {
	pub fn has_id(&self) -> bool {
		self.component_id > 0
	}
}

/// One recorded build of a component.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Build {
	#[serde(default)]
	pub build_id: i64,
	pub build_ts: Option<Box<str>>,
	#[serde(default)]
	pub project_id: i64,
	#[serde(default)]
	pub component_id: i64,
	#[serde(default)]
	pub component_version: Box<str>,
	pub infractions: Option<Box<str>>,
	pub source: Option<Box<str>>,
}

impl Build {
	pub fn has_id(&self) -> bool {
		self.build_id > 0
	}
}

/// One artifact declared by a build, with the artifact's status as it was
/// at build time and the precomputed verdict.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BuildItem {
	#[serde(default)]
	pub builditem_id: i64,
	#[serde(default)]
	pub build_id: i64,
	#[serde(default)]
	pub group_name: Box<str>,
	#[serde(default)]
	pub artifact_name: Box<str>,
	#[serde(default)]
	pub version_name: Box<str>,
	#[serde(default)]
	pub artifact_status_snapshot: Box<str>,
	#[serde(default)]
	pub allowed: bool,
}

/// Permission record for a non-vendor-licensed LIMITED artifact.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AllowedArtifact {
	#[serde(default)]
	pub allowed_artifact_id: i64,
	#[serde(default)]
	pub project_id: i64,
	#[serde(default)]
	pub artifact_id: i64,
	pub approval_architect: Option<Box<str>>,
	pub approval_ts: Option<Box<str>>,
}

/// Permission record for a vendor-licensed LIMITED artifact.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LicensedArtifact {
	#[serde(default)]
	pub licensed_artifact_id: i64,
	#[serde(default)]
	pub project_id: i64,
	#[serde(default)]
	pub artifact_id: i64,
	pub contract: Option<Box<str>>,
	pub vendor: Option<Box<str>>,
	pub approval_architect: Option<Box<str>>,
	pub approval_ts: Option<Box<str>>,
}

/// One usage row: a project/component/build triple that declares the
/// focused artifact.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectComponentBuild {
	#[serde(default)]
	pub project: Project,
	#[serde(default)]
	pub component: Component,
	#[serde(default)]
	pub build: Build,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn limited_status_is_exact() {
		let mut artifact = Artifact { status: "LIMITED".into(), ..Default::default() };
		assert!(artifact.is_limited());
		artifact.status = "limited".into();
		assert!(!artifact.is_limited());
		artifact.status = "DEPRECATED".into();
		assert!(!artifact.is_limited());
	}

	#[test]
	fn usage_row_parses_nested_entities() {
		let json = r#"{
			"project": { "project_id": 7, "acronym": "CRM" },
			"component": { "component_id": 3, "project_id": 7, "name": "crm-web" },
			"build": { "build_id": 11, "component_id": 3, "project_id": 7, "component_version": "1.4.2" }
		}"#;
		let row: ProjectComponentBuild = serde_json::from_str(json).unwrap();
		assert_eq!(row.project.project_id, 7);
		assert_eq!(row.component.name.as_ref(), "crm-web");
		assert_eq!(row.build.component_version.as_ref(), "1.4.2");
	}

	#[test]
	fn permission_record_omits_unset_fields() {
		let record = AllowedArtifact {
			project_id: 7,
			artifact_id: 21,
			approval_architect: Some("pat".into()),
			..Default::default()
		};
		let json = serde_json::to_string(&record).unwrap();
		assert!(json.contains("\"approval_architect\":\"pat\""));
		assert!(!json.contains("approval_ts"));
	}
}

// vim: ts=4
