//! Permission resolution: gating, table routing, and the grant/revoke
//! round trip with its cache resynchronization.

mod common;

use std::sync::atomic::Ordering;

use common::fixtures::{TestConsole, artifact, project, usage_row};

use enforcer_console::usage::UsageHighlight;
use enforcer_core::state::LoadPhase;

/// Seed one artifact with usage rows for projects 7 and 12, with the given
/// permitted set, and focus it.
async fn focus_artifact(harness: &TestConsole, status: &str, vendor: bool, permitted: &[i64]) {
	let subject = artifact(21, status, vendor);
	harness.mock.artifacts.lock().push(subject.clone());
	harness
		.mock
		.usages
		.lock()
		.insert(21, vec![usage_row(7, 70, 700), usage_row(12, 120, 1200)]);
	for &project_id in permitted {
		harness
			.mock
			.permitted
			.lock()
			.entry(21)
			.or_default()
			.push(project(project_id, &format!("P{}", project_id)));
	}
	harness.login().await;
	harness.console.artifact_list.load_by_status(status);
	harness.console.drain().await;
	harness.console.artifact_list.on_row_activated(subject, true);
	harness.console.drain().await;
}

#[tokio::test]
async fn non_limited_artifact_disables_gating() {
	let harness = TestConsole::new();
	// Even with permitted data lying around, a non-LIMITED artifact never
	// gates: the cache stays at the bare sentinel and both actions are off
	// for every row.
	focus_artifact(&harness, "APPROVED", false, &[7]).await;
	let usage = &harness.console.artifact_usage;

	assert_eq!(usage.rows().len(), 2);
	assert_eq!(usage.permitted_count(), 0);

	for row in usage.rows() {
		usage.on_usage_row_activated(row.clone(), true);
		assert!(!usage.may_grant());
		assert!(!usage.may_revoke());
		assert_eq!(usage.highlight_for(&row), UsageHighlight::None);
	}
}

#[tokio::test]
async fn limited_artifact_grants_and_revokes_are_mutually_exclusive() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[12]).await;
	let usage = &harness.console.artifact_usage;

	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	assert!(usage.may_grant());
	assert!(!usage.may_revoke());

	usage.on_usage_row_activated(usage_row(12, 120, 1200), true);
	assert!(!usage.may_grant());
	assert!(usage.may_revoke());
}

#[tokio::test]
async fn grant_round_trip_flips_the_buttons() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[]).await;
	let usage = &harness.console.artifact_usage;

	assert_eq!(usage.permitted_count(), 0);
	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	assert!(usage.may_grant());
	assert!(!usage.may_revoke());

	usage.grant_permission().await.unwrap();

	// The create is routed to the allowed table, stamped with the
	// operator, and the cache is not touched until the resync lands.
	let records = harness.mock.allowed_records.lock().clone();
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].project_id, 7);
	assert_eq!(records[0].artifact_id, 21);
	assert_eq!(records[0].approval_architect.as_deref(), Some("pat"));
	assert!(records[0].approval_ts.is_some());
	assert!(harness.mock.licensed_records.lock().is_empty());
	assert!(!usage.cache_contains(7));

	harness.console.drain().await;

	assert!(usage.cache_contains(7));
	assert_eq!(usage.selected_usage().map(|r| r.project.project_id), Some(7));
	assert!(!usage.may_grant());
	assert!(usage.may_revoke());

	// Re-selecting the same row reads the same answer from the cache.
	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	assert!(!usage.may_grant());
	assert!(usage.may_revoke());
}

#[tokio::test]
async fn revoke_round_trip_clears_the_permission() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[7]).await;
	let usage = &harness.console.artifact_usage;

	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	assert!(usage.may_revoke());

	usage.revoke_permission().await.unwrap();
	harness.console.drain().await;

	assert_eq!(*harness.mock.deleted_allowed.lock(), vec![(7, 21)]);
	assert!(!usage.cache_contains(7));
	assert!(usage.may_grant());
	assert!(!usage.may_revoke());
}

#[tokio::test]
async fn vendor_licensed_artifacts_route_to_the_licensed_table() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", true, &[]).await;
	let usage = &harness.console.artifact_usage;

	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	usage.grant_permission().await.unwrap();
	harness.console.drain().await;

	assert!(harness.mock.allowed_records.lock().is_empty());
	assert_eq!(harness.mock.licensed_records.lock().len(), 1);
	assert!(usage.cache_contains(7));

	usage.revoke_permission().await.unwrap();
	harness.console.drain().await;

	assert!(harness.mock.deleted_allowed.lock().is_empty());
	assert_eq!(*harness.mock.deleted_licensed.lock(), vec![(7, 21)]);
	assert!(!usage.cache_contains(7));
}

#[tokio::test]
async fn failed_grant_leaves_state_unchanged() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[]).await;
	let usage = &harness.console.artifact_usage;

	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	harness.mock.fail_mutations.store(true, Ordering::Relaxed);

	let err = usage.grant_permission().await.unwrap_err();
	assert!(err.to_string().contains("409"));
	harness.console.drain().await;

	assert_eq!(usage.permitted_count(), 0);
	assert!(usage.may_grant());
	assert!(!usage.may_revoke());
	let notice = usage.last_error().unwrap();
	assert_eq!(notice.title.as_ref(), "Insert of AllowedArtifact Failed");
}

#[tokio::test]
async fn grant_without_entitlement_is_rejected_client_side() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[7]).await;
	let usage = &harness.console.artifact_usage;

	// Project 7 is already permitted; grant does not apply.
	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	assert!(usage.grant_permission().await.is_err());
	assert!(harness.mock.allowed_records.lock().is_empty());
}

#[tokio::test]
async fn resync_superseded_by_a_new_focus_is_dropped() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[]).await;
	let other = artifact(22, "LIMITED", false);
	harness.mock.artifacts.lock().push(other.clone());
	harness.mock.usages.lock().insert(22, vec![usage_row(30, 300, 3000)]);
	let usage = &harness.console.artifact_usage;

	usage.on_usage_row_activated(usage_row(7, 70, 700), true);
	usage.grant_permission().await.unwrap();

	// Focus moves on before the resync runs; the late completion must not
	// leak artifact 21's permission set into artifact 22's view.
	harness.console.artifact_list.on_row_activated(other, true);
	harness.console.drain().await;

	let usage = &harness.console.artifact_usage;
	assert_eq!(usage.focused_artifact().map(|a| a.artifact_id), Some(22));
	assert_eq!(usage.rows().len(), 1);
	assert!(!usage.cache_contains(7));
	assert_eq!(usage.permitted_count(), 0);
}

#[tokio::test]
async fn flagged_rows_follow_the_cache() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[12]).await;
	let usage = &harness.console.artifact_usage;

	let unpermitted = usage_row(7, 70, 700);
	let permitted = usage_row(12, 120, 1200);

	assert_eq!(usage.highlight_for(&unpermitted), UsageHighlight::Flagged);
	assert_eq!(usage.highlight_for(&permitted), UsageHighlight::None);

	usage.on_usage_row_activated(unpermitted.clone(), true);
	assert_eq!(usage.highlight_for(&unpermitted), UsageHighlight::FlaggedSelected);

	// After a grant resyncs the cache, the flag must be recomputed away.
	usage.grant_permission().await.unwrap();
	harness.console.drain().await;
	assert_eq!(usage.highlight_for(&unpermitted), UsageHighlight::None);
}

#[tokio::test]
async fn empty_cache_sentinel_is_never_a_real_project() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[]).await;
	let usage = &harness.console.artifact_usage;

	// The cache was computed (artifact focused, rows loaded) yet holds no
	// real project; the sentinel must not read as one.
	assert!(usage.focused_artifact().is_some());
	assert_eq!(usage.phase(), LoadPhase::Loaded);
	assert_eq!(usage.permitted_count(), 0);
	assert!(!usage.cache_contains(-1));
	assert!(!usage.cache_contains(0));
	assert!(!usage.cache_contains(7));
}

#[tokio::test]
async fn permitted_fetch_failure_keeps_rows_but_degrades_the_cache() {
	let harness = TestConsole::new();
	harness.mock.fail_permitted_fetch.store(true, Ordering::Relaxed);
	focus_artifact(&harness, "LIMITED", false, &[7]).await;
	let usage = &harness.console.artifact_usage;

	assert_eq!(usage.rows().len(), 2);
	assert_eq!(usage.permitted_count(), 0);
	let notice = usage.last_error().unwrap();
	assert_eq!(notice.title.as_ref(), "Permitted Project Load Failed");
}

#[tokio::test]
async fn usage_selection_rebroadcasts_the_focused_artifact() {
	let harness = TestConsole::new();
	focus_artifact(&harness, "LIMITED", false, &[]).await;

	let (_sub, log) = common::fixtures::probe(&harness.hub.artifact_usage_selected);
	harness.console.artifact_usage.on_usage_row_activated(usage_row(7, 70, 700), true);

	let seen = log.lock().clone();
	assert_eq!(seen.len(), 1);
	assert_eq!(seen[0].as_ref().map(|a| a.artifact_id), Some(21));
}
