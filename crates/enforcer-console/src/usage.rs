//! Artifact usage view and its permission resolution engine.
//!
//! Shows every project/component/build triple using the focused artifact.
//! For a LIMITED artifact the controller additionally resolves which of
//! those projects already hold a permission record, keeps that set in the
//! permitted cache, and drives the two mutually exclusive actions: grant
//! and revoke. The server never pushes permission changes, so after every
//! confirmed mutation the cache is rebuilt by asking again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{SecondsFormat, Utc};
use futures::join;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use enforcer_core::hub::{EventHub, Subscription};
use enforcer_core::selection::{Keyed, Selection};
use enforcer_core::session::Session;
use enforcer_core::state::LoadPhase;
use enforcer_types::governance_adapter::GovernanceAdapter;
use enforcer_types::model::{AllowedArtifact, Artifact, LicensedArtifact, Project, ProjectComponentBuild};
use enforcer_types::prelude::*;

use crate::permitted::PermittedCache;

const USAGE_LOAD_FAILED: &str = "Usage Load Failed";
const PERMITTED_LOAD_FAILED: &str = "Permitted Project Load Failed";

/// Key of a usage row: (project id, component id).
type UsageKey = (i64, i64);

/// Presentation verdict for one usage row. A LIMITED artifact's row whose
/// project is not permitted is flagged, with a distinct variant while the
/// row is the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageHighlight {
	None,
	Flagged,
	FlaggedSelected,
}

enum UsageCmd {
	/// Focus changed: rows, and for a LIMITED artifact the permitted
	/// projects, must be fetched anew.
	Reload { artifact: Artifact, epoch: u64 },
	/// A mutation was confirmed; the permission set must be re-derived
	/// from the server and the remembered selection restored.
	Resync { artifact: Artifact, epoch: u64, restore: Option<UsageKey> },
}

struct UsageState {
	artifact: Option<Artifact>,
	phase: LoadPhase,
	rows: Vec<ProjectComponentBuild>,
	selection: Selection<ProjectComponentBuild>,
	permitted: PermittedCache,
	may_grant: bool,
	may_revoke: bool,
	last_error: Option<Notice>,
}

impl UsageState {
	fn new() -> Self {
		Self {
			artifact: None,
			phase: LoadPhase::Empty,
			rows: Vec::new(),
			selection: Selection::new(),
			permitted: PermittedCache::new(),
			may_grant: false,
			may_revoke: false,
			last_error: None,
		}
	}

	/// Grant is possible iff the focused artifact is LIMITED and the
	/// selected row's project is not yet permitted; revoke iff it is.
	/// Without a LIMITED artifact or a selected row, neither applies.
	fn recompute_entitlements(&mut self) {
		let limited = self.artifact.as_ref().is_some_and(Artifact::is_limited);
		match (limited, self.selection.get()) {
			(true, Some(row)) => {
				let permitted = self.permitted.contains(row.project.project_id);
				self.may_grant = !permitted;
				self.may_revoke = permitted;
			}
			_ => {
				self.may_grant = false;
				self.may_revoke = false;
			}
		}
	}
}

pub struct ArtifactUsageController {
	inner: Arc<UsageInner>,
	_subs: Vec<Subscription>,
}

struct UsageInner {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	session: Arc<Session>,
	state: Mutex<UsageState>,
	epoch: AtomicU64,
	tx: flume::Sender<UsageCmd>,
	rx: flume::Receiver<UsageCmd>,
}

impl ArtifactUsageController {
	pub fn new(
		hub: &Arc<EventHub>,
		adapter: Arc<dyn GovernanceAdapter>,
		session: Arc<Session>,
	) -> Self {
		let (tx, rx) = flume::unbounded();
		let inner = Arc::new(UsageInner {
			adapter,
			hub: hub.clone(),
			session,
			state: Mutex::new(UsageState::new()),
			epoch: AtomicU64::new(0),
			tx,
			rx,
		});

		let focus_inner = inner.clone();
		let subs =
			vec![hub.artifact_selected.subscribe(move |sel| focus_inner.on_artifact_focus(sel))];
		Self { inner, _subs: subs }
	}

	/// User picked or unpicked a usage row. Entitlements follow the
	/// selection; the current artifact focus is re-broadcast either way.
	pub fn on_usage_row_activated(&self, row: ProjectComponentBuild, selected: bool) {
		let focus_artifact = {
			let mut state = self.inner.state.lock();
			if selected {
				state.selection.activate(row);
			} else {
				state.selection.deactivate(&row);
			}
			state.recompute_entitlements();
			state.artifact.clone()
		};
		self.inner.hub.artifact_usage_selected.emit(&focus_artifact);
	}

	/// Record a permission for the selected row's project, routed to the
	/// allowed or licensed table by the artifact's vendor flag. The cache
	/// is not updated optimistically; a confirmed create queues a resync.
	pub async fn grant_permission(&self) -> EnfResult<()> {
		self.inner.grant().await
	}

	/// Remove the selected row's permission record, identified by
	/// (project, artifact) and routed by the same vendor flag.
	pub async fn revoke_permission(&self) -> EnfResult<()> {
		self.inner.revoke().await
	}

	/// Process queued reloads/resyncs until the queue is momentarily
	/// empty. Returns whether anything was processed.
	pub async fn drain(&self) -> bool {
		let mut processed = false;
		while let Ok(cmd) = self.inner.rx.try_recv() {
			processed = true;
			self.inner.handle(cmd).await;
		}
		processed
	}

	/// Long-running pump for production wiring.
	pub fn spawn_pump(&self) -> JoinHandle<()> {
		let inner = self.inner.clone();
		tokio::spawn(async move {
			while let Ok(cmd) = inner.rx.recv_async().await {
				inner.handle(cmd).await;
			}
		})
	}

	pub fn focused_artifact(&self) -> Option<Artifact> {
		self.inner.state.lock().artifact.clone()
	}

	pub fn selected_usage(&self) -> Option<ProjectComponentBuild> {
		self.inner.state.lock().selection.get().cloned()
	}

	pub fn rows(&self) -> Vec<ProjectComponentBuild> {
		self.inner.state.lock().rows.clone()
	}

	pub fn phase(&self) -> LoadPhase {
		self.inner.state.lock().phase
	}

	pub fn may_grant(&self) -> bool {
		self.inner.state.lock().may_grant
	}

	pub fn may_revoke(&self) -> bool {
		self.inner.state.lock().may_revoke
	}

	pub fn cache_contains(&self, project_id: i64) -> bool {
		self.inner.state.lock().permitted.contains(project_id)
	}

	pub fn permitted_count(&self) -> usize {
		self.inner.state.lock().permitted.permitted_count()
	}

	pub fn last_error(&self) -> Option<Notice> {
		self.inner.state.lock().last_error.clone()
	}

	/// Presentation rule, recomputed against the current cache.
	pub fn highlight_for(&self, row: &ProjectComponentBuild) -> UsageHighlight {
		let state = self.inner.state.lock();
		let limited = state.artifact.as_ref().is_some_and(Artifact::is_limited);
		if limited && !state.permitted.contains(row.project.project_id) {
			if state.selection.is(row.key()) {
				UsageHighlight::FlaggedSelected
			} else {
				UsageHighlight::Flagged
			}
		} else {
			UsageHighlight::None
		}
	}
}

impl UsageInner {
	fn on_artifact_focus(&self, sel: &Option<Artifact>) {
		let epoch = self.epoch.fetch_add(1, Ordering::Relaxed) + 1;
		let mut state = self.state.lock();
		state.rows.clear();
		state.selection.clear();
		state.may_grant = false;
		state.may_revoke = false;
		state.permitted = PermittedCache::new();
		state.phase = LoadPhase::Empty;
		match sel {
			Some(artifact) if artifact.has_id() => {
				state.artifact = Some(artifact.clone());
				state.phase = LoadPhase::Loading;
				let _ = self.tx.send(UsageCmd::Reload { artifact: artifact.clone(), epoch });
			}
			_ => state.artifact = None,
		}
	}

	fn current_epoch(&self) -> u64 {
		self.epoch.load(Ordering::Relaxed)
	}

	async fn handle(&self, cmd: UsageCmd) {
		match cmd {
			UsageCmd::Reload { artifact, epoch } => self.reload(artifact, epoch).await,
			UsageCmd::Resync { artifact, epoch, restore } => {
				self.resync(artifact, epoch, restore).await;
			}
		}
	}

	/// The usage rows and the permitted set are fetched concurrently, and
	/// the state is only touched after both have completed. The old view
	/// raced these two fetches and papered over the gap with chained
	/// timers; sequencing on actual completion removes the race.
	async fn reload(&self, artifact: Artifact, epoch: u64) {
		if epoch != self.current_epoch() {
			return;
		}
		let usages = self.adapter.find_usages_by_artifact(artifact.artifact_id);
		if artifact.is_limited() {
			let (rows, permitted) =
				join!(usages, self.adapter.find_permitted_projects(artifact.artifact_id));
			self.install(epoch, Some(rows), Some(permitted), None);
		} else {
			// Permission gating is inapplicable; the cache stays at the
			// bare sentinel.
			let rows = usages.await;
			self.install(epoch, Some(rows), None, None);
		}
	}

	async fn resync(&self, artifact: Artifact, epoch: u64, restore: Option<UsageKey>) {
		if epoch != self.current_epoch() {
			return;
		}
		let permitted = self.adapter.find_permitted_projects(artifact.artifact_id).await;
		self.install(epoch, None, Some(permitted), restore);
	}

	/// Single sink for fetch completions. A completion whose epoch was
	/// superseded by a newer focus change is dropped whole.
	fn install(
		&self,
		epoch: u64,
		rows: Option<EnfResult<Vec<ProjectComponentBuild>>>,
		permitted: Option<EnfResult<Vec<Project>>>,
		restore: Option<UsageKey>,
	) {
		let mut state = self.state.lock();
		if epoch != self.current_epoch() {
			debug!(epoch, "dropping superseded usage completion");
			return;
		}
		if let Some(rows) = rows {
			match rows {
				Ok(rows) => {
					debug!(rows = rows.len(), "usage rows settled");
					state.rows = rows;
					state.phase = LoadPhase::Loaded;
					state.last_error = None;
				}
				Err(err) => {
					warn!(error = %err, "usage row fetch failed");
					state.rows.clear();
					state.phase = LoadPhase::Empty;
					state.last_error = Some(Notice::new(USAGE_LOAD_FAILED, &err));
				}
			}
		}
		match permitted {
			Some(Ok(projects)) => {
				state.permitted.rebuild(projects.iter().map(|p| p.project_id));
			}
			Some(Err(err)) => {
				warn!(error = %err, "permitted project fetch failed");
				state.permitted = PermittedCache::new();
				state.last_error = Some(Notice::new(PERMITTED_LOAD_FAILED, &err));
			}
			None => state.permitted = PermittedCache::new(),
		}
		if let Some(key) = restore {
			if state.selection.is_empty() {
				if let Some(row) = state.rows.iter().find(|r| r.key() == key).cloned() {
					state.selection.activate(row);
				}
			}
		}
		state.recompute_entitlements();
	}

	/// The focused artifact, the selected row, and the entitlement check
	/// for the requested action, snapshotted under one lock.
	fn mutation_target(&self, granting: bool) -> EnfResult<(Artifact, ProjectComponentBuild, u64)> {
		let state = self.state.lock();
		let artifact = state
			.artifact
			.clone()
			.ok_or_else(|| Error::ValidationError("no artifact is focused".into()))?;
		let row = state
			.selection
			.get()
			.cloned()
			.ok_or_else(|| Error::ValidationError("no usage row is selected".into()))?;
		let entitled = if granting { state.may_grant } else { state.may_revoke };
		if !entitled {
			return Err(Error::ValidationError(format!(
				"{} is not applicable for project {}",
				if granting { "grant" } else { "revoke" },
				row.project.project_id
			)));
		}
		Ok((artifact, row, self.current_epoch()))
	}

	async fn grant(&self) -> EnfResult<()> {
		let (artifact, row, epoch) = self.mutation_target(true)?;
		let architect = self.session.operator().ok_or(Error::Unauthorized)?;
		let stamp: Box<str> = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true).into();

		if artifact.is_vendor_licensed {
			let record = LicensedArtifact {
				project_id: row.project.project_id,
				artifact_id: artifact.artifact_id,
				approval_architect: Some(architect),
				approval_ts: Some(stamp),
				..Default::default()
			};
			let outcome = self.adapter.create_licensed_artifact(&record).await.map(drop);
			self.after_mutation(outcome, &artifact, row.key(), epoch, "Insert of LicensedArtifact Failed")
		} else {
			let record = AllowedArtifact {
				project_id: row.project.project_id,
				artifact_id: artifact.artifact_id,
				approval_architect: Some(architect),
				approval_ts: Some(stamp),
				..Default::default()
			};
			let outcome = self.adapter.create_allowed_artifact(&record).await.map(drop);
			self.after_mutation(outcome, &artifact, row.key(), epoch, "Insert of AllowedArtifact Failed")
		}
	}

	async fn revoke(&self) -> EnfResult<()> {
		let (artifact, row, epoch) = self.mutation_target(false)?;

		if artifact.is_vendor_licensed {
			let outcome = self
				.adapter
				.delete_licensed_artifact(row.project.project_id, artifact.artifact_id)
				.await;
			self.after_mutation(outcome, &artifact, row.key(), epoch, "Delete of LicensedArtifact Failed")
		} else {
			let outcome = self
				.adapter
				.delete_allowed_artifact(row.project.project_id, artifact.artifact_id)
				.await;
			self.after_mutation(outcome, &artifact, row.key(), epoch, "Delete of AllowedArtifact Failed")
		}
	}

	/// A confirmed mutation queues the resync; a failed one records the
	/// notice and leaves cache and rows untouched.
	fn after_mutation(
		&self,
		outcome: EnfResult<()>,
		artifact: &Artifact,
		restore: UsageKey,
		epoch: u64,
		fail_title: &str,
	) -> EnfResult<()> {
		match outcome {
			Ok(()) => {
				let _ = self.tx.send(UsageCmd::Resync {
					artifact: artifact.clone(),
					epoch,
					restore: Some(restore),
				});
				Ok(())
			}
			Err(err) => {
				self.state.lock().last_error = Some(Notice::new(fail_title, &err));
				Err(err)
			}
		}
	}
}

// vim: ts=4
