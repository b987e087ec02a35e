//! Cascade fetch engine shared by the grid controllers.
//!
//! An upstream selection change unconditionally resets the list, then, for
//! a usable identity, queues a fetch. Fetches drain through one flume queue
//! per list, so a controller's reloads are processed strictly in the order
//! they were requested; an epoch stamp lets a completion that was
//! superseded by a newer upstream change be dropped instead of installing
//! stale rows.
//!
//! Emission/delivery on the hub never suspends; the fetch is the only
//! suspension point, and it happens here on the pump, not inside a
//! subscription handler.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use enforcer_types::prelude::*;

use crate::selection::Keyed;
use crate::state::ListState;

struct Fetch<K> {
	epoch: u64,
	parent: K,
}

/// List state plus its reload queue. `K` is the parent identity the fetch
/// needs; master lists (no parent) use `()`.
pub struct CascadeList<T: Keyed, K = i64> {
	state: Mutex<ListState<T>>,
	epoch: AtomicU64,
	tx: flume::Sender<Fetch<K>>,
	rx: flume::Receiver<Fetch<K>>,
}

impl<T: Keyed, K> Default for CascadeList<T, K> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: Keyed, K> CascadeList<T, K> {
	pub fn new() -> Self {
		let (tx, rx) = flume::unbounded();
		Self { state: Mutex::new(ListState::new()), epoch: AtomicU64::new(0), tx, rx }
	}

	fn bump_epoch(&self) -> u64 {
		self.epoch.fetch_add(1, Ordering::Relaxed) + 1
	}

	fn current_epoch(&self) -> u64 {
		self.epoch.load(Ordering::Relaxed)
	}

	/// Upstream selection changed: reset unconditionally, then fetch only
	/// when the payload carried a usable identity.
	pub fn on_upstream(&self, parent: Option<K>) {
		let epoch = self.bump_epoch();
		let mut state = self.state.lock();
		state.reset();
		if let Some(parent) = parent {
			state.begin_loading();
			let _ = self.tx.send(Fetch { epoch, parent });
		}
	}

	/// Read access to the list state.
	pub fn with_state<R>(&self, read: impl FnOnce(&ListState<T>) -> R) -> R {
		read(&self.state.lock())
	}

	/// Mutation hook for controllers that patch rows directly after a
	/// confirmed CRUD success.
	pub fn with_state_mut<R>(&self, mutate: impl FnOnce(&mut ListState<T>) -> R) -> R {
		mutate(&mut self.state.lock())
	}
}

impl<T: Keyed + Clone, K> CascadeList<T, K> {
	/// Row (de)activation under the single-selection tie-break. Returns
	/// the focus after the change, which is what the controller broadcasts.
	pub fn activate_row(&self, row: T, selected: bool) -> Option<T> {
		let mut state = self.state.lock();
		if selected {
			state.selection.activate(row);
		} else {
			state.selection.deactivate(&row);
		}
		state.selection.get().cloned()
	}

	pub fn selected(&self) -> Option<T> {
		self.state.lock().selection.get().cloned()
	}

	pub fn rows(&self) -> Vec<T> {
		self.state.lock().rows.clone()
	}
}

impl<T: Keyed, K: Copy> CascadeList<T, K> {
	/// Process queued fetches until the queue is momentarily empty.
	/// Returns whether anything was processed. Tests settle with this;
	/// [`CascadeList::run`] wraps the same path for production pumps.
	pub async fn drain<F, Fut>(&self, title: &str, fetch: F) -> bool
	where
		F: Fn(K) -> Fut,
		Fut: Future<Output = EnfResult<Vec<T>>>,
	{
		let mut processed = false;
		while let Ok(cmd) = self.rx.try_recv() {
			processed = true;
			self.fetch_one(cmd, title, &fetch).await;
		}
		processed
	}

	/// Long-running pump for production wiring.
	pub async fn run<F, Fut>(&self, title: &str, fetch: F)
	where
		F: Fn(K) -> Fut,
		Fut: Future<Output = EnfResult<Vec<T>>>,
	{
		while let Ok(cmd) = self.rx.recv_async().await {
			self.fetch_one(cmd, title, &fetch).await;
		}
	}

	async fn fetch_one<F, Fut>(&self, cmd: Fetch<K>, title: &str, fetch: &F)
	where
		F: Fn(K) -> Fut,
		Fut: Future<Output = EnfResult<Vec<T>>>,
	{
		if cmd.epoch != self.current_epoch() {
			// Superseded before it started.
			return;
		}
		let result = fetch(cmd.parent).await;
		let mut state = self.state.lock();
		if cmd.epoch != self.current_epoch() {
			// A newer upstream change arrived while the fetch was in
			// flight; its own reload owns the list now.
			return;
		}
		match result {
			Ok(rows) => {
				debug!(rows = rows.len(), "cascade fetch settled");
				state.loaded(rows);
			}
			Err(err) => {
				warn!(error = %err, title, "cascade fetch failed");
				state.failed(Notice::new(title, &err));
			}
		}
	}
}


// vim: ts=4
