//! In-process event hub.
//!
//! One broadcast channel per named event type. Delivery is synchronous and
//! in registration order: every handler live at emit time runs before the
//! emit call returns. There is no replay; a subscriber attached after an
//! emission never sees it (late login listeners query the session instead).
//!
//! Handlers own their errors. The hub never fails an emit; a handler that
//! can fail logs and swallows the failure itself.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use enforcer_types::model::{Artifact, Build, BuildItem, Component, Project};

/// Outcome of a login exchange, broadcast on the `login` channel.
///
/// The bearer token itself stays in the [`TokenStore`](enforcer_types::governance_adapter::TokenStore);
/// it is not carried through the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginNotice {
	Success { username: Box<str> },
	Failed { message: Box<str> },
}

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscriber<T> {
	id: u64,
	handler: Handler<T>,
}

struct ChannelInner<T> {
	name: &'static str,
	next_id: AtomicU64,
	subscribers: RwLock<Vec<Subscriber<T>>>,
}

impl<T> ChannelInner<T> {
	fn unsubscribe(&self, id: u64) {
		self.subscribers.write().retain(|sub| sub.id != id);
	}
}

/// One named broadcast channel.
pub struct Channel<T> {
	inner: Arc<ChannelInner<T>>,
}

impl<T: 'static> Channel<T> {
	fn new(name: &'static str) -> Self {
		Self {
			inner: Arc::new(ChannelInner {
				name,
				next_id: AtomicU64::new(1),
				subscribers: RwLock::new(Vec::new()),
			}),
		}
	}

	pub fn name(&self) -> &'static str {
		self.inner.name
	}

	/// Registers a handler for every subsequent emit on this channel.
	///
	/// The returned guard unsubscribes when dropped (or via
	/// [`Subscription::cancel`]), tying the subscription to the owning
	/// controller's lifetime.
	pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
		let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
		self.inner
			.subscribers
			.write()
			.push(Subscriber { id, handler: Arc::new(handler) });
		tracing::debug!(channel = self.inner.name, id, "subscribed");

		let inner = Arc::downgrade(&self.inner);
		Subscription { cancel: Some(Box::new(move || unsubscribe_weak(&inner, id))) }
	}

	/// Delivers `payload` to every live handler, in registration order.
	///
	/// The subscriber list is snapshotted first, so handlers may subscribe
	/// or unsubscribe during delivery; such changes only affect future
	/// emits, and an unsubscribed handler's in-flight delivery completes.
	pub fn emit(&self, payload: &T) {
		let handlers: Vec<Handler<T>> =
			self.inner.subscribers.read().iter().map(|sub| sub.handler.clone()).collect();
		tracing::debug!(channel = self.inner.name, listeners = handlers.len(), "emit");
		for handler in handlers {
			handler(payload);
		}
	}

	pub fn subscriber_count(&self) -> usize {
		self.inner.subscribers.read().len()
	}
}

fn unsubscribe_weak<T>(inner: &Weak<ChannelInner<T>>, id: u64) {
	if let Some(inner) = inner.upgrade() {
		inner.unsubscribe(id);
	}
}

/// RAII subscription handle. Dropping it releases the handler; releasing
/// twice is a no-op.
pub struct Subscription {
	cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
	/// Explicit early release.
	pub fn cancel(mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl std::fmt::Debug for Subscription {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Subscription").field("live", &self.cancel.is_some()).finish()
	}
}

/// Process-wide state with application lifetime: the full channel
/// catalogue the views coordinate through.
///
/// Selection channels carry the focused entity, or `None` for "selection
/// cleared". Lifecycle channels carry the entity state after the change.
pub struct EventHub {
	pub login: Channel<LoginNotice>,

	// Selection events, used to deal with cascading view dependencies.
	pub project_selected: Channel<Option<Project>>,
	pub project_artifact_selected: Channel<Option<Artifact>>,
	pub build_project_selected: Channel<Option<Project>>,
	pub build_component_selected: Channel<Option<Component>>,
	pub build_build_selected: Channel<Option<Build>>,
	pub build_item_selected: Channel<Option<BuildItem>>,
	pub artifact_selected: Channel<Option<Artifact>>,
	pub artifact_usage_selected: Channel<Option<Artifact>>,

	// Object lifecycle events; the payload is the current object state.
	pub artifact_created: Channel<Artifact>,
	pub artifact_changed: Channel<Artifact>,
	pub artifact_deleted: Channel<Artifact>,
	pub project_created: Channel<Project>,
	pub project_changed: Channel<Project>,
	pub project_deleted: Channel<Project>,
}

impl EventHub {
	pub fn new() -> Arc<Self> {
		Arc::new(Self {
			login: Channel::new("login"),
			project_selected: Channel::new("project_selected"),
			project_artifact_selected: Channel::new("project_artifact_selected"),
			build_project_selected: Channel::new("build_project_selected"),
			build_component_selected: Channel::new("build_component_selected"),
			build_build_selected: Channel::new("build_build_selected"),
			build_item_selected: Channel::new("build_item_selected"),
			artifact_selected: Channel::new("artifact_selected"),
			artifact_usage_selected: Channel::new("artifact_usage_selected"),
			artifact_created: Channel::new("artifact_created"),
			artifact_changed: Channel::new("artifact_changed"),
			artifact_deleted: Channel::new("artifact_deleted"),
			project_created: Channel::new("project_created"),
			project_changed: Channel::new("project_changed"),
			project_deleted: Channel::new("project_deleted"),
		})
	}
}


// vim: ts=4
