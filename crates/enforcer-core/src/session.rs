//! Authenticated session.
//!
//! One bearer token is obtained at login and attached per request by the
//! transport; the session owns the token slot and announces login outcomes
//! on the hub. Listeners that attach late must query the session instead
//! of waiting for a replay that will never come.

use std::sync::Arc;

use parking_lot::RwLock;

use enforcer_types::governance_adapter::{GovernanceAdapter, TokenStore};
use enforcer_types::prelude::*;

use crate::hub::{EventHub, LoginNotice};

pub struct Session {
	adapter: Arc<dyn GovernanceAdapter>,
	hub: Arc<EventHub>,
	tokens: TokenStore,
	username: RwLock<Option<Box<str>>>,
}

impl Session {
	pub fn new(adapter: Arc<dyn GovernanceAdapter>, hub: Arc<EventHub>, tokens: TokenStore) -> Self {
		Self { adapter, hub, tokens, username: RwLock::new(None) }
	}

	/// Exchange credentials for a bearer token and broadcast the outcome.
	///
	/// On failure the token slot is cleared and the error is both
	/// broadcast and returned; the caller decides whether to retry.
	pub async fn login(&self, username: &str, password: &str) -> EnfResult<()> {
		match self.adapter.authenticate(username, password).await {
			Ok(token) => {
				info!(username, "login succeeded");
				self.tokens.set(token);
				*self.username.write() = Some(username.into());
				self.hub.login.emit(&LoginNotice::Success { username: username.into() });
				Ok(())
			}
			Err(err) => {
				warn!(username, error = %err, "login failed");
				self.tokens.clear();
				*self.username.write() = None;
				self.hub.login.emit(&LoginNotice::Failed { message: err.to_string().into() });
				Err(err)
			}
		}
	}

	pub fn logout(&self) {
		self.tokens.clear();
		*self.username.write() = None;
	}

	pub fn is_authenticated(&self) -> bool {
		self.tokens.is_set()
	}

	/// The logged-in operator; recorded as the approving authority on
	/// permission grants.
	pub fn operator(&self) -> Option<Box<str>> {
		self.username.read().clone()
	}
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session")
			.field("authenticated", &self.is_authenticated())
			.field("username", &*self.username.read())
			.finish()
	}
}

// vim: ts=4
