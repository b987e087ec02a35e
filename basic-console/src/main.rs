use std::env;
use std::sync::Arc;

use enforcer_console::Console;
use enforcer_core::hub::EventHub;
use enforcer_core::session::Session;
use enforcer_types::governance_adapter::{GovernanceAdapter, TokenStore};
use governance_adapter_http::GovernanceAdapterHttp;
use tracing::{error, info};

pub struct Config {
	pub api_url: String,
	pub username: String,
	pub password: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let config = Config {
		api_url: env::var("ENFORCER_API_URL").unwrap_or("http://localhost:8080".to_string()),
		username: env::var("ENFORCER_USER").unwrap_or_default(),
		password: env::var("ENFORCER_PASS").unwrap_or_default(),
	};

	let tokens = TokenStore::default();
	let adapter: Arc<dyn GovernanceAdapter> =
		Arc::new(GovernanceAdapterHttp::new(&config.api_url, tokens.clone()).unwrap());
	let hub = EventHub::new();
	let session = Arc::new(Session::new(adapter.clone(), hub.clone(), tokens));

	let console = Console::new(&hub, adapter, session.clone());

	if let Err(err) = session.login(&config.username, &config.password).await {
		error!("login against {} failed: {}", config.api_url, err);
		return;
	}
	console.drain().await;

	info!(
		projects = console.project_list.rows().len(),
		"console ready; project inventory loaded"
	);

	// Walk the governance views once so a headless run exercises the
	// whole cascade: focus the first project and the first LIMITED
	// artifact, then report what the permission engine resolved.
	if let Some(project) = console.build_projects.rows().into_iter().next() {
		console.build_projects.on_row_activated(project, true);
		console.drain().await;
		info!(
			components = console.build_components.rows().len(),
			"component inventory for the first project"
		);
	}

	console.artifact_list.load_by_status("LIMITED");
	console.drain().await;
	if let Some(artifact) = console.artifact_list.rows().into_iter().next() {
		let name = artifact.artifact_name.clone();
		console.artifact_list.on_row_activated(artifact, true);
		console.drain().await;
		info!(
			artifact = %name,
			usages = console.artifact_usage.rows().len(),
			permitted = console.artifact_usage.permitted_count(),
			"permission state for the first LIMITED artifact"
		);
	}
}

// vim: ts=4
