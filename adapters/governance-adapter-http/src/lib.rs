//! HTTP implementation of the governance adapter.
//!
//! Talks to the Enforcer management services over REST. Every request
//! except the login exchange carries the bearer token from the shared
//! [`TokenStore`]. Success bodies are JSON; non-success statuses carry an
//! RFC 7807 style body that is surfaced verbatim as [`Error::Api`]. There
//! are no automatic retries anywhere; a retry is the user repeating the
//! action.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request, StatusCode, header};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use enforcer::governance_adapter::{GovernanceAdapter, TokenStore};
use enforcer::model::{
	AllowedArtifact, Artifact, Build, BuildItem, Component, LicensedArtifact, Project,
	ProjectComponentBuild,
};
use enforcer::prelude::*;

type HttpsClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

#[derive(Serialize)]
struct Credentials<'a> {
	username: &'a str,
	password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
	token: Box<str>,
}

/// Composite key the permission-revocation endpoints take in the body;
/// the caller may not hold the record id.
#[derive(Serialize)]
struct PermissionKey {
	project_id: i64,
	artifact_id: i64,
}

pub struct GovernanceAdapterHttp {
	base_url: Box<str>,
	tokens: TokenStore,
	client: HttpsClient,
}

impl GovernanceAdapterHttp {
	pub fn new(base_url: &str, tokens: TokenStore) -> EnfResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|err| Error::Internal(format!("TLS root store: {}", err)))?
			.https_or_http()
			.enable_http1()
			.build();
		let client = Client::builder(TokioExecutor::new()).build(connector);
		Ok(Self { base_url: base_url.trim_end_matches('/').into(), tokens, client })
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url, path)
	}

	async fn dispatch(
		&self,
		method: Method,
		path: &str,
		body: Option<String>,
	) -> EnfResult<(StatusCode, Bytes)> {
		let url = self.url(path);
		debug!(%url, method = %method, "governance request");

		let mut builder =
			Request::builder().method(method).uri(&url).header(header::ACCEPT, "application/json");
		if let Some(token) = self.tokens.get() {
			builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
		}
		let request = match body {
			Some(json) => builder
				.header(header::CONTENT_TYPE, "application/json")
				.body(Full::new(Bytes::from(json))),
			None => builder.body(Full::default()),
		}
		.map_err(|err| Error::Internal(format!("request build: {}", err)))?;

		let response =
			self.client.request(request).await.map_err(|err| Error::Transport(err.to_string()))?;
		let status = response.status();
		let bytes = response
			.into_body()
			.collect()
			.await
			.map_err(|err| Error::Transport(err.to_string()))?
			.to_bytes();
		debug!(%url, status = status.as_u16(), bytes = bytes.len(), "governance response");
		Ok((status, bytes))
	}

	/// GET/POST/PUT with a JSON answer on the expected status.
	async fn send<Res: DeserializeOwned>(
		&self,
		method: Method,
		path: &str,
		body: Option<String>,
		expect: StatusCode,
	) -> EnfResult<Res> {
		let (status, bytes) = self.dispatch(method, path, body).await?;
		if status == expect {
			serde_json::from_slice(&bytes).map_err(|_| Error::Parse)
		} else {
			Err(Error::Api(decode_problem(status, &bytes)))
		}
	}

	/// Mutation whose answer body does not matter.
	async fn send_unit(
		&self,
		method: Method,
		path: &str,
		body: Option<String>,
		expect: StatusCode,
	) -> EnfResult<()> {
		let (status, bytes) = self.dispatch(method, path, body).await?;
		if status == expect { Ok(()) } else { Err(Error::Api(decode_problem(status, &bytes))) }
	}
}

/// A non-success answer should carry a problem document; when it does not,
/// synthesize one from the status line so the user still sees something.
fn decode_problem(status: StatusCode, bytes: &[u8]) -> Problem {
	serde_json::from_slice::<Problem>(bytes).unwrap_or_else(|_| Problem {
		kind: "about:blank".into(),
		title: status.canonical_reason().unwrap_or("HTTP error").into(),
		status: status.as_u16(),
		detail: String::from_utf8_lossy(bytes).into(),
	})
}

impl std::fmt::Debug for GovernanceAdapterHttp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("GovernanceAdapterHttp").field("base_url", &self.base_url).finish()
	}
}

#[async_trait]
impl GovernanceAdapter for GovernanceAdapterHttp {
	async fn authenticate(&self, username: &str, password: &str) -> EnfResult<Box<str>> {
		let body = serde_json::to_string(&Credentials { username, password })?;
		let response: TokenResponse =
			self.send(Method::POST, "/authenticate", Some(body), StatusCode::OK).await?;
		Ok(response.token)
	}

	async fn list_projects(&self) -> EnfResult<Vec<Project>> {
		self.send(Method::GET, "/projects", None, StatusCode::OK).await
	}

	async fn create_project(&self, project: &Project) -> EnfResult<Project> {
		let body = serde_json::to_string(project)?;
		self.send(Method::POST, "/projects", Some(body), StatusCode::CREATED).await
	}

	async fn update_project(&self, project: &Project) -> EnfResult<Project> {
		let body = serde_json::to_string(project)?;
		self.send(Method::PUT, "/projects", Some(body), StatusCode::OK).await
	}

	async fn delete_project(&self, project_id: i64) -> EnfResult<()> {
		self.send_unit(Method::DELETE, &format!("/projects/{}", project_id), None, StatusCode::OK)
			.await
	}

	async fn find_permitted_projects(&self, artifact_id: i64) -> EnfResult<Vec<Project>> {
		self.send(
			Method::GET,
			&format!("/projects/findPermittedProjectsByArtifactId?artifactId={}", artifact_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn find_artifacts_by_status(&self, status: &str) -> EnfResult<Vec<Artifact>> {
		self.send(
			Method::GET,
			&format!("/artifacts/findByStatus?status={}", status),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn find_artifacts_by_project(&self, project_id: i64) -> EnfResult<Vec<Artifact>> {
		self.send(
			Method::GET,
			&format!("/artifacts/findByProjectId?projectId={}", project_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn create_artifact(&self, artifact: &Artifact) -> EnfResult<Artifact> {
		let body = serde_json::to_string(artifact)?;
		self.send(Method::POST, "/artifacts", Some(body), StatusCode::CREATED).await
	}

	async fn update_artifact(&self, artifact: &Artifact) -> EnfResult<Artifact> {
		let body = serde_json::to_string(artifact)?;
		self.send(
			Method::PUT,
			&format!("/artifacts/{}", artifact.artifact_id),
			Some(body),
			StatusCode::OK,
		)
		.await
	}

	async fn delete_artifact(&self, artifact_id: i64) -> EnfResult<()> {
		self.send_unit(Method::DELETE, &format!("/artifacts/{}", artifact_id), None, StatusCode::OK)
			.await
	}

	async fn find_components_by_project(&self, project_id: i64) -> EnfResult<Vec<Component>> {
		self.send(
			Method::GET,
			&format!("/components/findByProjectId?projectId={}", project_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn find_builds_by_component(&self, component_id: i64) -> EnfResult<Vec<Build>> {
		self.send(
			Method::GET,
			&format!("/builds/findByComponentId?componentId={}", component_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn find_build_items_by_build(&self, build_id: i64) -> EnfResult<Vec<BuildItem>> {
		self.send(
			Method::GET,
			&format!("/builditems/findByBuildId?buildId={}", build_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn find_usages_by_artifact(
		&self,
		artifact_id: i64,
	) -> EnfResult<Vec<ProjectComponentBuild>> {
		self.send(
			Method::GET,
			&format!(
				"/experimental/findProjectComponentBuildsByArtifactId?artifactId={}",
				artifact_id
			),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn find_allowed_by_project(&self, project_id: i64) -> EnfResult<Vec<AllowedArtifact>> {
		self.send(
			Method::GET,
			&format!("/allowedartifacts/findByProjectId?projectId={}", project_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn create_allowed_artifact(
		&self,
		record: &AllowedArtifact,
	) -> EnfResult<AllowedArtifact> {
		let body = serde_json::to_string(record)?;
		self.send(Method::POST, "/allowedartifacts", Some(body), StatusCode::CREATED).await
	}

	async fn delete_allowed_artifact(&self, project_id: i64, artifact_id: i64) -> EnfResult<()> {
		let body = serde_json::to_string(&PermissionKey { project_id, artifact_id })?;
		self.send_unit(
			Method::POST,
			"/allowedartifacts/deleteAllowedArtifactByProjectIdAndArtifactId",
			Some(body),
			StatusCode::OK,
		)
		.await
	}

	async fn find_licensed_by_project(&self, project_id: i64) -> EnfResult<Vec<LicensedArtifact>> {
		self.send(
			Method::GET,
			&format!("/licensedartifacts/findByProjectId?projectId={}", project_id),
			None,
			StatusCode::OK,
		)
		.await
	}

	async fn create_licensed_artifact(
		&self,
		record: &LicensedArtifact,
	) -> EnfResult<LicensedArtifact> {
		let body = serde_json::to_string(record)?;
		self.send(Method::POST, "/licensedartifacts", Some(body), StatusCode::CREATED).await
	}

	async fn delete_licensed_artifact(&self, project_id: i64, artifact_id: i64) -> EnfResult<()> {
		let body = serde_json::to_string(&PermissionKey { project_id, artifact_id })?;
		self.send_unit(
			Method::POST,
			"/licensedartifacts/deleteLicensedArtifactByProjectIdAndArtifactId",
			Some(body),
			StatusCode::OK,
		)
		.await
	}
}


// vim: ts=4
