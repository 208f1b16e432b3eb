use super::envelope::{server_message_from_body, ApiEnvelope};
use crate::config::SandboxConfig;
use crate::model::{
    AssignAdvisorRequest, Dashboard, Iteration, Mission, NewIteration, NewMission, NewSubtask,
    Subtask, UserProgress,
};
use crate::session::SessionStore;
use crate::telemetry::RequestMetrics;
use crate::{LucidraError, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Path prefix of the Sandbox API under the configured base URL
pub const API_BASE_PATH: &str = "/api/sandbox";

/// Header carrying the session id in both directions
pub const SESSION_HEADER: &str = "x-session-id";

/// Sandbox API surface, one method per endpoint.
///
/// Every call is a single request/response round trip: no retry, no
/// caching, no batching.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SandboxApi: Send + Sync {
    /// GET /dashboard
    async fn dashboard(&self) -> Result<Dashboard>;

    /// POST /missions
    async fn create_mission(&self, mission: &NewMission) -> Result<Mission>;

    /// GET /missions/:missionId
    async fn get_mission(&self, mission_id: &str) -> Result<Mission>;

    /// POST /missions/:missionId/subtasks
    async fn add_subtask(&self, mission_id: &str, subtask: &NewSubtask) -> Result<Subtask>;

    /// PUT /missions/:missionId/subtasks/:subtaskId/advisor
    async fn assign_advisor(
        &self,
        mission_id: &str,
        subtask_id: &str,
        advisor_id: &str,
    ) -> Result<()>;

    /// POST /missions/:missionId/subtasks/:subtaskId/iterations
    async fn add_iteration(
        &self,
        mission_id: &str,
        subtask_id: &str,
        iteration: &NewIteration,
    ) -> Result<Iteration>;

    /// GET /progress
    async fn user_progress(&self) -> Result<UserProgress>;
}

/// HTTP client that attaches the stored session id to every request and
/// captures any session id the server hands back
#[derive(Clone)]
pub struct SandboxClient {
    http: Client,
    api_root: String,
    session: SessionStore,
    metrics: RequestMetrics,
}

impl SandboxClient {
    pub fn new(cfg: &SandboxConfig, session: SessionStore) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(ms) = cfg.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        let http = builder.build().map_err(|e| {
            LucidraError::ConfigError(format!("Failed to build HTTP client: {e}"))
        })?;
        Ok(Self {
            http,
            api_root: cfg.api_root(),
            session,
            metrics: RequestMetrics::new(),
        })
    }

    /// Build a client whose session storage follows `cfg`
    pub fn from_config(cfg: &SandboxConfig) -> Result<Self> {
        let session = cfg.open_session_store()?;
        Self::new(cfg, session)
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    fn url(&self, segments: &[&str]) -> String {
        let mut url = self.api_root.clone();
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }

    fn capture_session(&self, headers: &HeaderMap) -> Result<()> {
        if let Some(id) = headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
        {
            self.session.save(id)?;
        }
        Ok(())
    }

    async fn send<T, B>(&self, method: Method, url: String, body: Option<&B>) -> Result<ApiEnvelope<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut req = self.http.request(method.clone(), &url);
        if let Some(session_id) = self.session.load()? {
            req = req.header(SESSION_HEADER, session_id);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        debug!(target: "sandbox_client", %method, %url, "Sending request");
        let started = Instant::now();

        let resp = match req.send().await {
            Ok(resp) => resp,
            Err(err) => {
                self.metrics.record(started.elapsed(), false).await;
                warn!(target: "sandbox_client", %method, %url, error = %err, "Request failed");
                return Err(LucidraError::TransportError(err.to_string()));
            }
        };

        self.capture_session(resp.headers())?;

        let status = resp.status();
        let text = match resp.text().await {
            Ok(text) => text,
            Err(err) => {
                self.metrics.record(started.elapsed(), false).await;
                return Err(LucidraError::TransportError(err.to_string()));
            }
        };

        if !status.is_success() {
            self.metrics.record(started.elapsed(), false).await;
            warn!(target: "sandbox_client", %method, %url, %status, "Server returned error status");
            return Err(LucidraError::HttpError {
                status: status.as_u16(),
                message: server_message_from_body(&text),
            });
        }

        // A bodiless 2xx (e.g. 204) acknowledges without data
        if text.trim().is_empty() {
            self.metrics.record(started.elapsed(), true).await;
            return Ok(ApiEnvelope {
                success: true,
                data: None,
                error: None,
            });
        }

        let envelope: ApiEnvelope<T> = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(err) => {
                self.metrics.record(started.elapsed(), false).await;
                warn!(target: "sandbox_client", %url, error = %err, "Unparseable response body");
                return Err(LucidraError::InvalidResponse(format!(
                    "{} {}: {}",
                    method, url, err
                )));
            }
        };
        self.metrics
            .record(started.elapsed(), envelope.success)
            .await;
        Ok(envelope)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<ApiEnvelope<T>> {
        self.send::<T, ()>(Method::GET, url, None).await
    }
}

#[async_trait]
impl SandboxApi for SandboxClient {
    async fn dashboard(&self) -> Result<Dashboard> {
        self.get(self.url(&["dashboard"])).await?.into_data()
    }

    async fn create_mission(&self, mission: &NewMission) -> Result<Mission> {
        self.send(Method::POST, self.url(&["missions"]), Some(mission))
            .await?
            .into_data()
    }

    async fn get_mission(&self, mission_id: &str) -> Result<Mission> {
        self.get(self.url(&["missions", mission_id]))
            .await?
            .into_data()
    }

    async fn add_subtask(&self, mission_id: &str, subtask: &NewSubtask) -> Result<Subtask> {
        self.send(
            Method::POST,
            self.url(&["missions", mission_id, "subtasks"]),
            Some(subtask),
        )
        .await?
        .into_data()
    }

    async fn assign_advisor(
        &self,
        mission_id: &str,
        subtask_id: &str,
        advisor_id: &str,
    ) -> Result<()> {
        let body = AssignAdvisorRequest {
            advisor_id: advisor_id.to_string(),
        };
        self.send::<serde_json::Value, _>(
            Method::PUT,
            self.url(&["missions", mission_id, "subtasks", subtask_id, "advisor"]),
            Some(&body),
        )
        .await?
        .into_success()
        .map(|_| ())
    }

    async fn add_iteration(
        &self,
        mission_id: &str,
        subtask_id: &str,
        iteration: &NewIteration,
    ) -> Result<Iteration> {
        self.send(
            Method::POST,
            self.url(&["missions", mission_id, "subtasks", subtask_id, "iterations"]),
            Some(iteration),
        )
        .await?
        .into_data()
    }

    async fn user_progress(&self) -> Result<UserProgress> {
        self.get(self.url(&["progress"])).await?.into_data()
    }
}
