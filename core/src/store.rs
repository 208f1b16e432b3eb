//! Mission store: the client-side cache the UI reads from.
//!
//! Operations never return errors. A failure is recorded in the shared
//! `error` slot and the operation yields `None` / `false`; callers branch on
//! the return value and display `error()`.
//!
//! `loading` and `error` are shared across all operations. Each operation
//! clears `error` when it starts, so a later call can wipe an earlier
//! failure; concurrent failures resolve last-write-wins. `loading` stays
//! true while any call is in flight.
//!
//! Every call takes a monotonic ticket. Dashboard, progress and
//! current-mission snapshots are only replaced by a response whose ticket is
//! newer than the one that produced the cached value, so a slow response
//! cannot overwrite fresher state.

use crate::api::{SandboxApi, SandboxClient};
use crate::config::SandboxConfig;
use crate::model::{
    Dashboard, Iteration, Mission, NewIteration, NewMission, NewSubtask, Subtask, UserProgress,
};
use crate::templates::TemplateCatalog;
use crate::{LucidraError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct StoreState {
    dashboard: Option<Dashboard>,
    dashboard_ticket: u64,
    progress: Option<UserProgress>,
    progress_ticket: u64,
    current_mission: Option<Mission>,
    mission_ticket: u64,
    error: Option<String>,
    in_flight: usize,
}

impl StoreState {
    fn settle_failure(&mut self, op: &str, err: &LucidraError, fallback: &str) {
        self.in_flight = self.in_flight.saturating_sub(1);
        warn!(target: "mission_store", op, error = %err, "Operation failed");
        self.error = Some(err.display_message(fallback));
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    fn set_current_mission(&mut self, mission: &Mission, ticket: u64) {
        if ticket > self.mission_ticket {
            self.current_mission = Some(mission.clone());
            self.mission_ticket = ticket;
        }
    }
}

pub struct MissionStore {
    api: Arc<dyn SandboxApi>,
    templates: TemplateCatalog,
    state: RwLock<StoreState>,
    next_ticket: AtomicU64,
}

impl MissionStore {
    pub fn new(api: Arc<dyn SandboxApi>, templates: TemplateCatalog) -> Self {
        Self {
            api,
            templates,
            state: RwLock::new(StoreState::default()),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Store backed by an HTTP client built from `cfg`
    pub fn from_config(cfg: &SandboxConfig) -> Result<Self> {
        let client = SandboxClient::from_config(cfg)?;
        Ok(Self::new(Arc::new(client), cfg.template_catalog()?))
    }

    // ==================== Snapshot accessors ====================

    pub async fn dashboard(&self) -> Option<Dashboard> {
        self.state.read().await.dashboard.clone()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.in_flight > 0
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    /// Mission most recently created or fetched
    pub async fn current_mission(&self) -> Option<Mission> {
        self.state.read().await.current_mission.clone()
    }

    /// Last result of `get_user_progress`; independent of the dashboard's copy
    pub async fn progress(&self) -> Option<UserProgress> {
        self.state.read().await.progress.clone()
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    /// Record a failure detected by the UI layer before any request
    pub async fn report_error(&self, message: impl Into<String>) {
        self.state.write().await.error = Some(message.into());
    }

    pub async fn clear_error(&self) {
        self.state.write().await.error = None;
    }

    // ==================== Operations ====================

    async fn begin(&self) -> u64 {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;
        state.in_flight += 1;
        state.error = None;
        ticket
    }

    /// Fail fast when `advisor_id` is absent from a cached roster. Without a
    /// cached roster the server decides.
    async fn check_advisor(&self, advisor_id: &str) -> Result<()> {
        let state = self.state.read().await;
        match &state.dashboard {
            Some(dashboard) if dashboard.advisor(advisor_id).is_none() => {
                Err(LucidraError::ValidationError(format!(
                    "Advisor '{}' is not in the advisor roster",
                    advisor_id
                )))
            }
            _ => Ok(()),
        }
    }

    /// Replace the cached dashboard. On failure the previous snapshot stays.
    pub async fn refresh_dashboard(&self) -> bool {
        let ticket = self.begin().await;
        let result = self.api.dashboard().await;

        let mut state = self.state.write().await;
        match result {
            Ok(dashboard) => {
                state.settle();
                if ticket > state.dashboard_ticket {
                    debug!(
                        target: "mission_store",
                        missions = dashboard.missions.len(),
                        advisors = dashboard.advisors.len(),
                        "Dashboard refreshed"
                    );
                    state.dashboard = Some(dashboard);
                    state.dashboard_ticket = ticket;
                } else {
                    debug!(target: "mission_store", ticket, "Discarding stale dashboard response");
                }
                true
            }
            Err(err) => {
                state.settle_failure("refresh_dashboard", &err, "Failed to load dashboard");
                false
            }
        }
    }

    /// Create a mission. `category` defaults to "custom". The cached mission
    /// list is not touched; refresh the dashboard to see it there.
    pub async fn create_mission(
        &self,
        title: &str,
        description: &str,
        challenge: &str,
        category: Option<&str>,
    ) -> Option<Mission> {
        let mut request = NewMission::new(title, description, challenge);
        if let Some(category) = category {
            request = request.with_category(category);
        }
        self.submit_mission(&request).await
    }

    async fn submit_mission(&self, request: &NewMission) -> Option<Mission> {
        let ticket = self.begin().await;
        let result = self.api.create_mission(request).await;

        let mut state = self.state.write().await;
        match result {
            Ok(mission) => {
                state.settle();
                info!(target: "mission_store", mission_id = %mission.id, "Mission created");
                state.set_current_mission(&mission, ticket);
                Some(mission)
            }
            Err(err) => {
                state.settle_failure("create_mission", &err, "Failed to create mission");
                None
            }
        }
    }

    pub async fn get_mission(&self, mission_id: &str) -> Option<Mission> {
        let ticket = self.begin().await;
        let result = self.api.get_mission(mission_id).await;

        let mut state = self.state.write().await;
        match result {
            Ok(mission) => {
                state.settle();
                state.set_current_mission(&mission, ticket);
                Some(mission)
            }
            Err(err) => {
                state.settle_failure("get_mission", &err, "Failed to load mission");
                None
            }
        }
    }

    pub async fn add_subtask(&self, mission_id: &str, subtask: NewSubtask) -> Option<Subtask> {
        if let Some(advisor_id) = subtask.assigned_advisor.as_deref() {
            if let Err(err) = self.check_advisor(advisor_id).await {
                self.report_error(err.display_message("Unknown advisor")).await;
                return None;
            }
        }

        self.begin().await;
        let result = self.api.add_subtask(mission_id, &subtask).await;

        let mut state = self.state.write().await;
        match result {
            Ok(subtask) => {
                state.settle();
                info!(target: "mission_store", mission_id, subtask_id = %subtask.id, "Subtask added");
                Some(subtask)
            }
            Err(err) => {
                state.settle_failure("add_subtask", &err, "Failed to add subtask");
                None
            }
        }
    }

    /// Assign an advisor to a subtask. Cached state is left as is; the caller
    /// reflects the assignment in whatever it displays.
    pub async fn assign_advisor(
        &self,
        mission_id: &str,
        subtask_id: &str,
        advisor_id: &str,
    ) -> bool {
        if let Err(err) = self.check_advisor(advisor_id).await {
            self.report_error(err.display_message("Unknown advisor")).await;
            return false;
        }

        self.begin().await;
        let result = self
            .api
            .assign_advisor(mission_id, subtask_id, advisor_id)
            .await;

        let mut state = self.state.write().await;
        match result {
            Ok(()) => {
                state.settle();
                info!(target: "mission_store", mission_id, subtask_id, advisor_id, "Advisor assigned");
                true
            }
            Err(err) => {
                state.settle_failure("assign_advisor", &err, "Failed to assign advisor");
                false
            }
        }
    }

    pub async fn add_iteration(
        &self,
        mission_id: &str,
        subtask_id: &str,
        prompt_used: &str,
        advisor_response: &str,
        user_annotation: Option<&str>,
    ) -> Option<Iteration> {
        let request = NewIteration {
            prompt_used: prompt_used.to_string(),
            advisor_response: advisor_response.to_string(),
            user_annotation: user_annotation.map(str::to_string),
        };

        self.begin().await;
        let result = self
            .api
            .add_iteration(mission_id, subtask_id, &request)
            .await;

        let mut state = self.state.write().await;
        match result {
            Ok(iteration) => {
                state.settle();
                debug!(target: "mission_store", mission_id, subtask_id, "Iteration recorded");
                Some(iteration)
            }
            Err(err) => {
                state.settle_failure("add_iteration", &err, "Failed to add iteration");
                None
            }
        }
    }

    /// Fetch a standalone progress snapshot. Nothing reconciles it with the
    /// dashboard's `user_progress`.
    pub async fn get_user_progress(&self) -> Option<UserProgress> {
        let ticket = self.begin().await;
        let result = self.api.user_progress().await;

        let mut state = self.state.write().await;
        match result {
            Ok(progress) => {
                state.settle();
                if ticket > state.progress_ticket {
                    state.progress = Some(progress.clone());
                    state.progress_ticket = ticket;
                }
                Some(progress)
            }
            Err(err) => {
                state.settle_failure("get_user_progress", &err, "Failed to load progress");
                None
            }
        }
    }

    /// Create a mission from a catalog template. Unknown ids record an error
    /// without touching the network.
    pub async fn create_mission_from_template(&self, template_id: &str) -> Option<Mission> {
        let Some(template) = self.templates.get(template_id) else {
            let err = LucidraError::TemplateNotFound(template_id.to_string());
            warn!(target: "mission_store", template_id, "Unknown mission template");
            self.report_error(err.display_message("Template not found"))
                .await;
            return None;
        };
        self.submit_mission(&template.to_new_mission()).await
    }
}
