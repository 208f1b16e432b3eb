//! In-process fake of the Sandbox API.
//!
//! Serves the `/api/sandbox` routes from in-memory state, issues a session
//! id to any request that arrives without one, and records which session
//! header each request carried.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use lucidra_core::model::AssignAdvisorRequest;
use lucidra_core::{
    Advisor, AdvisorAvailability, ApiEnvelope, Badge, CompletionStatus, Dashboard, Iteration,
    Mission, NewIteration, NewMission, NewSubtask, SandboxClient, SandboxConfig, SessionStore,
    Streaks, Subtask, SubtaskStatus, UserProgress,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct FakeState {
    pub missions: Vec<Mission>,
    pub advisors: Vec<Advisor>,
    pub badges: Vec<Badge>,
    pub progress: Option<UserProgress>,
    pub sessions_seen: Vec<Option<String>>,
    next_id: u64,
    sessions_issued: u64,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeSandbox {
    pub base_url: String,
    pub state: Shared,
    task: JoinHandle<()>,
}

impl FakeSandbox {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            advisors: default_advisors(),
            badges: vec![Badge {
                id: "first-mission".into(),
                name: "First Mission".into(),
                description: "Created a first mission".into(),
                icon: "flag".into(),
            }],
            progress: Some(UserProgress {
                user_id: "user-1".into(),
                total_xp: 0,
                level: 1,
                badges: vec![],
                completed_missions: vec![],
                active_workflows: vec![],
                streaks: Streaks::default(),
            }),
            ..FakeState::default()
        }));

        let app = Router::new()
            .route("/api/sandbox/dashboard", get(dashboard_handler))
            .route("/api/sandbox/progress", get(progress_handler))
            .route("/api/sandbox/missions", post(create_mission_handler))
            .route("/api/sandbox/missions/:mission_id", get(get_mission_handler))
            .route(
                "/api/sandbox/missions/:mission_id/subtasks",
                post(add_subtask_handler),
            )
            .route(
                "/api/sandbox/missions/:mission_id/subtasks/:subtask_id/advisor",
                put(assign_advisor_handler),
            )
            .route(
                "/api/sandbox/missions/:mission_id/subtasks/:subtask_id/iterations",
                post(add_iteration_handler),
            )
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake sandbox");
        let addr = listener.local_addr().expect("local addr");
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake sandbox server");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            task,
        }
    }

    pub fn config(&self) -> SandboxConfig {
        SandboxConfig {
            base_url: self.base_url.clone(),
            request_timeout_ms: Some(5_000),
            session_db_path: None,
            poll_interval_secs: 1,
            templates_path: None,
        }
    }

    pub fn client(&self) -> SandboxClient {
        SandboxClient::new(&self.config(), SessionStore::in_memory()).expect("client")
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().sessions_seen.len()
    }

    pub fn sessions_seen(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().sessions_seen.clone()
    }

    pub fn mission(&self, mission_id: &str) -> Option<Mission> {
        self.state
            .lock()
            .unwrap()
            .missions
            .iter()
            .find(|m| m.id == mission_id)
            .cloned()
    }
}

impl Drop for FakeSandbox {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn default_advisors() -> Vec<Advisor> {
    vec![
        Advisor {
            id: "strategist".into(),
            name: "Strategist".into(),
            icon: "compass".into(),
            color: "#2563eb".into(),
            availability: AdvisorAvailability::Available,
            description: "Long-range planning".into(),
        },
        Advisor {
            id: "analyst".into(),
            name: "Market Analyst".into(),
            icon: "chart".into(),
            color: "#16a34a".into(),
            availability: AdvisorAvailability::Busy,
            description: "Market sizing and signals".into(),
        },
    ]
}

/// Build a response, issuing a session id when the request had none
fn reply<T: Serialize>(
    state: &Shared,
    headers: &HeaderMap,
    status: StatusCode,
    body: ApiEnvelope<T>,
) -> Response {
    let incoming = headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let issued = {
        let mut s = state.lock().unwrap();
        s.sessions_seen.push(incoming.clone());
        if incoming.is_none() {
            s.sessions_issued += 1;
            Some(format!("session-{}", s.sessions_issued))
        } else {
            None
        }
    };

    let mut response = (status, Json(body)).into_response();
    if let Some(id) = issued {
        if let Ok(value) = HeaderValue::from_str(&id) {
            response.headers_mut().insert("x-session-id", value);
        }
    }
    response
}

fn not_found(state: &Shared, headers: &HeaderMap, what: &str) -> Response {
    reply::<()>(
        state,
        headers,
        StatusCode::NOT_FOUND,
        ApiEnvelope::failure(format!("{} not found", what)),
    )
}

async fn dashboard_handler(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let dashboard = {
        let s = state.lock().unwrap();
        Dashboard {
            user_progress: s.progress.clone().expect("progress"),
            missions: s.missions.clone(),
            advisors: s.advisors.clone(),
            badges: s.badges.clone(),
        }
    };
    reply(&state, &headers, StatusCode::OK, ApiEnvelope::ok(dashboard))
}

async fn progress_handler(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let progress = state.lock().unwrap().progress.clone().expect("progress");
    reply(&state, &headers, StatusCode::OK, ApiEnvelope::ok(progress))
}

async fn create_mission_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewMission>,
) -> Response {
    let mission = {
        let mut s = state.lock().unwrap();
        let mission = Mission {
            id: s.next_id("mission"),
            title: body.title,
            description: body.description,
            challenge: body.challenge,
            category: body.category,
            subtasks: vec![],
            total_xp: 0,
            completion_status: CompletionStatus::NotStarted,
        };
        s.missions.push(mission.clone());
        mission
    };
    reply(&state, &headers, StatusCode::CREATED, ApiEnvelope::ok(mission))
}

async fn get_mission_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(mission_id): Path<String>,
) -> Response {
    let mission = state
        .lock()
        .unwrap()
        .missions
        .iter()
        .find(|m| m.id == mission_id)
        .cloned();
    match mission {
        Some(m) => reply(&state, &headers, StatusCode::OK, ApiEnvelope::ok(m)),
        None => not_found(&state, &headers, "Mission"),
    }
}

async fn add_subtask_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(mission_id): Path<String>,
    Json(body): Json<NewSubtask>,
) -> Response {
    let created = {
        let mut s = state.lock().unwrap();
        let id = s.next_id("subtask");
        s.missions
            .iter_mut()
            .find(|m| m.id == mission_id)
            .map(|mission| {
                let subtask = Subtask {
                    id,
                    title: body.title,
                    description: body.description,
                    assigned_advisor: body.assigned_advisor,
                    prompt_template: body.prompt_template,
                    constraints: body.constraints,
                    expected_format: body.expected_format,
                    status: body.status,
                    iterations: vec![],
                };
                mission.subtasks.push(subtask.clone());
                subtask
            })
    };
    match created {
        Some(subtask) => reply(&state, &headers, StatusCode::CREATED, ApiEnvelope::ok(subtask)),
        None => not_found(&state, &headers, "Mission"),
    }
}

async fn assign_advisor_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((mission_id, subtask_id)): Path<(String, String)>,
    Json(body): Json<AssignAdvisorRequest>,
) -> Response {
    let outcome = {
        let mut s = state.lock().unwrap();
        let known = s.advisors.iter().any(|a| a.id == body.advisor_id);
        let subtask = s
            .missions
            .iter_mut()
            .find(|m| m.id == mission_id)
            .and_then(|m| m.subtasks.iter_mut().find(|st| st.id == subtask_id));
        match (known, subtask) {
            (false, _) => Err((StatusCode::BAD_REQUEST, "Advisor not found")),
            (true, None) => Err((StatusCode::NOT_FOUND, "Subtask not found")),
            (true, Some(st)) => {
                st.assigned_advisor = Some(body.advisor_id.clone());
                st.status = SubtaskStatus::Assigned;
                Ok(())
            }
        }
    };
    match outcome {
        Ok(()) => reply(
            &state,
            &headers,
            StatusCode::OK,
            ApiEnvelope::<()> {
                success: true,
                data: None,
                error: None,
            },
        ),
        Err((status, msg)) => reply::<()>(&state, &headers, status, ApiEnvelope::failure(msg)),
    }
}

async fn add_iteration_handler(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path((mission_id, subtask_id)): Path<(String, String)>,
    Json(body): Json<NewIteration>,
) -> Response {
    let created = {
        let mut s = state.lock().unwrap();
        s.missions
            .iter_mut()
            .find(|m| m.id == mission_id)
            .and_then(|m| m.subtasks.iter_mut().find(|st| st.id == subtask_id))
            .map(|st| {
                let iteration = Iteration {
                    prompt_used: body.prompt_used,
                    advisor_response: body.advisor_response,
                    user_annotation: body.user_annotation,
                    timestamp: Some(Utc::now()),
                };
                st.iterations.push(iteration.clone());
                st.status = SubtaskStatus::InProgress;
                iteration
            })
    };
    match created {
        Some(it) => reply(&state, &headers, StatusCode::CREATED, ApiEnvelope::ok(it)),
        None => not_found(&state, &headers, "Subtask"),
    }
}
