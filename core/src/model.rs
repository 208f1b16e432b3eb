//! Sandbox records as exchanged with the Sandbox API.
//!
//! Field names follow the API's camelCase wire format. Status-like fields are
//! closed enums: a value outside the known set fails deserialization, which the
//! client reports as an invalid response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category used when a mission is created without one
pub const DEFAULT_CATEGORY: &str = "custom";

/// Lifecycle of a subtask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskStatus {
    /// Draft still being filled in client-side
    Editing,
    #[default]
    Pending,
    Assigned,
    InProgress,
    Completed,
}

/// Advisor availability as reported in the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorAvailability {
    Available,
    Busy,
    Offline,
}

/// Server-authoritative mission completion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streaks {
    pub daily_prompting: u32,
    pub weekly_completion: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub level: u32,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub completed_missions: Vec<String>,
    #[serde(default)]
    pub active_workflows: Vec<String>,
    #[serde(default)]
    pub streaks: Streaks,
}

impl UserProgress {
    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badges.iter().any(|b| b.id == badge_id)
    }
}

/// AI advisor persona (read-only reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisor {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub availability: AdvisorAvailability,
    pub description: String,
}

impl Advisor {
    pub fn is_available(&self) -> bool {
        self.availability == AdvisorAvailability::Available
    }
}

/// One prompt/response/annotation cycle recorded against a subtask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    pub prompt_used: String,
    pub advisor_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_annotation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_advisor: Option<String>,
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub expected_format: String,
    #[serde(default)]
    pub status: SubtaskStatus,
    /// Append-only, insertion order
    #[serde(default)]
    pub iterations: Vec<Iteration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub description: String,
    pub challenge: String,
    pub category: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
    #[serde(rename = "totalXP", default)]
    pub total_xp: u64,
    #[serde(default)]
    pub completion_status: CompletionStatus,
}

impl Mission {
    pub fn subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }
}

/// Dashboard payload: progress, missions, advisor roster and badge catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user_progress: UserProgress,
    #[serde(default)]
    pub missions: Vec<Mission>,
    #[serde(default)]
    pub advisors: Vec<Advisor>,
    #[serde(default)]
    pub badges: Vec<Badge>,
}

impl Dashboard {
    pub fn advisor(&self, advisor_id: &str) -> Option<&Advisor> {
        self.advisors.iter().find(|a| a.id == advisor_id)
    }

    pub fn available_advisors(&self) -> impl Iterator<Item = &Advisor> {
        self.advisors.iter().filter(|a| a.is_available())
    }

    pub fn mission(&self, mission_id: &str) -> Option<&Mission> {
        self.missions.iter().find(|m| m.id == mission_id)
    }
}

// =========================
// Request bodies
// =========================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMission {
    pub title: String,
    pub description: String,
    pub challenge: String,
    pub category: String,
}

impl NewMission {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            challenge: challenge.into(),
            category: DEFAULT_CATEGORY.to_string(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubtask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_advisor: Option<String>,
    #[serde(default)]
    pub prompt_template: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub expected_format: String,
    #[serde(default)]
    pub status: SubtaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignAdvisorRequest {
    pub advisor_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIteration {
    pub prompt_used: String,
    pub advisor_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_annotation: Option<String>,
}
