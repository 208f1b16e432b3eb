//! Form state for the calling UI layer.
//!
//! The store performs no validation; forms check required fields before any
//! request is issued and report problems through the store's error slot.

use crate::model::{Mission, NewMission, NewSubtask, Subtask, SubtaskStatus, DEFAULT_CATEGORY};
use crate::store::MissionStore;
use crate::{LucidraError, Result};

/// New-mission form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionForm {
    pub title: String,
    pub description: String,
    pub challenge: String,
    pub category: Option<String>,
}

impl MissionForm {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        challenge: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            challenge: challenge.into(),
            category: None,
        }
    }

    /// Title, description and challenge must be non-blank
    pub fn validate(&self) -> Result<NewMission> {
        let missing: Vec<&str> = [
            ("title", &self.title),
            ("description", &self.description),
            ("challenge", &self.challenge),
        ]
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(LucidraError::ValidationError(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);
        Ok(NewMission::new(self.title.trim(), self.description.trim(), self.challenge.trim())
            .with_category(category))
    }

    /// Validate, then create. Invalid input never reaches the network.
    pub async fn submit(&self, store: &MissionStore) -> Option<Mission> {
        match self.validate() {
            Ok(m) => {
                store
                    .create_mission(&m.title, &m.description, &m.challenge, Some(&m.category))
                    .await
            }
            Err(err) => {
                store.report_error(err.display_message("Invalid mission")).await;
                None
            }
        }
    }
}

/// Subtask draft, edited field by field before it is persisted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtaskForm {
    pub title: String,
    pub description: String,
    pub assigned_advisor: Option<String>,
    pub prompt_template: String,
    pub constraints: Vec<String>,
    pub expected_format: String,
}

impl SubtaskForm {
    pub fn new(title: impl Into<String>, prompt_template: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt_template: prompt_template.into(),
            ..Self::default()
        }
    }

    /// Append a constraint; blank input is ignored
    pub fn add_constraint(&mut self, constraint: impl Into<String>) -> bool {
        let constraint = constraint.into();
        let trimmed = constraint.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.constraints.push(trimmed.to_string());
        true
    }

    pub fn remove_constraint(&mut self, index: usize) -> Option<String> {
        (index < self.constraints.len()).then(|| self.constraints.remove(index))
    }

    pub fn update_constraint(&mut self, index: usize, constraint: impl Into<String>) -> bool {
        match self.constraints.get_mut(index) {
            Some(slot) => {
                *slot = constraint.into();
                true
            }
            None => false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Title and prompt template are required; blank constraints are dropped
    pub fn validate(&self) -> Result<NewSubtask> {
        if self.title.trim().is_empty() {
            return Err(LucidraError::ValidationError(
                "Subtask title is required".to_string(),
            ));
        }
        if self.prompt_template.trim().is_empty() {
            return Err(LucidraError::ValidationError(
                "Subtask prompt template is required".to_string(),
            ));
        }
        Ok(NewSubtask {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            assigned_advisor: self
                .assigned_advisor
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string),
            prompt_template: self.prompt_template.clone(),
            constraints: self
                .constraints
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            expected_format: self.expected_format.trim().to_string(),
            status: SubtaskStatus::Pending,
        })
    }

    /// Validate, then persist against `mission_id`
    pub async fn submit(&self, store: &MissionStore, mission_id: &str) -> Option<Subtask> {
        match self.validate() {
            Ok(subtask) => store.add_subtask(mission_id, subtask).await,
            Err(err) => {
                store.report_error(err.display_message("Invalid subtask")).await;
                None
            }
        }
    }
}
