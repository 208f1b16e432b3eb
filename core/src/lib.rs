// Lucidra Core Library
// Sandbox workflow client: session-aware API access, mission cache, templates

pub mod api;
pub mod config;
pub mod forms;
pub mod model;
pub mod poller;
pub mod session;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod templates;

// Export core types
pub use api::{ApiEnvelope, SandboxApi, SandboxClient, API_BASE_PATH, SESSION_HEADER};
pub use config::SandboxConfig;
pub use forms::{MissionForm, SubtaskForm};
pub use model::{
    Advisor, AdvisorAvailability, Badge, CompletionStatus, Dashboard, Iteration, Mission,
    NewIteration, NewMission, NewSubtask, Streaks, Subtask, SubtaskStatus, UserProgress,
};
pub use poller::{DashboardPoller, PollerHandle};
pub use session::{SessionStore, SESSION_STORAGE_KEY};
pub use storage::{LocalStorage, MemoryStorage};
#[cfg(feature = "persistent")]
pub use storage::RocksDbStorage;
pub use store::MissionStore;
pub use telemetry::{RequestMetrics, RequestStats};
pub use templates::{MissionTemplate, TemplateCatalog};

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LucidraError {
    #[error("Transport error: {0}")]
    TransportError(String),

    #[error("HTTP error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    HttpError {
        status: u16,
        message: Option<String>,
    },

    #[error("API error: {}", .message.as_deref().unwrap_or("request was not successful"))]
    ApiError { message: Option<String> },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl LucidraError {
    /// Message supplied by the server, if the failure carried one
    pub fn server_message(&self) -> Option<&str> {
        match self {
            LucidraError::HttpError { message, .. } | LucidraError::ApiError { message } => {
                message.as_deref().filter(|m| !m.trim().is_empty())
            }
            _ => None,
        }
    }

    /// Human-readable text for display: the server's message when present,
    /// the client's own message for failures caught before any request,
    /// otherwise `fallback`.
    pub fn display_message(&self, fallback: &str) -> String {
        if let Some(msg) = self.server_message() {
            return msg.to_string();
        }
        match self {
            LucidraError::ValidationError(msg) => msg.clone(),
            LucidraError::TemplateNotFound(id) => format!("Template '{}' not found", id),
            _ => fallback.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LucidraError>;
