use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::API_BASE_PATH;
use crate::session::SessionStore;
use crate::templates::TemplateCatalog;
use crate::Result;

/// Development endpoint used when `LUCIDRA_API_URL` is unset
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Sandbox client configuration loaded from environment variables,
/// optionally overlaid by a TOML file
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Server origin, e.g. http://localhost:5000 (the API lives under `/api/sandbox`)
    pub base_url: String,
    /// Unset means the transport default
    pub request_timeout_ms: Option<u64>,
    /// Where the session id is persisted; in-memory when unset
    pub session_db_path: Option<PathBuf>,
    pub poll_interval_secs: u64,
    /// TOML template table replacing the built-in catalog
    pub templates_path: Option<PathBuf>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("LUCIDRA_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout_ms: std::env::var("LUCIDRA_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|ms| *ms > 0),
            session_db_path: std::env::var("LUCIDRA_SESSION_DB")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            poll_interval_secs: std::env::var("LUCIDRA_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            templates_path: std::env::var("LUCIDRA_TEMPLATES")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }
}

impl SandboxConfig {
    /// Load configuration from a TOML file (path via LUCIDRA_CONFIG or ./lucidra.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("LUCIDRA_CONFIG").unwrap_or_else(|_| "lucidra.toml".into());
        Self::load_from(path)
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let default = Self::default();
        let p = path.as_ref();
        if !p.exists() {
            tracing::info!(target: "config", path = %p.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<SandboxToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target: "config", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "config", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }

    /// Full URL of the Sandbox API root
    pub fn api_root(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), API_BASE_PATH)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    /// Session storage: RocksDB at `session_db_path` when set, memory otherwise
    pub fn open_session_store(&self) -> Result<SessionStore> {
        match &self.session_db_path {
            #[cfg(feature = "persistent")]
            Some(path) => {
                let storage = crate::storage::RocksDbStorage::open(path)?;
                Ok(SessionStore::new(Arc::new(storage)))
            }
            #[cfg(not(feature = "persistent"))]
            Some(path) => {
                tracing::warn!(
                    target: "config",
                    path = %path.display(),
                    "Built without persistent storage; session id kept in memory"
                );
                Ok(SessionStore::new(Arc::new(crate::storage::MemoryStorage::new())))
            }
            None => Ok(SessionStore::new(Arc::new(
                crate::storage::MemoryStorage::new(),
            ))),
        }
    }

    /// Template catalog from `templates_path`, or the built-in one
    pub fn template_catalog(&self) -> Result<TemplateCatalog> {
        match &self.templates_path {
            Some(path) => TemplateCatalog::load(path),
            None => Ok(TemplateCatalog::builtin()),
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct SandboxToml {
    pub base_url: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub session_db_path: Option<PathBuf>,
    pub poll_interval_secs: Option<u64>,
    pub templates_path: Option<PathBuf>,
}

impl SandboxToml {
    fn overlay(self, mut base: SandboxConfig) -> SandboxConfig {
        if let Some(v) = self.base_url.filter(|s| !s.is_empty()) {
            base.base_url = v;
        }
        if let Some(v) = self.request_timeout_ms {
            base.request_timeout_ms = Some(v).filter(|ms| *ms > 0);
        }
        if let Some(v) = self.session_db_path {
            base.session_db_path = Some(v);
        }
        if let Some(v) = self.poll_interval_secs.filter(|s| *s > 0) {
            base.poll_interval_secs = v;
        }
        if let Some(v) = self.templates_path {
            base.templates_path = Some(v);
        }
        base
    }
}
