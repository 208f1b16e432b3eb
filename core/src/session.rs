//! Session id persistence.

use crate::storage::{LocalStorage, MemoryStorage};
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Fixed local-storage key holding the session id
pub const SESSION_STORAGE_KEY: &str = "lucidra_session_id";

/// Reads and writes the opaque session id issued by the Sandbox API.
///
/// The id is created server-side on first contact; the client only echoes
/// it back. There is no client-side expiry.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn load(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get_item(SESSION_STORAGE_KEY)?
            .filter(|id| !id.is_empty()))
    }

    /// Store `session_id`, replacing any previous value
    pub fn save(&self, session_id: &str) -> Result<()> {
        debug!(target: "session", "Persisting session id");
        self.storage.set_item(SESSION_STORAGE_KEY, session_id)
    }

    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(SESSION_STORAGE_KEY)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}
