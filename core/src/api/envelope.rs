use crate::{LucidraError, Result};
use serde::{Deserialize, Serialize};

/// Response wrapper used by every Sandbox endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Check `success` and return whatever `data` came with it
    pub fn into_success(self) -> Result<Option<T>> {
        if !self.success {
            return Err(LucidraError::ApiError {
                message: self.error,
            });
        }
        Ok(self.data)
    }

    /// Like `into_success`, but `data` must be present
    pub fn into_data(self) -> Result<T> {
        self.into_success()?
            .ok_or_else(|| LucidraError::InvalidResponse("envelope has no data".to_string()))
    }
}

/// Pull a human-readable message out of an error response body.
///
/// Only JSON bodies count: the envelope's `error` field or a bare `message`
/// field. Plain-text bodies (proxy pages, framework defaults) yield `None` so
/// the caller's own fallback is shown instead.
pub fn server_message_from_body(body: &str) -> Option<String> {
    let value = serde_json::from_str::<serde_json::Value>(body.trim()).ok()?;
    ["error", "message"]
        .iter()
        .filter_map(|k| value.get(*k).and_then(|v| v.as_str()))
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}
