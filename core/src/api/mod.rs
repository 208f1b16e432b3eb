// Sandbox API access
//
// Session-aware HTTP client for the `/api/sandbox` surface and the
// `{success, data, error}` envelope every response is wrapped in.

mod client;
mod envelope;

pub use client::{SandboxApi, SandboxClient, API_BASE_PATH, SESSION_HEADER};
pub use envelope::{server_message_from_body, ApiEnvelope};

#[cfg(test)]
pub use client::MockSandboxApi;
