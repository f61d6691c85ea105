//! Page-side and background-agent-side halves of the relay, written against
//! the browser capabilities in [`crate::ports::browser`].

pub mod agent;
#[cfg(test)]
mod fakes;
pub mod http;
pub mod manager;
pub mod notifier;
pub mod permission;

pub use agent::{AgentEvent, BackgroundAgent, normalize_push_payload};
pub use http::HttpRelayClient;
pub use manager::{EnableOutcome, SubscriptionManager, read_stored_subscription};
pub use notifier::{ListenerGuard, Notifier, NotifyOutcome, attach};
pub use permission::{PermissionDecision, PermissionState};

/// `localStorage` key holding the JSON subscription descriptor.
pub const SUBSCRIPTION_STORAGE_KEY: &str = "push_subscription";
/// Script registered as the background agent.
pub const AGENT_SCRIPT_URL: &str = "/sw.js";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("browser API failed: {0}")]
    Browser(String),
    #[error("relay rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
