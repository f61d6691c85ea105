use serde::Deserialize;
use serde_json::Value;

use crate::ports::browser::AgentHost;
use crate::types::push::{NotificationAppearance, NotificationPayload};

pub const FALLBACK_TITLE: &str = "New Message";
pub const FALLBACK_BODY: &str = "You have a new message";

/// Lifecycle and notification events delivered to the background agent.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    Install,
    Activate,
    Push(Option<Vec<u8>>),
    NotificationClick { tag: String, data: Value },
    NotificationClose,
    Message(Value),
    Sync(String),
}

#[derive(Deserialize, Default)]
struct IncomingPush {
    title: Option<String>,
    body: Option<String>,
    notification: Option<IncomingNotification>,
    data: Option<Value>,
}

#[derive(Deserialize, Default)]
struct IncomingNotification {
    title: Option<String>,
    body: Option<String>,
}

/// Turns a raw push body into something displayable. Both the relay's own
/// `{title, body, data}` shape and the chat provider's nested
/// `{notification: {title, body}}` shape are accepted; anything unreadable
/// falls back to the generic wording.
pub fn normalize_push_payload(
    raw: Option<&[u8]>,
    appearance: &NotificationAppearance,
) -> NotificationPayload {
    let mut payload = NotificationPayload::new(FALLBACK_TITLE, FALLBACK_BODY, appearance)
        .with_require_interaction(true);
    let Some(raw) = raw else {
        return payload;
    };
    let incoming: IncomingPush = match serde_json::from_slice(raw) {
        Ok(incoming) => incoming,
        Err(err) => {
            tracing::error!(error = %err, "push payload is not valid JSON");
            return payload;
        }
    };

    if let Some(title) = incoming.title.filter(|title| !title.is_empty()) {
        payload.title = title;
    }
    if let Some(body) = incoming.body.filter(|body| !body.is_empty()) {
        payload.body = body;
    }
    if let Some(notification) = incoming.notification {
        if let Some(title) = notification.title.filter(|title| !title.is_empty()) {
            payload.title = title;
        }
        if let Some(body) = notification.body.filter(|body| !body.is_empty()) {
            payload.body = body;
        }
    }
    if let Some(data) = incoming.data.filter(|data| !data.is_null()) {
        payload.data = data;
    }
    payload
}

pub struct BackgroundAgent<H> {
    host: H,
    appearance: NotificationAppearance,
}

impl<H: AgentHost> BackgroundAgent<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            appearance: NotificationAppearance::default(),
        }
    }

    pub fn with_appearance(self, appearance: NotificationAppearance) -> Self {
        Self { appearance, ..self }
    }

    pub async fn handle(&self, event: AgentEvent) {
        match event {
            AgentEvent::Install => {
                tracing::info!("background agent installing");
                self.host.skip_waiting();
            }
            AgentEvent::Activate => {
                tracing::info!("background agent activating");
                if let Err(err) = self.host.claim_clients().await {
                    tracing::error!(error = %err, "could not claim clients");
                }
            }
            AgentEvent::Push(raw) => {
                let payload = normalize_push_payload(raw.as_deref(), &self.appearance);
                match self.host.show_notification(&payload).await {
                    Ok(()) => tracing::info!(title = %payload.title, "notification shown"),
                    Err(err) => tracing::error!(error = %err, "could not show notification"),
                }
            }
            AgentEvent::NotificationClick { tag, data } => {
                self.host.close_notification(&tag);
                tracing::debug!(%tag, ?data, "notification clicked");
                if let Err(err) = self.bring_app_forward().await {
                    tracing::error!(error = %err, "could not surface the chat window");
                }
            }
            AgentEvent::NotificationClose => tracing::debug!("notification closed"),
            AgentEvent::Message(message) => {
                if message.get("type").and_then(Value::as_str) == Some("SKIP_WAITING") {
                    self.host.skip_waiting();
                } else {
                    tracing::debug!(?message, "ignoring agent message");
                }
            }
            AgentEvent::Sync(tag) => tracing::debug!(%tag, "background sync requested"),
        }
    }

    async fn bring_app_forward(&self) -> Result<(), crate::client::ClientError> {
        let origin = self.host.origin();
        let windows = self.host.match_windows().await;
        match windows.iter().find(|window| same_origin(&window.url, origin)) {
            Some(window) => self.host.focus(window).await,
            None => self.host.open_window("/").await,
        }
    }
}

/// True when `url` is `origin` itself or a path, query or fragment under it.
/// A bare prefix match would let `https://chat.example.evil` pass for
/// `https://chat.example`.
fn same_origin(url: &str, origin: &str) -> bool {
    let origin = origin.trim_end_matches('/');
    match url.strip_prefix(origin) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::client::fakes::{FakeHost, HostCall};
    use crate::ports::browser::ClientWindow;
    use serde_json::json;

    fn window(id: &str, url: &str) -> ClientWindow {
        ClientWindow {
            id: id.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn normalize_push_payload__should_use_defaults_without_body() {
        let payload = normalize_push_payload(None, &NotificationAppearance::default());

        assert_eq!(payload.title, "New Message");
        assert_eq!(payload.body, "You have a new message");
        assert!(payload.require_interaction);
        assert_eq!(payload.tag, "chat-message");
    }

    #[test]
    fn normalize_push_payload__should_prefer_nested_notification_fields() {
        // Given
        let raw = json!({
            "title": "outer",
            "body": "outer body",
            "notification": { "title": "Bob", "body": "" },
            "data": { "channelId": "team" }
        })
        .to_string();

        // When
        let payload =
            normalize_push_payload(Some(raw.as_bytes()), &NotificationAppearance::default());

        // Then
        assert_eq!(payload.title, "Bob");
        assert_eq!(payload.body, "outer body");
        assert_eq!(payload.data, json!({ "channelId": "team" }));
    }

    #[test]
    fn normalize_push_payload__should_treat_flat_and_nested_shapes_alike() {
        // Given
        let flat = json!({ "title": "X", "body": "Y" }).to_string();
        let nested = json!({ "notification": { "title": "X", "body": "Y" } }).to_string();
        let appearance = NotificationAppearance::default();

        // When
        let from_flat = normalize_push_payload(Some(flat.as_bytes()), &appearance);
        let from_nested = normalize_push_payload(Some(nested.as_bytes()), &appearance);

        // Then
        assert_eq!(from_flat, from_nested);
        assert_eq!(from_flat.title, "X");
        assert_eq!(from_flat.body, "Y");
    }

    #[test]
    fn normalize_push_payload__should_fall_back_on_garbage() {
        let payload =
            normalize_push_payload(Some(b"not json"), &NotificationAppearance::default());

        assert_eq!(payload.title, "New Message");
        assert_eq!(payload.data, json!({}));
    }

    #[tokio::test]
    async fn handle__should_show_pushed_notification() {
        // Given
        let host = FakeHost::new(vec![]);
        let agent = BackgroundAgent::new(host.clone());
        let raw = json!({ "title": "New message from Alice", "body": "hi" }).to_string();

        // When
        agent.handle(AgentEvent::Push(Some(raw.into_bytes()))).await;

        // Then
        let calls = host.calls();
        let [HostCall::Show(payload)] = calls.as_slice() else {
            panic!("expected one notification, got {calls:?}");
        };
        assert_eq!(payload.title, "New message from Alice");
        assert_eq!(payload.body, "hi");
    }

    #[tokio::test]
    async fn handle__should_focus_existing_window_on_click() {
        // Given
        let host = FakeHost::new(vec![
            window("other", "https://elsewhere.example/"),
            window("chat", "https://chat.example/channels/team"),
        ]);
        let agent = BackgroundAgent::new(host.clone());

        // When
        agent
            .handle(AgentEvent::NotificationClick {
                tag: "chat-message".to_string(),
                data: json!({}),
            })
            .await;

        // Then
        assert_eq!(
            host.calls(),
            vec![
                HostCall::Close("chat-message".to_string()),
                HostCall::Focus("chat".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn handle__should_open_root_when_no_window_matches() {
        let host = FakeHost::new(vec![window("other", "https://elsewhere.example/")]);
        let agent = BackgroundAgent::new(host.clone());

        agent
            .handle(AgentEvent::NotificationClick {
                tag: "chat-message".to_string(),
                data: json!({}),
            })
            .await;

        assert_eq!(
            host.calls(),
            vec![
                HostCall::Close("chat-message".to_string()),
                HostCall::Open("/".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn handle__should_not_focus_window_on_lookalike_origin() {
        // Given
        let host = FakeHost::new(vec![
            window("lookalike", "https://chat.example.evil/"),
            window("port", "https://chat.example:8443/"),
        ]);
        let agent = BackgroundAgent::new(host.clone());

        // When
        agent
            .handle(AgentEvent::NotificationClick {
                tag: "chat-message".to_string(),
                data: json!({}),
            })
            .await;

        // Then
        assert_eq!(
            host.calls(),
            vec![
                HostCall::Close("chat-message".to_string()),
                HostCall::Open("/".to_string()),
            ]
        );
    }

    #[test]
    fn same_origin__should_require_a_boundary_after_the_origin() {
        assert!(same_origin("https://chat.example", "https://chat.example"));
        assert!(same_origin("https://chat.example/", "https://chat.example"));
        assert!(same_origin("https://chat.example?c=1", "https://chat.example/"));
        assert!(same_origin("https://chat.example#top", "https://chat.example"));
        assert!(!same_origin("https://chat.example.evil/", "https://chat.example"));
        assert!(!same_origin("https://chat.examplex/", "https://chat.example"));
    }

    #[tokio::test]
    async fn handle__should_follow_lifecycle_events() {
        // Given
        let host = FakeHost::new(vec![]);
        let agent = BackgroundAgent::new(host.clone());

        // When
        agent.handle(AgentEvent::Install).await;
        agent.handle(AgentEvent::Activate).await;
        agent
            .handle(AgentEvent::Message(json!({ "type": "SKIP_WAITING" })))
            .await;
        agent.handle(AgentEvent::Message(json!({ "type": "PING" }))).await;
        agent.handle(AgentEvent::NotificationClose).await;
        agent.handle(AgentEvent::Sync("outbox".to_string())).await;

        // Then
        assert_eq!(
            host.calls(),
            vec![HostCall::SkipWaiting, HostCall::Claim, HostCall::SkipWaiting]
        );
    }
}
