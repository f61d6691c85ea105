use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_ICON: &str = "/favicon.ico";
pub const DEFAULT_TAG: &str = "chat-message";
pub const DEFAULT_VIBRATION: [u32; 3] = [200, 100, 200];

#[derive(Debug, Clone)]
pub struct VapidConfig {
    pub private_key: String,
    pub public_key: String,
    pub subject: String,
}

/// A browser push subscription in the `PushSubscription.toJSON()` shape.
/// `expiration_time` is epoch milliseconds as a JS number, so it may carry a
/// fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<f64>,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

impl Subscription {
    pub fn new(
        endpoint: impl Into<String>,
        p256dh: impl Into<String>,
        auth: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            expiration_time: None,
            keys: SubscriptionKeys {
                p256dh: p256dh.into(),
                auth: auth.into(),
            },
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.endpoint.trim().is_empty()
            && !self.keys.p256dh.trim().is_empty()
            && !self.keys.auth.trim().is_empty()
    }
}

/// Icon and badge URLs stamped onto every outgoing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationAppearance {
    pub icon: String,
    pub badge: String,
}

impl Default for NotificationAppearance {
    fn default() -> Self {
        Self {
            icon: DEFAULT_ICON.to_string(),
            badge: DEFAULT_ICON.to_string(),
        }
    }
}

/// Display-ready notification, serialized with the field names the
/// Notification API expects (`requireInteraction`, `vibrate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub silent: bool,
    pub vibrate: Vec<u32>,
    #[serde(default)]
    pub data: Value,
}

impl NotificationPayload {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        appearance: &NotificationAppearance,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            icon: appearance.icon.clone(),
            badge: appearance.badge.clone(),
            tag: DEFAULT_TAG.to_string(),
            require_interaction: false,
            silent: false,
            vibrate: DEFAULT_VIBRATION.to_vec(),
            data: Value::Object(Default::default()),
        }
    }

    /// Builds the notification announcing a new chat message. Empty sender
    /// names and empty texts fall back to generic wording.
    pub fn for_message(
        sender_name: Option<&str>,
        text: Option<&str>,
        data: MessageData,
        appearance: &NotificationAppearance,
    ) -> Self {
        let sender = non_empty(sender_name).unwrap_or("Someone");
        let body = non_empty(text).unwrap_or("New message");
        Self::new(format!("New message from {sender}"), body, appearance).with_data(data.to_value())
    }

    pub fn with_tag(self, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..self
        }
    }

    pub fn with_require_interaction(self, require_interaction: bool) -> Self {
        Self {
            require_interaction,
            ..self
        }
    }

    pub fn with_data(self, data: Value) -> Self {
        Self { data, ..self }
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Body of a direct push request sent from a page to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: Value,
}

/// Routing data attached to message notifications, read back on click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub channel_id: String,
    pub message_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub sender_name: Option<String>,
}

impl MessageData {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
