use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Chat-provider webhook envelope, keyed on its `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookEvent {
    #[serde(rename = "message.new")]
    MessageNew(MessageNewEvent),
    #[serde(rename = "user.presence")]
    UserPresence {
        #[serde(default)]
        user: Option<ChatUser>,
    },
    #[serde(other)]
    Unknown,
}

impl WebhookEvent {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageNewEvent {
    pub message: ChatMessage,
    pub channel: ChatChannel,
    pub user: ChatUser,
}

impl MessageNewEvent {
    /// Channel members other than the sender, in membership order.
    pub fn recipients(&self) -> Vec<&str> {
        let mut recipients: Vec<&str> = Vec::new();
        for member in &self.channel.members.0 {
            if member != &self.user.id && !recipients.contains(&member.as_str()) {
                recipients.push(member);
            }
        }
        recipients
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChannel {
    pub id: String,
    #[serde(default)]
    pub members: Members,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatUser {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Channel member ids. Providers send membership either as an object keyed
/// by user id or as a list of member records carrying `user_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members(pub Vec<String>);

impl<'de> Deserialize<'de> for Members {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawMembers {
            Keyed(serde_json::Map<String, Value>),
            Listed(Vec<MemberRecord>),
        }

        #[derive(Deserialize)]
        struct MemberRecord {
            #[serde(default)]
            user_id: Option<String>,
            #[serde(default)]
            user: Option<ChatUser>,
        }

        let ids = match Option::<RawMembers>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(RawMembers::Keyed(map)) => map.keys().cloned().collect(),
            Some(RawMembers::Listed(records)) => records
                .into_iter()
                .filter_map(|record| record.user_id.or(record.user.map(|user| user.id)))
                .collect(),
        };
        Ok(Members(ids))
    }
}

/// A `message.new` event as seen by the in-page chat client. Every field is
/// optional because the client SDK does not guarantee any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatMessageEvent {
    pub sender_id: Option<String>,
    pub sender_name: Option<String>,
    pub channel_id: Option<String>,
    pub message_id: Option<String>,
    pub text: Option<String>,
}
