//! Capabilities of the browser that the client side of the relay drives.
//!
//! The page and the background agent run on a single thread, so none of
//! these futures are required to be `Send`.

use std::time::Duration;

use crate::client::ClientError;
use crate::client::permission::{PermissionDecision, PermissionState};
use crate::types::chat::ChatMessageEvent;
use crate::types::push::{NotificationPayload, PushRequest, Subscription};

pub trait PermissionPrompt {
    /// Whether notifications, background agents and a push manager all exist.
    fn is_supported(&self) -> bool;
    fn current(&self) -> PermissionState;
    fn request(&self) -> impl Future<Output = PermissionDecision>;
}

pub trait PushManager {
    fn register_agent(&self, script_url: &str) -> impl Future<Output = Result<(), ClientError>>;
    fn subscribe(
        &self,
        application_server_key: &str,
    ) -> impl Future<Output = Result<Subscription, ClientError>>;
    /// Cancels the browser subscription. `Ok(false)` when there was none.
    fn unsubscribe(&self) -> impl Future<Output = Result<bool, ClientError>>;
}

/// Per-origin persistent storage (`localStorage`).
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), ClientError>;
    fn remove_item(&self, key: &str);
}

/// Calls the relay server makes available to the page.
pub trait RelayApi {
    fn register(
        &self,
        user_id: &str,
        subscription: &Subscription,
    ) -> impl Future<Output = Result<(), ClientError>>;
    fn deregister(&self, user_id: &str) -> impl Future<Output = Result<(), ClientError>>;
    fn send_push(
        &self,
        subscription: &Subscription,
        request: &PushRequest,
    ) -> impl Future<Output = Result<(), ClientError>>;
}

/// Where a clicked notification should take the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickTarget {
    pub channel_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalNotification {
    pub payload: NotificationPayload,
    pub auto_dismiss: Duration,
    pub click: ClickTarget,
}

/// The document and window hosting the chat UI.
pub trait Page {
    fn has_focus(&self) -> bool;
    /// `Notification.permission` at the time of the call.
    fn notification_permission(&self) -> PermissionState;
    fn focus_window(&self);
    fn show_notification(&self, notification: LocalNotification);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(pub u64);

pub type MessageListener = Box<dyn Fn(ChatMessageEvent)>;

pub trait ChatEventSource {
    fn on_message_new(&self, listener: MessageListener) -> ListenerKey;
    fn off_message_new(&self, key: ListenerKey);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientWindow {
    pub id: String,
    pub url: String,
}

/// Global scope of the background agent.
pub trait AgentHost {
    fn origin(&self) -> &str;
    fn show_notification(
        &self,
        payload: &NotificationPayload,
    ) -> impl Future<Output = Result<(), ClientError>>;
    fn close_notification(&self, tag: &str);
    fn match_windows(&self) -> impl Future<Output = Vec<ClientWindow>>;
    fn focus(&self, window: &ClientWindow) -> impl Future<Output = Result<(), ClientError>>;
    fn open_window(&self, url: &str) -> impl Future<Output = Result<(), ClientError>>;
    fn skip_waiting(&self);
    fn claim_clients(&self) -> impl Future<Output = Result<(), ClientError>>;
}
