use std::time::Duration;

use tokio::sync::mpsc;

use crate::client::manager::read_stored_subscription;
use crate::client::permission::PermissionState;
use crate::ports::browser::{
    ChatEventSource, ClickTarget, KeyValueStore, ListenerKey, LocalNotification, Page, RelayApi,
};
use crate::types::chat::ChatMessageEvent;
use crate::types::push::{MessageData, NotificationAppearance, NotificationPayload, PushRequest};

pub const LOCAL_NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    OwnMessage,
    MissingIds,
    ShownLocally,
    /// The page is focused but may not show notifications.
    PermissionNotGranted(PermissionState),
    PushRequested,
    NoStoredSubscription,
    PushFailed(String),
}

type MessageCallback = Box<dyn Fn(&str, &str)>;

/// Decides, per incoming chat message, between an in-page notification and
/// a push sent through the relay.
pub struct Notifier<P, K, R> {
    current_user: String,
    page: P,
    storage: K,
    relay: R,
    appearance: NotificationAppearance,
    on_message: Option<MessageCallback>,
}

impl<P, K, R> Notifier<P, K, R>
where
    P: Page,
    K: KeyValueStore,
    R: RelayApi,
{
    pub fn new(current_user: impl Into<String>, page: P, storage: K, relay: R) -> Self {
        Self {
            current_user: current_user.into(),
            page,
            storage,
            relay,
            appearance: NotificationAppearance::default(),
            on_message: None,
        }
    }

    pub fn with_appearance(self, appearance: NotificationAppearance) -> Self {
        Self { appearance, ..self }
    }

    /// Called with `(channel_id, message_id)` when a local notification is clicked.
    pub fn on_message(self, callback: impl Fn(&str, &str) + 'static) -> Self {
        Self {
            on_message: Some(Box::new(callback)),
            ..self
        }
    }

    pub async fn handle_message(&self, event: &ChatMessageEvent) -> NotifyOutcome {
        if event.sender_id.as_deref() == Some(self.current_user.as_str()) {
            return NotifyOutcome::OwnMessage;
        }
        let (Some(channel_id), Some(message_id)) = (&event.channel_id, &event.message_id) else {
            tracing::debug!("chat event without channel or message id");
            return NotifyOutcome::MissingIds;
        };

        let data = MessageData {
            channel_id: channel_id.clone(),
            message_id: message_id.clone(),
            sender_id: event.sender_id.clone().unwrap_or_default(),
            sender_name: event.sender_name.clone(),
        };
        let payload = NotificationPayload::for_message(
            event.sender_name.as_deref(),
            event.text.as_deref(),
            data,
            &self.appearance,
        );

        if self.page.has_focus() {
            let permission = self.page.notification_permission();
            if permission != PermissionState::Granted {
                tracing::debug!(%permission, "notification permission not granted, skipping");
                return NotifyOutcome::PermissionNotGranted(permission);
            }
            self.page.show_notification(LocalNotification {
                payload,
                auto_dismiss: LOCAL_NOTIFICATION_TIMEOUT,
                click: ClickTarget {
                    channel_id: channel_id.clone(),
                    message_id: message_id.clone(),
                },
            });
            return NotifyOutcome::ShownLocally;
        }

        let Some(subscription) = read_stored_subscription(&self.storage) else {
            tracing::warn!("no stored push subscription, skipping background push");
            return NotifyOutcome::NoStoredSubscription;
        };
        let request = PushRequest {
            title: payload.title,
            body: payload.body,
            data: payload.data,
        };
        match self.relay.send_push(&subscription, &request).await {
            Ok(()) => NotifyOutcome::PushRequested,
            Err(err) => {
                tracing::warn!(error = %err, "relay push request failed");
                NotifyOutcome::PushFailed(err.to_string())
            }
        }
    }

    pub fn on_local_click(&self, target: &ClickTarget) {
        self.page.focus_window();
        if let Some(callback) = &self.on_message {
            callback(&target.channel_id, &target.message_id);
        }
    }

    /// Handles queued events until every sender is gone.
    pub async fn run(&self, mut events: mpsc::UnboundedReceiver<ChatMessageEvent>) {
        while let Some(event) = events.recv().await {
            let outcome = self.handle_message(&event).await;
            tracing::debug!(?outcome, "chat message handled");
        }
    }
}

/// Keeps a `message.new` listener attached until disposed or dropped.
pub struct ListenerGuard<'a, C: ChatEventSource> {
    source: &'a C,
    key: Option<ListenerKey>,
}

impl<C: ChatEventSource> ListenerGuard<'_, C> {
    pub fn dispose(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(key) = self.key.take() {
            self.source.off_message_new(key);
        }
    }
}

impl<C: ChatEventSource> Drop for ListenerGuard<'_, C> {
    fn drop(&mut self) {
        self.detach();
    }
}

/// Forwards `message.new` events from `source` into `events`.
pub fn attach<C: ChatEventSource>(
    source: &C,
    events: mpsc::UnboundedSender<ChatMessageEvent>,
) -> ListenerGuard<'_, C> {
    let key = source.on_message_new(Box::new(move |event| {
        let _ = events.send(event);
    }));
    ListenerGuard {
        source,
        key: Some(key),
    }
}
