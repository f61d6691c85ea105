//! Fan-out of chat-provider webhook events into push notifications.

use crate::ports;
use crate::push::{DeliveryOutcome, Dispatcher};
use crate::types::chat::{MessageNewEvent, WebhookEvent};
use crate::types::push::{MessageData, NotificationAppearance, NotificationPayload};

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientDelivery {
    pub user_id: String,
    pub outcome: DeliveryOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanOutReport {
    pub channel_id: String,
    pub message_id: String,
    pub deliveries: Vec<RecipientDelivery>,
}

impl FanOutReport {
    pub fn delivered(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|delivery| delivery.outcome == DeliveryOutcome::Delivered)
            .count()
    }
}

/// Acts on one webhook event. Only `message.new` produces deliveries.
pub async fn handle_event<T, S, R>(
    event: WebhookEvent,
    dispatcher: &Dispatcher<T, S>,
    store: &R,
    appearance: &NotificationAppearance,
) -> Option<FanOutReport>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
    R: ports::SubscriptionStore + ?Sized,
{
    match event {
        WebhookEvent::MessageNew(event) => {
            Some(fan_out_message(&event, dispatcher, store, appearance).await)
        }
        WebhookEvent::UserPresence { user } => {
            tracing::debug!(user_id = ?user.map(|user| user.id), "presence update ignored");
            None
        }
        WebhookEvent::Unknown => None,
    }
}

pub fn message_notification(
    event: &MessageNewEvent,
    appearance: &NotificationAppearance,
) -> NotificationPayload {
    NotificationPayload::for_message(
        event.user.name.as_deref(),
        event.message.text.as_deref(),
        MessageData {
            channel_id: event.channel.id.clone(),
            message_id: event.message.id.clone(),
            sender_id: event.user.id.clone(),
            sender_name: event.user.name.clone(),
        },
        appearance,
    )
}

async fn fan_out_message<T, S, R>(
    event: &MessageNewEvent,
    dispatcher: &Dispatcher<T, S>,
    store: &R,
    appearance: &NotificationAppearance,
) -> FanOutReport
where
    T: ports::TimeProvider,
    S: ports::PushSender,
    R: ports::SubscriptionStore + ?Sized,
{
    let recipients = event.recipients();
    tracing::info!(
        channel_id = %event.channel.id,
        message_id = %event.message.id,
        sender_id = %event.user.id,
        recipients = recipients.len(),
        "fanning out new message"
    );

    let payload = message_notification(event, appearance);
    let mut deliveries = Vec::with_capacity(recipients.len());
    for user_id in recipients {
        let outcome = dispatcher.deliver_to_user(store, user_id, &payload).await;
        match &outcome {
            DeliveryOutcome::Delivered => tracing::info!(user_id, "push notification sent"),
            DeliveryOutcome::NoSubscription => {
                tracing::debug!(user_id, "no push subscription for recipient")
            }
            DeliveryOutcome::Evicted => {
                tracing::warn!(user_id, "recipient subscription expired")
            }
            DeliveryOutcome::Failed(err) => {
                tracing::error!(user_id, error = %err, "push delivery failed")
            }
        }
        deliveries.push(RecipientDelivery {
            user_id: user_id.to_string(),
            outcome,
        });
    }

    FanOutReport {
        channel_id: event.channel.id.clone(),
        message_id: event.message.id.clone(),
        deliveries,
    }
}

/// Checks a hex HMAC-SHA256 signature of the raw request body.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}
