use crate::app::{json_body, required};
use crate::error::ApiError;
use crate::ports;
use crate::ports::store::RegistryEntry;
use crate::ports::push::DeliveryError;
use crate::push::DeliveryOutcome;
use crate::state;
use crate::types::push::{NotificationPayload, Subscription};

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub(crate) const SUBSCRIPTION_HEADER: &str = "x-push-subscription";

#[derive(Serialize)]
pub(crate) struct SuccessResponse {
    pub(crate) success: bool,
    pub(crate) message: &'static str,
}

impl SuccessResponse {
    fn new(message: &'static str) -> Json<Self> {
        Json(Self {
            success: true,
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest {
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) subscription: Option<Value>,
}

pub(crate) async fn register_subscription<T, S>(
    State(state): State<state::AppState<T, S>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let request = json_body(body)?;
    let (Some(user_id), Some(subscription)) = (required(request.user_id), request.subscription)
    else {
        return Err(ApiError::validation("Missing userId or subscription"));
    };
    let subscription: Subscription = serde_json::from_value(subscription)
        .ok()
        .filter(Subscription::is_complete)
        .ok_or_else(|| ApiError::validation("Invalid push subscription"))?;

    tracing::info!(user_id = %user_id, endpoint = %subscription.endpoint, "registering push subscription");
    state.registry.put(&user_id, subscription.clone());

    let check = NotificationPayload::new(
        "Test Notification",
        "Push notifications are working!",
        &state.config.appearance,
    );
    if let Err(err) = state.dispatcher.send(&subscription, &check).await {
        tracing::warn!(user_id = %user_id, error = %err, "push subscription failed validation");
        if state.registry.get(&user_id).as_ref() == Some(&subscription) {
            state.registry.delete(&user_id);
        }
        return Err(ApiError::validation("Invalid push subscription"));
    }

    Ok(SuccessResponse::new("Push subscription registered successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendToUserRequest {
    #[serde(default)]
    pub(crate) user_id: Option<String>,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) data: Value,
}

pub(crate) async fn send_to_user<T, S>(
    State(state): State<state::AppState<T, S>>,
    body: Result<Json<SendToUserRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let request = json_body(body)?;
    let (Some(user_id), Some(title), Some(body)) = (
        required(request.user_id),
        required(request.title),
        required(request.body),
    ) else {
        return Err(ApiError::validation("Missing required fields"));
    };

    let payload =
        NotificationPayload::new(title, body, &state.config.appearance).with_data(request.data);
    match state
        .dispatcher
        .deliver_to_user(&*state.registry, &user_id, &payload)
        .await
    {
        DeliveryOutcome::Delivered => {
            tracing::info!(user_id = %user_id, "push notification sent");
            Ok(SuccessResponse::new("Push notification sent successfully"))
        }
        DeliveryOutcome::NoSubscription => Err(ApiError::not_found(format!(
            "No push subscription registered for user {user_id}"
        ))),
        DeliveryOutcome::Evicted => Err(ApiError::Gone {
            message: "Push subscription expired".to_string(),
            details: format!("The subscription for user {user_id} was removed"),
        }),
        DeliveryOutcome::Failed(err) => Err(ApiError::upstream(
            "Failed to send push notification",
            err,
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeregisterRequest {
    #[serde(default)]
    pub(crate) user_id: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct DeregisterResponse {
    pub(crate) success: bool,
    pub(crate) removed: bool,
}

pub(crate) async fn deregister_subscription<T, S>(
    State(state): State<state::AppState<T, S>>,
    body: Result<Json<DeregisterRequest>, JsonRejection>,
) -> Result<Json<DeregisterResponse>, ApiError>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let request = json_body(body)?;
    let user_id =
        required(request.user_id).ok_or_else(|| ApiError::validation("Missing userId"))?;
    let removed = state.registry.delete(&user_id);
    Ok(Json(DeregisterResponse {
        success: true,
        removed,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirectPushRequest {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) body: Option<String>,
    #[serde(default)]
    pub(crate) data: Value,
}

/// Sends to the subscription carried in the request header rather than one
/// from the registry.
pub(crate) async fn send_push_notification<T, S>(
    State(state): State<state::AppState<T, S>>,
    headers: HeaderMap,
    body: Result<Json<DirectPushRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let request = json_body(body)?;
    let (Some(title), Some(body)) = (required(request.title), required(request.body)) else {
        return Err(ApiError::validation("Missing title or body"));
    };

    let raw = headers
        .get(SUBSCRIPTION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::validation("No push subscription provided"))?;
    let subscription: Subscription = serde_json::from_str(raw)
        .ok()
        .filter(Subscription::is_complete)
        .ok_or_else(|| ApiError::validation("Invalid push subscription header"))?;

    let payload =
        NotificationPayload::new(title, body, &state.config.appearance).with_data(request.data);
    state
        .dispatcher
        .send(&subscription, &payload)
        .await
        .map_err(|err: DeliveryError| ApiError::delivery("Failed to send push notification", err))?;

    tracing::info!(endpoint = %subscription.endpoint, "direct push notification sent");
    Ok(SuccessResponse::new("Push notification sent successfully"))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TestNotificationRequest {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) body: Option<String>,
}

#[derive(Serialize)]
pub(crate) struct TestNotificationResponse {
    pub(crate) success: bool,
    pub(crate) message: &'static str,
    pub(crate) notification: NotificationPayload,
}

pub(crate) async fn test_browser_notification<T, S>(
    State(state): State<state::AppState<T, S>>,
    body: Result<Json<TestNotificationRequest>, JsonRejection>,
) -> Result<Json<TestNotificationResponse>, ApiError>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let request = json_body(body)?;
    let notification = NotificationPayload::new(
        required(request.title).unwrap_or_else(|| "Test Notification".to_string()),
        required(request.body).unwrap_or_else(|| "This is a test notification".to_string()),
        &state.config.appearance,
    )
    .with_tag("test-notification");

    Ok(Json(TestNotificationResponse {
        success: true,
        message: "Test notification data",
        notification,
    }))
}

#[derive(Serialize)]
pub(crate) struct PublicKeyResponse {
    #[serde(rename = "publicKey")]
    pub(crate) public_key: String,
}

pub(crate) async fn push_public_key<T, S>(
    State(state): State<state::AppState<T, S>>,
) -> Json<PublicKeyResponse>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    Json(PublicKeyResponse {
        public_key: state.config.vapid.public_key.clone(),
    })
}

pub(crate) async fn push_registry_debug<T, S>(
    State(state): State<state::AppState<T, S>>,
) -> Json<HashMap<String, RegistryEntry>>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    Json(state.registry.snapshot())
}
