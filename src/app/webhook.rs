use crate::error::ApiError;
use crate::ports;
use crate::state;
use crate::types::chat::WebhookEvent;
use crate::webhook::{self as webhook_service, SIGNATURE_HEADER};

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub(crate) struct WebhookResponse {
    pub(crate) success: bool,
}

/// Acknowledges every parseable event. Per-recipient delivery failures are
/// logged inside the fan-out and never change the response.
pub(crate) async fn receive_webhook<T, S>(
    State(state): State<state::AppState<T, S>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let chat = &state.config.chat;
    if chat.verify_signatures {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if !webhook_service::verify_signature(&chat.api_secret, &body, signature) {
            return Err(ApiError::Unauthorized("Invalid webhook signature".to_string()));
        }
    }

    let value: Value = serde_json::from_slice(&body).map_err(|err| {
        tracing::error!(error = %err, "webhook body is not valid JSON");
        ApiError::Parse("Webhook payload could not be parsed".to_string())
    })?;
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("<missing>")
        .to_string();
    tracing::info!(event_type = %event_type, "webhook received");

    let event = match WebhookEvent::from_value(value) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(event_type = %event_type, error = %err, "ignoring malformed webhook event");
            return Ok(Json(WebhookResponse { success: true }));
        }
    };

    if let Some(report) = webhook_service::handle_event(
        event,
        &*state.dispatcher,
        &*state.registry,
        &state.config.appearance,
    )
    .await
    {
        tracing::info!(
            message_id = %report.message_id,
            recipients = report.deliveries.len(),
            delivered = report.delivered(),
            "webhook fan-out finished"
        );
    }

    Ok(Json(WebhookResponse { success: true }))
}
