use crate::adapters::{TokioTimeProvider, WebPushSender};
use crate::config;
use crate::error::{ApiError, ConfigError};
use crate::ports;
use crate::push::Dispatcher;
use crate::registry::MemorySubscriptionStore;
use crate::state;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use std::sync::Arc;

mod push;
mod webhook;

pub fn app(config: config::AppConfig) -> Result<Router, ConfigError> {
    app_with_store(config, Arc::new(MemorySubscriptionStore::new()))
}

/// Like [`app`], but keeps subscriptions in `store` instead of process memory.
pub fn app_with_store(
    config: config::AppConfig,
    store: Arc<dyn ports::SubscriptionStore>,
) -> Result<Router, ConfigError> {
    let sender = WebPushSender::new(config.vapid.clone())
        .map_err(|err| ConfigError::PushClient(err.to_string()))?;
    Ok(router(build_state_with_store(
        config,
        TokioTimeProvider,
        sender,
        store,
    )))
}

#[cfg(test)]
pub(crate) fn build_state<T, S>(config: config::AppConfig, time: T, sender: S) -> state::AppState<T, S>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    build_state_with_store(config, time, sender, Arc::new(MemorySubscriptionStore::new()))
}

pub(crate) fn build_state_with_store<T, S>(
    config: config::AppConfig,
    time: T,
    sender: S,
    store: Arc<dyn ports::SubscriptionStore>,
) -> state::AppState<T, S>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    let dispatcher = Dispatcher::new(time, sender, config.retry);
    state::AppState {
        config: Arc::new(config),
        registry: store,
        dispatcher: Arc::new(dispatcher),
    }
}

pub(crate) fn router<T, S>(state: state::AppState<T, S>) -> Router
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    Router::new()
        .route(
            "/register-push-subscription",
            post(push::register_subscription::<T, S>)
                .put(push::send_to_user::<T, S>)
                .delete(push::deregister_subscription::<T, S>),
        )
        .route(
            "/send-push-notification",
            post(push::send_push_notification::<T, S>),
        )
        .route("/webhook", post(webhook::receive_webhook::<T, S>))
        .route(
            "/test-browser-notification",
            post(push::test_browser_notification::<T, S>),
        )
        .route("/api/push/public-key", get(push::push_public_key::<T, S>))
        .route(
            "/api/debug/push/registry",
            get(push::push_registry_debug::<T, S>),
        )
        .route("/health", get(health))
        .with_state(state)
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// Treats blank strings like absent ones.
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
