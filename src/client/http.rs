use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::client::ClientError;
use crate::ports::browser::RelayApi;
use crate::types::push::{PushRequest, Subscription};

const REGISTER_PATH: &str = "/register-push-subscription";
const SEND_PATH: &str = "/send-push-notification";
const SUBSCRIPTION_HEADER: &str = "x-push-subscription";
/// Bound on each relay request, connect through response body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody<'a> {
    user_id: &'a str,
    subscription: &'a Subscription,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeregisterBody<'a> {
    user_id: &'a str,
}

/// [`RelayApi`] over HTTP, pointed at a running relay.
#[derive(Debug, Clone)]
pub struct HttpRelayClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn accepted(response: reqwest::Response) -> Result<(), ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let message = match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };
    Err(ClientError::Rejected {
        status: status.as_u16(),
        message,
    })
}

impl RelayApi for HttpRelayClient {
    async fn register(&self, user_id: &str, subscription: &Subscription) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url(REGISTER_PATH))
            .json(&RegisterBody {
                user_id,
                subscription,
            })
            .send()
            .await?;
        accepted(response).await
    }

    async fn deregister(&self, user_id: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(REGISTER_PATH))
            .json(&DeregisterBody { user_id })
            .send()
            .await?;
        accepted(response).await
    }

    async fn send_push(
        &self,
        subscription: &Subscription,
        request: &PushRequest,
    ) -> Result<(), ClientError> {
        let descriptor = serde_json::to_string(subscription)?;
        let response = self
            .http
            .post(self.url(SEND_PATH))
            .header(SUBSCRIPTION_HEADER, descriptor)
            .json(request)
            .send()
            .await?;
        accepted(response).await
    }
}
