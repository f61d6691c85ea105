use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use web_push::WebPushError;

use crate::ports;
use crate::ports::push::DeliveryError;
use crate::types::push::{Subscription, VapidConfig};

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimeProvider;

impl ports::TimeProvider for TokioTimeProvider {
    type Sleep<'a>
        = tokio::time::Sleep
    where
        Self: 'a;

    fn sleep<'a>(&'a self, duration: Duration) -> Self::Sleep<'a> {
        tokio::time::sleep(duration)
    }
}

#[derive(Clone)]
pub struct WebPushSender {
    vapid: VapidConfig,
    client: Arc<web_push::WebPushClient>,
}

impl WebPushSender {
    pub fn new(vapid: VapidConfig) -> Result<Self, WebPushError> {
        let client = web_push::WebPushClient::new()?;
        Ok(Self {
            vapid,
            client: Arc::new(client),
        })
    }

    async fn deliver(&self, subscription: &Subscription, payload: &[u8]) -> Result<(), WebPushError> {
        let subscription_info = web_push::SubscriptionInfo::new(
            subscription.endpoint.clone(),
            subscription.keys.p256dh.clone(),
            subscription.keys.auth.clone(),
        );
        let mut builder = web_push::WebPushMessageBuilder::new(&subscription_info)?;
        builder.set_payload(web_push::ContentEncoding::Aes128Gcm, payload);
        let mut signature_builder = web_push::VapidSignatureBuilder::from_base64(
            &self.vapid.private_key,
            web_push::URL_SAFE_NO_PAD,
            &subscription_info,
        )?;
        signature_builder.add_claim("sub", self.vapid.subject.as_str());
        builder.set_vapid_signature(signature_builder.build()?);
        self.client.send(builder.build()?).await
    }
}

impl ports::PushSender for WebPushSender {
    type Fut<'a>
        = Pin<Box<dyn Future<Output = Result<(), DeliveryError>> + Send + 'a>>
    where
        Self: 'a;

    fn send<'a>(&'a self, subscription: &'a Subscription, payload: &'a [u8]) -> Self::Fut<'a> {
        Box::pin(async move {
            self.deliver(subscription, payload)
                .await
                .map_err(classify_web_push_error)
        })
    }
}

/// Maps push-service failures onto what the caller should do about them.
/// 404 and 410 responses, and descriptors that cannot be encrypted for,
/// mean the subscription is unusable.
pub(crate) fn classify_web_push_error(err: WebPushError) -> DeliveryError {
    match err {
        WebPushError::EndpointNotValid { .. }
        | WebPushError::EndpointNotFound { .. }
        | WebPushError::InvalidUri { .. }
        | WebPushError::MissingCryptoKeys { .. }
        | WebPushError::InvalidCryptoKeys { .. } => {
            DeliveryError::InvalidSubscription(err.to_string())
        }
        WebPushError::PayloadTooLarge { .. } => DeliveryError::MalformedPayload(err.to_string()),
        other => DeliveryError::Transient(other.to_string()),
    }
}
