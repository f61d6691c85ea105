use crate::ports;
use crate::ports::push::DeliveryError;
use crate::types::push::{NotificationPayload, Subscription};

use std::time::Duration;

/// Largest plaintext payload push services accept once encryption overhead
/// is accounted for.
pub const MAX_PAYLOAD_BYTES: usize = 3800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Upper bound on a single attempt; expiry counts as a transient failure.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    NoSubscription,
    /// The push service reported the subscription gone; it was removed.
    Evicted,
    Failed(DeliveryError),
}

#[derive(Debug, Clone)]
pub struct Dispatcher<T, S> {
    time: T,
    sender: S,
    retry: RetryPolicy,
}

impl<T, S> Dispatcher<T, S>
where
    T: ports::TimeProvider,
    S: ports::PushSender,
{
    pub fn new(time: T, sender: S, retry: RetryPolicy) -> Self {
        Self {
            time,
            sender,
            retry,
        }
    }

    pub async fn send(
        &self,
        subscription: &Subscription,
        payload: &NotificationPayload,
    ) -> Result<(), DeliveryError> {
        let bytes = payload
            .to_bytes()
            .map_err(|err| DeliveryError::MalformedPayload(err.to_string()))?;
        if bytes.len() > MAX_PAYLOAD_BYTES {
            return Err(DeliveryError::MalformedPayload(format!(
                "payload is {} bytes, limit is {MAX_PAYLOAD_BYTES}",
                bytes.len()
            )));
        }

        let mut attempt = 1;
        loop {
            match self.attempt(subscription, &bytes).await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        endpoint = %subscription.endpoint,
                        "push delivery failed, retrying"
                    );
                    self.time.sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn attempt(&self, subscription: &Subscription, bytes: &[u8]) -> Result<(), DeliveryError> {
        let limit = self.retry.attempt_timeout;
        tokio::select! {
            biased;
            result = self.sender.send(subscription, bytes) => result,
            () = self.time.deadline(limit) => Err(DeliveryError::Transient(format!(
                "push service did not answer within {} ms",
                limit.as_millis()
            ))),
        }
    }

    /// Sends to the subscription stored for `user_id`, evicting it when the
    /// push service reports it gone.
    pub async fn deliver_to_user<R>(
        &self,
        store: &R,
        user_id: &str,
        payload: &NotificationPayload,
    ) -> DeliveryOutcome
    where
        R: ports::SubscriptionStore + ?Sized,
    {
        let Some(subscription) = store.get(user_id) else {
            return DeliveryOutcome::NoSubscription;
        };

        match self.send(&subscription, payload).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(DeliveryError::InvalidSubscription(reason)) => {
                // Leave a subscription registered while this send was in flight.
                if store.get(user_id).as_ref() == Some(&subscription) {
                    store.delete(user_id);
                }
                tracing::info!(user_id, %reason, "evicted invalid push subscription");
                DeliveryOutcome::Evicted
            }
            Err(err) => DeliveryOutcome::Failed(err),
        }
    }
}
