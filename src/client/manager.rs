use crate::client::permission::PermissionState;
use crate::client::{AGENT_SCRIPT_URL, ClientError, SUBSCRIPTION_STORAGE_KEY};
use crate::ports::browser::{KeyValueStore, PermissionPrompt, PushManager, RelayApi};
use crate::types::push::Subscription;

#[derive(Debug, Clone, PartialEq)]
pub enum EnableOutcome {
    Unsupported,
    NotGranted(PermissionState),
    /// `registered` is false when the relay could not be reached; the local
    /// copy is kept either way.
    Subscribed {
        subscription: Subscription,
        registered: bool,
    },
}

/// Owns the browser side of a user's push subscription.
pub struct SubscriptionManager<P, M, K, R> {
    prompt: P,
    push: M,
    storage: K,
    relay: R,
    public_key: String,
}

impl<P, M, K, R> SubscriptionManager<P, M, K, R>
where
    P: PermissionPrompt,
    M: PushManager,
    K: KeyValueStore,
    R: RelayApi,
{
    pub fn new(prompt: P, push: M, storage: K, relay: R, public_key: impl Into<String>) -> Self {
        Self {
            prompt,
            push,
            storage,
            relay,
            public_key: public_key.into(),
        }
    }

    pub fn permission(&self) -> PermissionState {
        if self.prompt.is_supported() {
            self.prompt.current()
        } else {
            PermissionState::Unsupported
        }
    }

    pub async fn enable(&self, user_id: &str) -> Result<EnableOutcome, ClientError> {
        let mut state = self.permission();
        if state == PermissionState::Unsupported {
            tracing::warn!("push notifications are not supported in this browser");
            return Ok(EnableOutcome::Unsupported);
        }
        if state.can_request() {
            state = state.after_request(self.prompt.request().await);
        }
        if state != PermissionState::Granted {
            tracing::warn!(permission = %state, "notification permission not granted");
            return Ok(EnableOutcome::NotGranted(state));
        }

        self.push.register_agent(AGENT_SCRIPT_URL).await?;
        let subscription = self.push.subscribe(&self.public_key).await?;
        let raw = serde_json::to_string(&subscription)?;
        self.storage.set_item(SUBSCRIPTION_STORAGE_KEY, &raw)?;

        let registered = match self.relay.register(user_id, &subscription).await {
            Ok(()) => {
                tracing::info!(user_id, "push subscription registered with relay");
                true
            }
            Err(err) => {
                tracing::warn!(user_id, error = %err, "could not register push subscription with relay");
                false
            }
        };

        Ok(EnableOutcome::Subscribed {
            subscription,
            registered,
        })
    }

    /// Cancels the browser subscription, forgets the local copy and asks the
    /// relay to drop its entry. Returns whether a browser subscription existed.
    pub async fn disable(&self, user_id: &str) -> Result<bool, ClientError> {
        let existed = self.push.unsubscribe().await?;
        self.storage.remove_item(SUBSCRIPTION_STORAGE_KEY);
        if let Err(err) = self.relay.deregister(user_id).await {
            tracing::warn!(user_id, error = %err, "could not deregister push subscription");
        }
        Ok(existed)
    }

    pub fn stored_subscription(&self) -> Option<Subscription> {
        read_stored_subscription(&self.storage)
    }
}

pub fn read_stored_subscription<K: KeyValueStore>(storage: &K) -> Option<Subscription> {
    let raw = storage.get_item(SUBSCRIPTION_STORAGE_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(subscription) => Some(subscription),
        Err(err) => {
            tracing::warn!(error = %err, "stored push subscription is unreadable");
            None
        }
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::client::fakes::{FakePrompt, FakePushManager, FakeRelay, MemoryStorage, RelayCall};
    use crate::client::permission::PermissionDecision;

    type TestManager = SubscriptionManager<FakePrompt, FakePushManager, MemoryStorage, FakeRelay>;

    fn manager(prompt: FakePrompt, storage: MemoryStorage, relay: FakeRelay) -> (TestManager, FakePushManager) {
        let push = FakePushManager::default();
        (
            SubscriptionManager::new(prompt, push.clone(), storage, relay, "server-public-key"),
            push,
        )
    }

    #[tokio::test]
    async fn enable__should_subscribe_persist_and_register_when_granted() {
        // Given
        let storage = MemoryStorage::default();
        let relay = FakeRelay::default();
        let prompt = FakePrompt::new(PermissionState::Default, PermissionDecision::Granted);
        let (manager, push) = manager(prompt, storage.clone(), relay.clone());

        // When
        let outcome = manager.enable("alice").await.expect("enable");

        // Then
        let subscription = Subscription::new("https://push.example/browser", "p256", "auth");
        assert_eq!(
            outcome,
            EnableOutcome::Subscribed {
                subscription: subscription.clone(),
                registered: true,
            }
        );
        assert_eq!(*push.agents.borrow(), vec![AGENT_SCRIPT_URL.to_string()]);
        assert_eq!(*push.server_keys.borrow(), vec!["server-public-key".to_string()]);
        assert_eq!(manager.stored_subscription(), Some(subscription.clone()));
        assert_eq!(
            *relay.calls.borrow(),
            vec![RelayCall::Register("alice".to_string(), subscription)]
        );
        assert_eq!(manager.permission(), PermissionState::Granted);
    }

    #[tokio::test]
    async fn enable__should_keep_local_copy_when_relay_unreachable() {
        // Given
        let storage = MemoryStorage::default();
        let prompt = FakePrompt::new(PermissionState::Default, PermissionDecision::Granted);
        let (manager, _) = manager(prompt, storage, FakeRelay::offline());

        // When
        let outcome = manager.enable("alice").await.expect("enable");

        // Then
        assert!(matches!(outcome, EnableOutcome::Subscribed { registered: false, .. }));
        assert!(manager.stored_subscription().is_some());
    }

    #[tokio::test]
    async fn enable__should_stop_when_user_denies() {
        // Given
        let storage = MemoryStorage::default();
        let relay = FakeRelay::default();
        let prompt = FakePrompt::new(PermissionState::Default, PermissionDecision::Denied);
        let (manager, push) = manager(prompt.clone(), storage, relay.clone());

        // When
        let first = manager.enable("alice").await.expect("enable");
        let second = manager.enable("alice").await.expect("enable again");

        // Then
        assert_eq!(first, EnableOutcome::NotGranted(PermissionState::Denied));
        assert_eq!(second, EnableOutcome::NotGranted(PermissionState::Denied));
        assert_eq!(prompt.requests.get(), 1);
        assert!(push.agents.borrow().is_empty());
        assert!(relay.calls.borrow().is_empty());
        assert_eq!(manager.stored_subscription(), None);
    }

    #[tokio::test]
    async fn enable__should_never_prompt_when_unsupported() {
        // Given
        let prompt = FakePrompt::new(PermissionState::Unsupported, PermissionDecision::Granted);
        let (manager, push) = manager(prompt.clone(), MemoryStorage::default(), FakeRelay::default());

        // When
        let outcome = manager.enable("alice").await.expect("enable");

        // Then
        assert_eq!(outcome, EnableOutcome::Unsupported);
        assert_eq!(prompt.requests.get(), 0);
        assert_eq!(manager.permission(), PermissionState::Unsupported);
        assert!(push.agents.borrow().is_empty());
    }

    #[tokio::test]
    async fn disable__should_unsubscribe_clear_storage_and_deregister() {
        // Given
        let storage = MemoryStorage::default();
        let relay = FakeRelay::default();
        let prompt = FakePrompt::new(PermissionState::Granted, PermissionDecision::Granted);
        let (manager, push) = manager(prompt, storage.clone(), relay.clone());
        manager.enable("alice").await.expect("enable");

        // When
        let existed = manager.disable("alice").await.expect("disable");

        // Then
        assert!(existed);
        assert!(push.active.borrow().is_none());
        assert_eq!(manager.stored_subscription(), None);
        assert_eq!(
            relay.calls.borrow().last(),
            Some(&RelayCall::Deregister("alice".to_string()))
        );
    }

    #[test]
    fn read_stored_subscription__should_ignore_corrupt_value() {
        let storage = MemoryStorage::default();
        storage
            .set_item(SUBSCRIPTION_STORAGE_KEY, "{broken")
            .expect("set item");

        assert_eq!(read_stored_subscription(&storage), None);
    }
}
