use crate::ports::SubscriptionStore;
use crate::ports::store::RegistryEntry;
use crate::types::push::Subscription;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;

/// Process-lifetime subscription registry. Entries are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySubscriptionStore {
    entries: Mutex<HashMap<String, RegistryEntry>>,
}

impl MemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, RegistryEntry>> {
        // A poisoned map still holds complete entries; every write is a
        // single insert or remove.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SubscriptionStore for MemorySubscriptionStore {
    fn put(&self, user_id: &str, subscription: Subscription) {
        let entry = RegistryEntry {
            subscription,
            registered_at: OffsetDateTime::now_utc(),
        };
        let replaced = self.lock().insert(user_id.to_string(), entry).is_some();
        tracing::info!(user_id, replaced, "stored push subscription");
    }

    fn get(&self, user_id: &str) -> Option<Subscription> {
        self.lock()
            .get(user_id)
            .map(|entry| entry.subscription.clone())
    }

    fn delete(&self, user_id: &str) -> bool {
        let removed = self.lock().remove(user_id).is_some();
        if removed {
            tracing::info!(user_id, "removed push subscription");
        }
        removed
    }

    fn snapshot(&self) -> HashMap<String, RegistryEntry> {
        self.lock().clone()
    }
}
