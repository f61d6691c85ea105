use crate::types::push::Subscription;

use serde::Serialize;
use std::collections::HashMap;
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize)]
pub struct RegistryEntry {
    pub subscription: Subscription,
    pub registered_at: OffsetDateTime,
}

/// User id to push subscription mapping. Absence is a normal result.
pub trait SubscriptionStore: Send + Sync + 'static {
    /// Stores `subscription` for `user_id`, replacing any previous one.
    fn put(&self, user_id: &str, subscription: Subscription);
    fn get(&self, user_id: &str) -> Option<Subscription>;
    /// Returns whether an entry was removed.
    fn delete(&self, user_id: &str) -> bool;
    /// Point-in-time copy of every entry, for diagnostics.
    fn snapshot(&self) -> HashMap<String, RegistryEntry>;
}
