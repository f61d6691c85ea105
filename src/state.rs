use crate::config::AppConfig;
use crate::push::Dispatcher;
use crate::ports::SubscriptionStore;

use std::sync::Arc;

pub struct AppState<T, S> {
    pub config: Arc<AppConfig>,
    pub registry: Arc<dyn SubscriptionStore>,
    pub dispatcher: Arc<Dispatcher<T, S>>,
}

impl<T, S> Clone for AppState<T, S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            registry: Arc::clone(&self.registry),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}
