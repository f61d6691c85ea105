pub mod browser;
pub mod push;
pub mod store;
pub mod time;

pub use push::PushSender;
pub use store::SubscriptionStore;
pub use time::TimeProvider;
