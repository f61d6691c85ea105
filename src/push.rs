mod dispatcher;
mod vapid;

pub use dispatcher::{DeliveryOutcome, Dispatcher, MAX_PAYLOAD_BYTES, RetryPolicy};
pub use vapid::{VapidCredentials, generate_vapid_credentials, load_vapid_config};

#[cfg(test)]
pub(crate) use dispatcher::tests::{HangingSender, InstantTime, ScriptedSender};
