use crate::push::RetryPolicy;
use crate::types::push::{NotificationAppearance, VapidConfig};

pub const PLACEHOLDER_API_SECRET: &str = "demo_secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub vapid: VapidConfig,
    pub chat: ChatProviderConfig,
    pub retry: RetryPolicy,
    pub appearance: NotificationAppearance,
}

/// Webhook settings for the chat provider. `api_secret` keys the HMAC that
/// signs each webhook body.
#[derive(Debug, Clone)]
pub struct ChatProviderConfig {
    pub api_secret: String,
    pub verify_signatures: bool,
}

impl ChatProviderConfig {
    pub fn uses_placeholder_secret(&self) -> bool {
        self.api_secret.is_empty() || self.api_secret == PLACEHOLDER_API_SECRET
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            vapid: VapidConfig {
                private_key: "9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE".to_string(),
                public_key: "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U".to_string(),
                subject: "mailto:ops@example.com".to_string(),
            },
            chat: ChatProviderConfig {
                api_secret: PLACEHOLDER_API_SECRET.to_string(),
                verify_signatures: false,
            },
            retry: RetryPolicy::default(),
            appearance: NotificationAppearance::default(),
        }
    }
}
