use log::*;
use scb_common::Secret;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    /// The endpoint signing secret (`whsec_...`) used to verify webhook notifications.
    pub webhook_secret: Secret<String>,
    /// Base URL of the payment API. Overridable so tests can point at a local stand-in.
    pub api_base: String,
    /// Upper bound on any single call to the payment API, in seconds.
    pub timeout_secs: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: Secret::default(),
            webhook_secret: Secret::default(),
            api_base: DEFAULT_STRIPE_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let secret_key = Secret::new(std::env::var("SCB_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            error!("🪛️ SCB_STRIPE_SECRET_KEY is not set. Calls to the payment API will be rejected upstream.");
            String::default()
        }));
        let webhook_secret = Secret::new(std::env::var("SCB_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            error!("🪛️ SCB_STRIPE_WEBHOOK_SECRET is not set. Incoming notifications cannot be verified.");
            String::default()
        }));
        let api_base = std::env::var("SCB_STRIPE_API_BASE").unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string());
        let timeout_secs = std::env::var("SCB_STRIPE_TIMEOUT_SECS")
            .map(|s| {
                s.parse::<u64>().unwrap_or_else(|e| {
                    warn!(
                        "🪛️ {s} is not a valid value for SCB_STRIPE_TIMEOUT_SECS. {e} Using the default, \
                         {DEFAULT_TIMEOUT_SECS}s, instead."
                    );
                    DEFAULT_TIMEOUT_SECS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self { secret_key, webhook_secret, api_base, timeout_secs }
    }
}
