use std::env;

use log::*;
use shopify_tools::ShopifyConfig;
use stripe_tools::StripeConfig;

pub const DEFAULT_SCB_HOST: &str = "127.0.0.1";
pub const DEFAULT_SCB_PORT: u16 = 3000;
const DEFAULT_STOREFRONT_BASE_URL: &str = "https://luxenordique.com";
const DEFAULT_WEBHOOK_TOLERANCE_SECS: i64 = 300;
const DEFAULT_IDEMPOTENCY_TTL_SECS: u64 = 600;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Where shoppers are sent back to after the hosted checkout completes or is abandoned.
    pub storefront_base_url: String,
    /// Maximum age, in seconds, of a notification signature timestamp before it is rejected.
    pub webhook_tolerance_secs: i64,
    /// How long, in seconds, a processed session marker is kept to collapse duplicate deliveries.
    pub idempotency_ttl_secs: u64,
    pub stripe: StripeConfig,
    pub shopify: ShopifyConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SCB_HOST.to_string(),
            port: DEFAULT_SCB_PORT,
            storefront_base_url: DEFAULT_STOREFRONT_BASE_URL.to_string(),
            webhook_tolerance_secs: DEFAULT_WEBHOOK_TOLERANCE_SECS,
            idempotency_ttl_secs: DEFAULT_IDEMPOTENCY_TTL_SECS,
            stripe: StripeConfig::default(),
            shopify: ShopifyConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SCB_HOST").unwrap_or_else(|_| {
            error!("🪛️ SCB_HOST is not set. Using the default, {DEFAULT_SCB_HOST}, instead.");
            DEFAULT_SCB_HOST.to_string()
        });
        let port = env::var("SCB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for SCB_PORT. {e} Using the default, {DEFAULT_SCB_PORT}, \
                         instead."
                    );
                    DEFAULT_SCB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SCB_PORT);
        let storefront_base_url = env::var("SCB_STOREFRONT_BASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ SCB_STOREFRONT_BASE_URL is not set. Redirect URLs will point at {DEFAULT_STOREFRONT_BASE_URL}.");
            DEFAULT_STOREFRONT_BASE_URL.to_string()
        });
        let webhook_tolerance_secs = env::var("SCB_WEBHOOK_TOLERANCE_SECS")
            .map(|s| {
                s.parse::<i64>().unwrap_or_else(|e| {
                    warn!(
                        "🪛️ {s} is not a valid value for SCB_WEBHOOK_TOLERANCE_SECS. {e} Using the default, \
                         {DEFAULT_WEBHOOK_TOLERANCE_SECS}s, instead."
                    );
                    DEFAULT_WEBHOOK_TOLERANCE_SECS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_WEBHOOK_TOLERANCE_SECS);
        let idempotency_ttl_secs = env::var("SCB_IDEMPOTENCY_TTL_SECS")
            .map(|s| {
                s.parse::<u64>().unwrap_or_else(|e| {
                    warn!(
                        "🪛️ {s} is not a valid value for SCB_IDEMPOTENCY_TTL_SECS. {e} Using the default, \
                         {DEFAULT_IDEMPOTENCY_TTL_SECS}s, instead."
                    );
                    DEFAULT_IDEMPOTENCY_TTL_SECS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_IDEMPOTENCY_TTL_SECS);
        Self {
            host,
            port,
            storefront_base_url,
            webhook_tolerance_secs,
            idempotency_ttl_secs,
            stripe: StripeConfig::new_from_env_or_default(),
            shopify: ShopifyConfig::new_from_env_or_default(),
        }
    }
}
