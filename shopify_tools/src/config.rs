use log::*;
use scb_common::Secret;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    pub shop: String,
    pub admin_access_token: Secret<String>,
    pub api_version: String,
    /// Upper bound on any single call to the commerce API, in seconds.
    pub timeout_secs: u64,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop: "example.myshopify.com".to_string(),
            admin_access_token: Secret::default(),
            api_version: "2023-01".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ShopifyConfig {
    pub fn new_from_env_or_default() -> Self {
        let shop = std::env::var("SCB_SHOPIFY_SHOP").unwrap_or_else(|_| {
            warn!("🪛️ SCB_SHOPIFY_SHOP not set, using luxenordique.myshopify.com as default");
            "luxenordique.myshopify.com".to_string()
        });
        let api_version = std::env::var("SCB_SHOPIFY_API_VERSION").unwrap_or_else(|_| {
            warn!("🪛️ SCB_SHOPIFY_API_VERSION not set, using 2023-01 as default");
            "2023-01".to_string()
        });
        let admin_access_token = Secret::new(std::env::var("SCB_SHOPIFY_ADMIN_ACCESS_TOKEN").unwrap_or_else(|_| {
            error!("🪛️ SCB_SHOPIFY_ADMIN_ACCESS_TOKEN not set. Order submissions will be rejected downstream.");
            "shpat_00000000000000".to_string()
        }));
        let timeout_secs = std::env::var("SCB_SHOPIFY_TIMEOUT_SECS")
            .map(|s| {
                s.parse::<u64>().unwrap_or_else(|e| {
                    warn!(
                        "🪛️ {s} is not a valid value for SCB_SHOPIFY_TIMEOUT_SECS. {e} Using the default, \
                         {DEFAULT_TIMEOUT_SECS}s, instead."
                    );
                    DEFAULT_TIMEOUT_SECS
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self { shop, admin_access_token, api_version, timeout_secs }
    }
}
