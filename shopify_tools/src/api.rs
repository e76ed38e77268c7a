use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    config::ShopifyConfig,
    data_objects::{CreatedOrder, NewShopifyOrder},
    error::ShopifyApiError,
};

/// What the server needs from the commerce system. [`ShopifyApi`] is the real implementation;
/// endpoint tests substitute mocks.
#[allow(async_fn_in_trait)]
pub trait CommerceOrders {
    async fn create_order(&self, order: &NewShopifyOrder) -> Result<CreatedOrder, ShopifyApiError>;
}

#[derive(Clone)]
pub struct ShopifyApi {
    config: ShopifyConfig,
    client: Arc<Client>,
}

impl ShopifyApi {
    pub fn new(config: ShopifyConfig) -> Result<Self, ShopifyApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let val = HeaderValue::from_str(config.admin_access_token.reveal().as_str())
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        headers.insert("X-Shopify-Access-Token", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ShopifyApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        body: Option<B>,
    ) -> Result<T, ShopifyApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await.map_err(ShopifyApiError::from_reqwest)?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| ShopifyApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(ShopifyApiError::from_reqwest)?;
            Err(ShopifyApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("https://{}/admin/api/{}{path}", self.config.shop, self.config.api_version)
    }
}

impl CommerceOrders for ShopifyApi {
    async fn create_order(&self, order: &NewShopifyOrder) -> Result<CreatedOrder, ShopifyApiError> {
        #[derive(Serialize)]
        struct OrderInput<'a> {
            order: &'a NewShopifyOrder,
        }
        #[derive(Deserialize)]
        struct OrderResponse {
            order: CreatedOrder,
        }
        debug!("🛍️️ Creating order for {}", order.email);
        let result = self
            .rest_query::<OrderResponse, OrderInput>(Method::POST, "/orders.json", &[], Some(OrderInput { order }))
            .await?;
        info!("🛍️️ Created order #{}", result.order.id);
        Ok(result.order)
    }
}
