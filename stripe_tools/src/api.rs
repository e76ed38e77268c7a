use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::StripeConfig,
    data_objects::{CheckoutSession, NewSessionParams},
    error::StripeApiError,
};

/// What the server needs from the payment processor. [`StripeApi`] is the real implementation;
/// endpoint tests substitute mocks.
#[allow(async_fn_in_trait)]
pub trait CheckoutSessions {
    async fn create_checkout_session(&self, params: &NewSessionParams) -> Result<CheckoutSession, StripeApiError>;
    /// Authoritative read of a session with line items, product metadata and the shipping rate
    /// expanded.
    async fn fetch_session_expanded(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError>;
}

const SESSION_EXPANSIONS: [&str; 3] = ["line_items", "line_items.data.price.product", "shipping_cost.shipping_rate"];

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, StripeApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        headers.insert(AUTHORIZATION, val);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StripeApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_base)
    }

    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        form: Option<&[(String, String)]>,
    ) -> Result<T, StripeApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let mut req = self.client.request(method, url);
        if !params.is_empty() {
            req = req.query(params);
        }
        if let Some(form) = form {
            req = req.form(form);
        }
        let response = req.send().await.map_err(StripeApiError::from_reqwest)?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| StripeApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(StripeApiError::from_reqwest)?;
            Err(StripeApiError::QueryError { status, message })
        }
    }
}

impl CheckoutSessions for StripeApi {
    async fn create_checkout_session(&self, params: &NewSessionParams) -> Result<CheckoutSession, StripeApiError> {
        let form = params.to_form();
        debug!("💳️ Creating a checkout session with {} line items", params.line_items.len());
        let session =
            self.rest_query::<CheckoutSession>(Method::POST, "/checkout/sessions", &[], Some(&form)).await?;
        info!("💳️ Created checkout session {}", session.id);
        Ok(session)
    }

    async fn fetch_session_expanded(&self, session_id: &str) -> Result<CheckoutSession, StripeApiError> {
        let path = format!("/checkout/sessions/{session_id}");
        let params = SESSION_EXPANSIONS.map(|e| ("expand[]", e));
        debug!("💳️ Fetching expanded session {session_id}");
        let session = self.rest_query::<CheckoutSession>(Method::GET, &path, &params, None).await?;
        info!("💳️ Fetched expanded session {}", session.id);
        Ok(session)
    }
}
