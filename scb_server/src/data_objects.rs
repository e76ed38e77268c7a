use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};
use stripe_tools::{Address, CheckoutSession};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------   Checkout creation   -------------------------------------------------------

/// The storefront's request to open a hosted checkout. Amounts are in minor units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub total_amount: Option<i64>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub name: String,
    pub amount: i64,
    pub quantity: i64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSessionResponse {
    /// Where the storefront should redirect the shopper.
    pub url: String,
}

//--------------------------------------   Order details   -----------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OrderDetailsQuery {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// What the post-payment "thank you" page gets to see about a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub customer_email: String,
    pub amount_total: i64,
    pub shipping_option: String,
    pub shipping_cost: i64,
    pub shipping_address: Option<Address>,
    pub payment_status: String,
    pub items: Vec<OrderDetailsItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetailsItem {
    pub description: Option<String>,
    pub quantity: Option<i64>,
}

impl OrderDetails {
    pub fn from_session(session: &CheckoutSession) -> Self {
        let items = session
            .items()
            .iter()
            .map(|item| OrderDetailsItem { description: item.description.clone(), quantity: item.quantity })
            .collect();
        Self {
            customer_email: session.email().unwrap_or("Not provided").to_string(),
            amount_total: session.amount_total.map(|a| a.value()).unwrap_or_default(),
            shipping_option: session.shipping_rate_name().unwrap_or("Not selected").to_string(),
            shipping_cost: session.shipping_amount().value(),
            shipping_address: session.shipping_details.as_ref().and_then(|s| s.address.clone()),
            payment_status: session.payment_status.clone(),
            items,
        }
    }
}
