use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use scb_common::MinorUnits;
use serde::{Deserialize, Serialize};

//--------------------------------------   Checkout session   --------------------------------------------------------

/// A checkout session as returned by the payment processor. All nested relations are optional
/// because the same struct deserializes both the expanded authoritative read and the partial
/// snapshot embedded in a webhook event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub amount_subtotal: Option<MinorUnits>,
    #[serde(default)]
    pub amount_total: Option<MinorUnits>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub payment_status: String,
    #[serde(default)]
    pub created: Option<i64>,
    /// Hosted checkout URL. Only present on freshly created sessions.
    #[serde(default)]
    pub url: Option<String>,
    // Older API versions call this field `shipping`.
    #[serde(default, alias = "shipping")]
    pub shipping_details: Option<ShippingDetails>,
    #[serde(default)]
    pub shipping_cost: Option<ShippingCost>,
    #[serde(default)]
    pub line_items: Option<LineItemList>,
}

impl CheckoutSession {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// The name the parcel should be addressed to: the shipping name when collected, otherwise
    /// whatever name the customer typed at checkout.
    pub fn recipient_name(&self) -> Option<&str> {
        self.shipping_details
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .or_else(|| self.customer_details.as_ref().and_then(|c| c.name.as_deref()))
    }

    pub fn email(&self) -> Option<&str> {
        self.customer_details.as_ref().and_then(|c| c.email.as_deref())
    }

    pub fn shipping_rate_name(&self) -> Option<&str> {
        self.shipping_cost.as_ref().and_then(|c| c.shipping_rate.as_ref()).and_then(|r| r.display_name())
    }

    pub fn shipping_amount(&self) -> MinorUnits {
        self.shipping_cost.as_ref().map(|c| c.amount_total).unwrap_or_default()
    }

    pub fn items(&self) -> &[LineItem] {
        self.line_items.as_ref().map(|l| l.data.as_slice()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingCost {
    #[serde(default)]
    pub amount_total: MinorUnits,
    #[serde(default)]
    pub shipping_rate: Option<ShippingRateRef>,
}

/// `shipping_rate` is a bare id unless the read asked for the expansion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShippingRateRef {
    Id(String),
    Rate(ShippingRate),
}

impl ShippingRateRef {
    pub fn display_name(&self) -> Option<&str> {
        match self {
            ShippingRateRef::Id(_) => None,
            ShippingRateRef::Rate(rate) => rate.display_name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShippingRate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub fixed_amount: Option<FixedAmount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixedAmount {
    pub amount: MinorUnits,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItemList {
    #[serde(default)]
    pub data: Vec<LineItem>,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub amount_total: Option<MinorUnits>,
    #[serde(default)]
    pub price: Option<Price>,
}

impl LineItem {
    /// Product metadata (size, color, variant reference). Only present when the read expanded
    /// `line_items.data.price.product`.
    pub fn metadata(&self) -> Option<&HashMap<String, String>> {
        match self.price.as_ref()?.product.as_ref()? {
            ProductRef::Id(_) => None,
            ProductRef::Product(p) => Some(&p.metadata),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    Id(String),
    Product(Product),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

//--------------------------------------   Session creation   --------------------------------------------------------

/// Everything needed to create a hosted checkout session. Serialized into the flat
/// `a[b][c]=value` form encoding the payment API expects.
#[derive(Debug, Clone, Default)]
pub struct NewSessionParams {
    pub payment_method_types: Vec<String>,
    pub mode: String,
    pub line_items: Vec<NewLineItem>,
    pub shipping_options: Vec<ShippingOption>,
    pub allowed_shipping_countries: Vec<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub customer_email: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewLineItem {
    pub name: String,
    pub unit_amount: MinorUnits,
    pub quantity: i64,
    pub currency: String,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct ShippingOption {
    pub display_name: String,
    pub amount: MinorUnits,
    pub currency: String,
    pub min_business_days: u32,
    pub max_business_days: u32,
}

impl NewSessionParams {
    pub fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), self.mode.clone()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        for (i, pm) in self.payment_method_types.iter().enumerate() {
            form.push((format!("payment_method_types[{i}]"), pm.clone()));
        }
        if let Some(email) = &self.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        if let Some(locale) = &self.locale {
            form.push(("locale".to_string(), locale.clone()));
        }
        for (i, country) in self.allowed_shipping_countries.iter().enumerate() {
            form.push((format!("shipping_address_collection[allowed_countries][{i}]"), country.clone()));
        }
        for (i, item) in self.line_items.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
            form.push((format!("{prefix}[price_data][currency]"), item.currency.clone()));
            form.push((format!("{prefix}[price_data][unit_amount]"), item.unit_amount.value().to_string()));
            form.push((format!("{prefix}[price_data][product_data][name]"), item.name.clone()));
            for (key, value) in &item.metadata {
                form.push((format!("{prefix}[price_data][product_data][metadata][{key}]"), value.clone()));
            }
        }
        for (i, option) in self.shipping_options.iter().enumerate() {
            let prefix = format!("shipping_options[{i}][shipping_rate_data]");
            form.push((format!("{prefix}[type]"), "fixed_amount".to_string()));
            form.push((format!("{prefix}[display_name]"), option.display_name.clone()));
            form.push((format!("{prefix}[fixed_amount][amount]"), option.amount.value().to_string()));
            form.push((format!("{prefix}[fixed_amount][currency]"), option.currency.clone()));
            form.push((format!("{prefix}[delivery_estimate][minimum][unit]"), "business_day".to_string()));
            form.push((format!("{prefix}[delivery_estimate][minimum][value]"), option.min_business_days.to_string()));
            form.push((format!("{prefix}[delivery_estimate][maximum][unit]"), "business_day".to_string()));
            form.push((format!("{prefix}[delivery_estimate][maximum][value]"), option.max_business_days.to_string()));
        }
        form
    }
}

//--------------------------------------   Session builder    --------------------------------------------------------

/// Assembles [`CheckoutSession`] values for tests and local tooling without hand-writing JSON.
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    id: Option<String>,
    amount_subtotal: Option<i64>,
    amount_total: Option<i64>,
    currency: Option<String>,
    customer_details: Option<CustomerDetails>,
    locale: Option<String>,
    payment_status: Option<String>,
    created: Option<i64>,
    shipping_details: Option<ShippingDetails>,
    shipping_cost: Option<ShippingCost>,
    items: Vec<LineItem>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn random_session() -> CheckoutSession {
        SessionBuilder::new().build()
    }

    pub fn id(&mut self, id: &str) -> &mut Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn amount_total(&mut self, amount: i64) -> &mut Self {
        self.amount_total = Some(amount);
        self
    }

    pub fn amount_subtotal(&mut self, amount: i64) -> &mut Self {
        self.amount_subtotal = Some(amount);
        self
    }

    pub fn currency(&mut self, currency: &str) -> &mut Self {
        self.currency = Some(currency.to_string());
        self
    }

    pub fn locale(&mut self, locale: &str) -> &mut Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn payment_status(&mut self, status: &str) -> &mut Self {
        self.payment_status = Some(status.to_string());
        self
    }

    pub fn created(&mut self, created: i64) -> &mut Self {
        self.created = Some(created);
        self
    }

    pub fn customer(&mut self, name: &str, email: &str) -> &mut Self {
        self.customer_details = Some(CustomerDetails {
            email: Some(email.to_string()),
            name: Some(name.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn customer_phone(&mut self, phone: &str) -> &mut Self {
        let details = self.customer_details.get_or_insert_with(Default::default);
        details.phone = Some(phone.to_string());
        self
    }

    pub fn shipping(&mut self, name: &str, address: Address) -> &mut Self {
        self.shipping_details = Some(ShippingDetails { name: Some(name.to_string()), address: Some(address) });
        self
    }

    pub fn shipping_rate(&mut self, display_name: &str, amount: i64) -> &mut Self {
        self.shipping_cost = Some(ShippingCost {
            amount_total: MinorUnits::from(amount),
            shipping_rate: Some(ShippingRateRef::Rate(ShippingRate {
                id: Some("shr_test".to_string()),
                display_name: Some(display_name.to_string()),
                fixed_amount: Some(FixedAmount {
                    amount: MinorUnits::from(amount),
                    currency: "pln".to_string(),
                }),
            })),
        });
        self
    }

    pub fn line_item(&mut self, description: &str, quantity: Option<i64>, amount_total: i64) -> &mut Self {
        self.items.push(LineItem {
            id: Some(format!("li_{}", self.items.len() + 1)),
            description: Some(description.to_string()),
            quantity,
            amount_total: Some(MinorUnits::from(amount_total)),
            price: None,
        });
        self
    }

    pub fn line_item_with_metadata(
        &mut self,
        description: &str,
        quantity: Option<i64>,
        amount_total: i64,
        metadata: &[(&str, &str)],
    ) -> &mut Self {
        let metadata = metadata.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        self.items.push(LineItem {
            id: Some(format!("li_{}", self.items.len() + 1)),
            description: Some(description.to_string()),
            quantity,
            amount_total: Some(MinorUnits::from(amount_total)),
            price: Some(Price {
                product: Some(ProductRef::Product(Product {
                    id: format!("prod_{}", self.items.len() + 1),
                    name: Some(description.to_string()),
                    metadata,
                })),
            }),
        });
        self
    }

    pub fn build(self) -> CheckoutSession {
        let mut rng = rand::thread_rng();
        let line_items = if self.items.is_empty() {
            None
        } else {
            Some(LineItemList { data: self.items, has_more: false })
        };
        CheckoutSession {
            id: self.id.unwrap_or_else(|| format!("cs_test_{:08x}", rng.gen::<u32>())),
            amount_subtotal: self.amount_subtotal.map(MinorUnits::from),
            amount_total: self.amount_total.map(MinorUnits::from),
            currency: Some(self.currency.unwrap_or_else(|| "pln".to_string())),
            customer_details: self.customer_details,
            locale: self.locale,
            payment_status: self.payment_status.unwrap_or_else(|| "paid".to_string()),
            created: Some(self.created.unwrap_or_else(|| Utc::now().timestamp())),
            url: None,
            shipping_details: self.shipping_details,
            shipping_cost: self.shipping_cost,
            line_items,
        }
    }
}
