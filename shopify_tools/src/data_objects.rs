use serde::{Deserialize, Serialize};

/// The outbound order payload. Serialized as the `order` member of the REST creation call.
///
/// Money travels as two-decimal strings and `tags` as one comma-joined string, which is how the
/// commerce API wants them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewShopifyOrder {
    pub email: String,
    pub financial_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    pub line_items: Vec<ShopifyLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShopifyAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<ShopifyAddress>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shipping_lines: Vec<ShippingLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<String>,
}

/// A line item in catalog form (`variant_id`, so the shop matches it to stock) or free-text form
/// (`title` + `price`, with size/color carried as properties).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopifyLineItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<OrderProperty>,
}

impl ShopifyLineItem {
    pub fn for_variant(variant_id: i64, quantity: i64) -> Self {
        Self { variant_id: Some(variant_id), quantity, ..Default::default() }
    }

    pub fn for_title(title: &str, price: String, quantity: i64) -> Self {
        Self { title: Some(title.to_string()), price: Some(price), quantity, ..Default::default() }
    }

    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.push(OrderProperty { name: name.to_string(), value: value.to_string() });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderProperty {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopifyAddress {
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    pub country: String,
    pub zip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShippingLine {
    pub title: String,
    pub price: String,
    pub code: String,
}

/// The slice of the creation response the bridge cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}
