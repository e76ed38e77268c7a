use chrono::{DateTime, Utc};
use scb_common::MinorUnits;

use crate::mapping::Locale;

/// How far, in major units, the per-item totals may drift from the session total before the
/// order is considered unreconcilable.
pub const RECONCILE_TOLERANCE: f64 = 1e-6;

/// The normalized order shape everything downstream works from. Derived entirely from a checkout
/// session; nothing here is read back from the commerce system.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalOrder {
    pub session_id: String,
    pub email: String,
    pub locale: Locale,
    pub first_name: String,
    pub last_name: String,
    pub shipping_address: Option<OrderAddress>,
    pub items: Vec<OrderItem>,
    pub shipping_line: Option<ShippingSelection>,
    pub note: String,
    pub tags: Vec<String>,
    pub currency: String,
    pub amount_total: MinorUnits,
    pub paid_at: Option<DateTime<Utc>>,
    /// Set when the order was rebuilt from the event snapshot, or when the itemized totals did
    /// not reconcile and were replaced with an aggregate item.
    pub degraded: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub region: Option<String>,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub form: ItemForm,
    pub quantity: i64,
    /// Per-unit price in major units.
    pub unit_price: f64,
    /// Set when the quantity was absent or zero and a quantity of one had to be assumed.
    pub low_confidence: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemForm {
    /// A catalog reference the shop can match to stock. Preferred whenever present.
    Variant { variant_id: i64 },
    /// Free-text fallback. Size and color travel as order properties.
    Title { title: String, size: Option<String>, color: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShippingSelection {
    pub label: String,
    pub cost: MinorUnits,
    pub code: String,
}

impl CanonicalOrder {
    /// Sum of unit price x quantity over all items, in major units.
    pub fn items_total(&self) -> f64 {
        self.items.iter().map(|i| i.unit_price * i.quantity as f64).sum()
    }

    /// True when the per-item totals add back up to `expected` within [`RECONCILE_TOLERANCE`].
    pub fn reconciles_with(&self, expected: MinorUnits) -> bool {
        (self.items_total() - expected.major()).abs() <= RECONCILE_TOLERANCE
    }
}
