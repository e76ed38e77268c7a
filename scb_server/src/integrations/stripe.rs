//! The session normalizer. Reduces a fully expanded checkout session (or, when the re-fetch
//! failed, the untrusted event snapshot) to a [`CanonicalOrder`].

use chrono::{TimeZone, Utc};
use log::*;
use scb_common::MinorUnits;
use stripe_tools::{CheckoutSession, LineItem};
use thiserror::Error;

use crate::{
    canonical_order::{CanonicalOrder, ItemForm, OrderAddress, OrderItem, ShippingSelection},
    mapping::{Locale, MappingConfig},
};

/// Product metadata key that marks a line item as a catalog match.
pub const VARIANT_METADATA_KEY: &str = "shopify_variant_id";
const SIZE_METADATA_KEY: &str = "size";
const COLOR_METADATA_KEY: &str = "color";
/// Title of the single aggregate line item used when itemized data is unavailable or does not
/// reconcile.
pub const AGGREGATE_ITEM_TITLE: &str = "Stripe P24 Order";

#[derive(Debug, Clone, Error)]
pub enum OrderConversionError {
    #[error("The session has no usable total. {0}")]
    MissingTotal(String),
    #[error("The session contained invalid data. {0}")]
    FormatError(String),
}

/// Builds a canonical order from an authoritative, fully expanded session read.
///
/// If the itemized totals do not add back up to the session total (minus shipping), the item
/// list is replaced with a single aggregate item so the invariant that per-item pricing traces
/// back to the session total always holds.
pub fn canonical_order_from_session(
    session: &CheckoutSession,
    mapping: &MappingConfig,
) -> Result<CanonicalOrder, OrderConversionError> {
    let total = required_total(session)?;
    let mut order = order_scaffold(session, mapping, total);
    order.items = session.items().iter().map(order_item).collect();
    order.shipping_line = shipping_selection(session, mapping, order.locale);
    let expected = total - session.shipping_amount();
    if !order.reconciles_with(expected) {
        warn!(
            "💳️ Session {}: itemized total {:.2} does not reconcile with the expected {:.2}. Submitting an \
             aggregate single-item order instead.",
            session.id,
            order.items_total(),
            expected.major()
        );
        order.items = vec![aggregate_item(total)];
        order.shipping_line = None;
        order.degraded = true;
    }
    Ok(order)
}

/// Builds a degraded, single-line-item order from the snapshot embedded in the event. Used when
/// the authoritative re-fetch fails for a reason other than a timeout.
pub fn degraded_order_from_snapshot(
    snapshot: &CheckoutSession,
    mapping: &MappingConfig,
) -> Result<CanonicalOrder, OrderConversionError> {
    let total = required_total(snapshot)?;
    let mut order = order_scaffold(snapshot, mapping, total);
    order.items = vec![aggregate_item(total)];
    order.degraded = true;
    Ok(order)
}

/// Splits a full name on the first space into (first name, rest). Either half may come back
/// empty.
pub fn split_name(full_name: Option<&str>) -> (String, String) {
    let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) else {
        return (String::new(), String::new());
    };
    match name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (name.to_string(), String::new()),
    }
}

/// Per-unit price in major units, the effective quantity, and whether the quantity had to be
/// assumed because the session carried none.
pub fn derive_unit_price(amount_total: Option<MinorUnits>, quantity: Option<i64>) -> (f64, i64, bool) {
    let amount = amount_total.unwrap_or_default();
    match quantity {
        Some(q) if q > 0 => (amount.major() / q as f64, q, false),
        _ => (amount.major(), 1, true),
    }
}

fn required_total(session: &CheckoutSession) -> Result<MinorUnits, OrderConversionError> {
    match session.amount_total {
        Some(total) if total.is_positive() => Ok(total),
        Some(total) => Err(OrderConversionError::MissingTotal(format!(
            "Session {} reports a non-positive total of {total}.",
            session.id
        ))),
        None => {
            Err(OrderConversionError::MissingTotal(format!("Session {} carries no total amount.", session.id)))
        },
    }
}

fn order_scaffold(session: &CheckoutSession, mapping: &MappingConfig, total: MinorUnits) -> CanonicalOrder {
    let locale = Locale::from_session(session.locale.as_deref());
    let text = mapping.text(locale);
    let (first_name, last_name) = split_name(session.recipient_name());
    let email = session.email().unwrap_or_default().to_string();
    if email.is_empty() {
        warn!("💳️ Session {} carries no customer email. The order will be submitted without one.", session.id);
    }
    CanonicalOrder {
        session_id: session.id.clone(),
        email,
        locale,
        first_name,
        last_name,
        shipping_address: order_address(session),
        items: vec![],
        shipping_line: None,
        note: text.order_note.to_string(),
        tags: text.order_tags.iter().map(|t| t.to_string()).collect(),
        currency: session.currency.as_deref().unwrap_or("pln").to_uppercase(),
        amount_total: total,
        paid_at: session.created.and_then(|ts| Utc.timestamp_opt(ts, 0).single()),
        degraded: false,
    }
}

fn order_item(item: &LineItem) -> OrderItem {
    let (unit_price, quantity, low_confidence) = derive_unit_price(item.amount_total, item.quantity);
    OrderItem { form: item_form(item), quantity, unit_price, low_confidence }
}

fn item_form(item: &LineItem) -> ItemForm {
    let metadata = item.metadata();
    if let Some(variant) = metadata.and_then(|m| m.get(VARIANT_METADATA_KEY)) {
        match variant.parse::<i64>() {
            Ok(variant_id) => return ItemForm::Variant { variant_id },
            Err(e) => warn!("💳️ Ignoring unusable variant reference {variant:?}: {e}"),
        }
    }
    let title = item.description.clone().unwrap_or_else(|| "Item".to_string());
    let size = metadata.and_then(|m| m.get(SIZE_METADATA_KEY)).cloned().unwrap_or_else(|| "N/A".to_string());
    let color = metadata.and_then(|m| m.get(COLOR_METADATA_KEY)).cloned().unwrap_or_else(|| "N/A".to_string());
    ItemForm::Title { title, size: Some(size), color: Some(color) }
}

fn order_address(session: &CheckoutSession) -> Option<OrderAddress> {
    let address = session
        .shipping_details
        .as_ref()
        .and_then(|s| s.address.as_ref())
        .or_else(|| session.customer_details.as_ref().and_then(|c| c.address.as_ref()))?;
    Some(OrderAddress {
        line1: address.line1.clone().unwrap_or_default(),
        line2: address.line2.clone(),
        city: address.city.clone().unwrap_or_default(),
        region: address.state.clone(),
        postal_code: address.postal_code.clone().unwrap_or_default(),
        country: address.country.clone().unwrap_or_default(),
        phone: session.customer_details.as_ref().and_then(|c| c.phone.clone()),
    })
}

fn shipping_selection(
    session: &CheckoutSession,
    mapping: &MappingConfig,
    locale: Locale,
) -> Option<ShippingSelection> {
    let name = session.shipping_rate_name()?;
    let cost = session.shipping_amount();
    let selection = match mapping.resolve_tier(name) {
        Some(tier) => {
            ShippingSelection { label: tier.label(locale).to_string(), cost, code: tier.code.to_string() }
        },
        // Unknown rates pass through untranslated.
        None => ShippingSelection { label: name.to_string(), cost, code: name.to_string() },
    };
    Some(selection)
}

fn aggregate_item(total: MinorUnits) -> OrderItem {
    OrderItem {
        form: ItemForm::Title { title: AGGREGATE_ITEM_TITLE.to_string(), size: None, color: None },
        quantity: 1,
        unit_price: total.major(),
        low_confidence: false,
    }
}
