//! The order submitter. Maps a canonical order onto the commerce REST schema and performs the
//! creation call.

use log::*;
use shopify_tools::{
    CommerceOrders,
    CreatedOrder,
    NewShopifyOrder,
    ShippingLine,
    ShopifyAddress,
    ShopifyLineItem,
};
use thiserror::Error;

use crate::canonical_order::{CanonicalOrder, ItemForm, OrderAddress, OrderItem};

/// Orders are only ever submitted after the processor has confirmed payment.
pub const FINANCIAL_STATUS_PAID: &str = "paid";

#[derive(Debug, Clone, Error)]
pub enum SubmissionError {
    #[error("The order creation call timed out. {0}")]
    Timeout(String),
    #[error("Order creation was rejected downstream. {0}")]
    Rejected(String),
}

/// Maps the canonical order onto the REST order payload. The billing block always mirrors the
/// shipping block, and money renders as two-decimal strings.
pub fn new_shopify_order_from_canonical(order: &CanonicalOrder) -> NewShopifyOrder {
    let address = order.shipping_address.as_ref().map(|a| shopify_address(order, a));
    NewShopifyOrder {
        email: order.email.clone(),
        financial_status: FINANCIAL_STATUS_PAID.to_string(),
        currency: Some(order.currency.clone()),
        line_items: order.items.iter().map(line_item).collect(),
        shipping_address: address.clone(),
        billing_address: address,
        shipping_lines: order
            .shipping_line
            .iter()
            .map(|s| ShippingLine { title: s.label.clone(), price: s.cost.to_string(), code: s.code.clone() })
            .collect(),
        note: Some(order.note.clone()),
        tags: Some(order.tags.join(", ")),
        processed_at: order.paid_at.map(|t| t.to_rfc3339()),
    }
}

/// Performs the downstream creation call. Timeouts surface separately so the dispatcher can ask
/// the processor to redeliver; anything else is terminal for this delivery.
pub async fn submit_canonical_order<C: CommerceOrders>(
    order: &CanonicalOrder,
    commerce: &C,
) -> Result<CreatedOrder, SubmissionError> {
    let payload = new_shopify_order_from_canonical(order);
    debug!(
        "🛍️️ Submitting{} order for session {} with {} line item(s).",
        if order.degraded { " degraded" } else { "" },
        order.session_id,
        payload.line_items.len()
    );
    match commerce.create_order(&payload).await {
        Ok(created) => {
            info!("🛍️️ Order {} created for session {}.", created.id, order.session_id);
            Ok(created)
        },
        Err(e) if e.is_timeout() => {
            warn!("🛍️️ Order creation for session {} timed out. {e}", order.session_id);
            Err(SubmissionError::Timeout(e.to_string()))
        },
        Err(e) => {
            // The error display carries the downstream response body when one was returned.
            error!("🛍️️ Order creation for session {} failed. {e}", order.session_id);
            Err(SubmissionError::Rejected(e.to_string()))
        },
    }
}

fn line_item(item: &OrderItem) -> ShopifyLineItem {
    match &item.form {
        ItemForm::Variant { variant_id } => ShopifyLineItem::for_variant(*variant_id, item.quantity),
        ItemForm::Title { title, size, color } => {
            let mut result = ShopifyLineItem::for_title(title, format!("{:.2}", item.unit_price), item.quantity);
            if let Some(size) = size {
                result = result.with_property("Size", size);
            }
            if let Some(color) = color {
                result = result.with_property("Color", color);
            }
            result
        },
    }
}

fn shopify_address(order: &CanonicalOrder, address: &OrderAddress) -> ShopifyAddress {
    ShopifyAddress {
        first_name: order.first_name.clone(),
        last_name: order.last_name.clone(),
        address1: address.line1.clone(),
        address2: address.line2.clone(),
        city: address.city.clone(),
        province: address.region.clone(),
        country: address.country.clone(),
        zip: address.postal_code.clone(),
        phone: address.phone.clone(),
    }
}
