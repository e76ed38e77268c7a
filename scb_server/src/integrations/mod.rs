//! Conversions between the external systems' payloads and the canonical order shape, plus the
//! submission call itself.

pub mod shopify;
pub mod stripe;
