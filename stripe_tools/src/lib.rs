mod api;
mod config;
mod error;
mod webhook;

mod data_objects;

pub use api::{CheckoutSessions, StripeApi};
pub use config::{StripeConfig, DEFAULT_STRIPE_API_BASE};
pub use data_objects::{
    Address,
    CheckoutSession,
    CustomerDetails,
    FixedAmount,
    LineItem,
    LineItemList,
    NewLineItem,
    NewSessionParams,
    Price,
    Product,
    ProductRef,
    SessionBuilder,
    ShippingCost,
    ShippingDetails,
    ShippingOption,
    ShippingRate,
    ShippingRateRef,
};
pub use error::{StripeApiError, WebhookError};
pub use webhook::{compute_signature, construct_event, verify_signature, Event, EventData, CHECKOUT_SESSION_COMPLETED};
