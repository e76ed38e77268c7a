mod api;
mod config;
mod error;

mod data_objects;

pub use api::{CommerceOrders, ShopifyApi};
pub use config::ShopifyConfig;
pub use data_objects::{CreatedOrder, NewShopifyOrder, OrderProperty, ShippingLine, ShopifyAddress, ShopifyLineItem};
pub use error::ShopifyApiError;
