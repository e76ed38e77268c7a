//! # SCB server
//! This module hosts the server code for the Stripe checkout bridge (SCB). It is responsible
//! for:
//! Opening hosted checkout sessions on behalf of the storefront.
//! Listening for signed payment notifications from the processor.
//! Normalizing paid sessions into canonical orders and submitting them to the shop.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/create-checkout-session`: Opens a hosted checkout for the storefront cart.
//! * `/webhook`: The signed notification endpoint for completed checkouts.
//! * `/order-details`: A read-only session summary for the storefront's success page.

pub mod cli;
pub mod config;
pub mod errors;

pub mod canonical_order;
pub mod data_objects;
pub mod integrations;
pub mod mapping;
pub mod relay;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
