use std::time::Duration;

use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::Utc;
use scb_common::Secret;
use serde_json::json;
use shopify_tools::{CreatedOrder, ShopifyApiError};
use stripe_tools::{compute_signature, SessionBuilder, StripeApiError, CHECKOUT_SESSION_COMPLETED};

use super::{
    helpers::{get_request, post_request},
    mocks::{MockCommerceBackend, MockPaymentProcessor},
};
use crate::{
    config::ServerConfig,
    mapping::MappingConfig,
    relay::IdempotencyGuard,
    webhook_routes::{StripeWebhookRoute, SIGNATURE_HEADER},
};

const WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

fn install(cfg: &mut ServiceConfig, payments: MockPaymentProcessor, commerce: MockCommerceBackend) {
    let mut config = ServerConfig::default();
    config.stripe.webhook_secret = Secret::new(WEBHOOK_SECRET.to_string());
    cfg.service(StripeWebhookRoute::<MockPaymentProcessor, MockCommerceBackend>::new())
        .app_data(web::Data::new(payments))
        .app_data(web::Data::new(commerce))
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(MappingConfig::default()))
        .app_data(web::Data::new(IdempotencyGuard::new(Duration::from_secs(600))));
}

fn event_payload(event_type: &str, session_id: &str, amount_total: i64) -> Vec<u8> {
    json!({
        "id": "evt_test_0001",
        "type": event_type,
        "created": Utc::now().timestamp(),
        "livemode": false,
        "data": { "object": {
            "id": session_id,
            "amount_total": amount_total,
            "currency": "pln",
            "payment_status": "paid",
            "customer_details": { "email": "anna@example.com", "name": "Anna Kowalska" }
        }}
    })
    .to_string()
    .into_bytes()
}

fn completed_payload(session_id: &str, amount_total: i64) -> Vec<u8> {
    event_payload(CHECKOUT_SESSION_COMPLETED, session_id, amount_total)
}

fn signed_header(payload: &[u8]) -> (&'static str, String) {
    let timestamp = Utc::now().timestamp();
    let signature = compute_signature(timestamp, payload, WEBHOOK_SECRET).expect("A valid test signature");
    (SIGNATURE_HEADER, format!("t={timestamp},v1={signature}"))
}

fn paid_session_payments() -> MockPaymentProcessor {
    let mut payments = MockPaymentProcessor::new();
    payments.expect_fetch_session_expanded().withf(|id| id == "cs_test_1").returning(|_| {
        let mut session = SessionBuilder::new();
        session
            .id("cs_test_1")
            .amount_total(5000)
            .customer("Anna Kowalska", "anna@example.com")
            .line_item("Wool scarf", Some(2), 5000);
        Ok(session.build())
    });
    payments
}

fn configure_submitted(cfg: &mut ServiceConfig) {
    let mut commerce = MockCommerceBackend::new();
    commerce
        .expect_create_order()
        .withf(|order| {
            order.financial_status == "paid"
                && order.email == "anna@example.com"
                && order.tags.as_deref() == Some("P24")
                && order.note.as_deref() == Some("Paid via Przelewy24 using Stripe Checkout")
                && order.line_items.len() == 1
                && order.line_items[0].title.as_deref() == Some("Wool scarf")
                && order.line_items[0].price.as_deref() == Some("25.00")
                && order.line_items[0].quantity == 2
        })
        .returning(|_| Ok(CreatedOrder { id: 5678901234, name: Some("#1042".to_string()), created_at: None }));
    install(cfg, paid_session_payments(), commerce);
}

fn configure_snapshot_fallback(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments
        .expect_fetch_session_expanded()
        .returning(|_| Err(StripeApiError::QueryError { status: 500, message: "Internal error".to_string() }));
    let mut commerce = MockCommerceBackend::new();
    commerce
        .expect_create_order()
        .withf(|order| {
            order.line_items.len() == 1
                && order.line_items[0].title.as_deref() == Some("Stripe P24 Order")
                && order.line_items[0].price.as_deref() == Some("50.00")
                && order.line_items[0].quantity == 1
                && order.shipping_lines.is_empty()
        })
        .returning(|_| Ok(CreatedOrder { id: 777000111, name: None, created_at: None }));
    install(cfg, payments, commerce);
}

fn configure_fetch_timeout(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments
        .expect_fetch_session_expanded()
        .returning(|_| Err(StripeApiError::Timeout("deadline has elapsed".to_string())));
    install(cfg, payments, MockCommerceBackend::new());
}

fn configure_submit_timeout(cfg: &mut ServiceConfig) {
    let mut commerce = MockCommerceBackend::new();
    commerce
        .expect_create_order()
        .returning(|_| Err(ShopifyApiError::Timeout("deadline has elapsed".to_string())));
    install(cfg, paid_session_payments(), commerce);
}

fn configure_rejected(cfg: &mut ServiceConfig) {
    let mut commerce = MockCommerceBackend::new();
    commerce
        .expect_create_order()
        .returning(|_| Err(ShopifyApiError::QueryError { status: 422, message: "Unprocessable Entity".to_string() }));
    install(cfg, paid_session_payments(), commerce);
}

fn configure_duplicate(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments.expect_fetch_session_expanded().times(1).returning(|_| {
        let mut session = SessionBuilder::new();
        session.id("cs_test_1").amount_total(5000).customer("Anna Kowalska", "anna@example.com").line_item(
            "Wool scarf",
            Some(2),
            5000,
        );
        Ok(session.build())
    });
    let mut commerce = MockCommerceBackend::new();
    commerce
        .expect_create_order()
        .times(1)
        .returning(|_| Ok(CreatedOrder { id: 5678901234, name: None, created_at: None }));
    install(cfg, payments, commerce);
}

fn configure_no_calls(cfg: &mut ServiceConfig) {
    install(cfg, MockPaymentProcessor::new(), MockCommerceBackend::new());
}

#[actix_web::test]
async fn verified_notification_creates_an_order() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let header = signed_header(&payload);
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_submitted).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Order 5678901234 created for session cs_test_1."), "Unexpected body: {body}");
    assert!(body.contains("\"success\":true"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn failed_refetch_degrades_to_the_event_snapshot() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let header = signed_header(&payload);
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_snapshot_fallback).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Degraded order 777000111 created for session cs_test_1."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn refetch_timeout_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let header = signed_header(&payload);
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_fetch_timeout).await.expect("Request failed");
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.contains("did not complete in time"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn submission_timeout_asks_for_redelivery() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let header = signed_header(&payload);
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_submit_timeout).await.expect("Request failed");
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body.contains("did not complete in time"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn downstream_rejection_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let header = signed_header(&payload);
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_rejected).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"success\":false"), "Unexpected body: {body}");
    assert!(body.contains("Order creation failed for session cs_test_1."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn tampered_payloads_are_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let header = signed_header(&payload);
    let tampered = completed_payload("cs_test_1", 999_999);
    let (status, body) =
        post_request("/webhook", &[header], tampered, configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("signature does not match"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn missing_signature_header_is_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let (status, body) = post_request("/webhook", &[], payload, configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("signature header is missing"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn stale_signatures_are_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let timestamp = Utc::now().timestamp() - 3600;
    let signature = compute_signature(timestamp, &payload, WEBHOOK_SECRET).expect("A valid test signature");
    let header = (SIGNATURE_HEADER, format!("t={timestamp},v1={signature}"));
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("tolerance"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn other_event_types_are_acknowledged_untouched() {
    let _ = env_logger::try_init().ok();
    let payload = event_payload("payment_intent.succeeded", "pi_test_1", 5000);
    let header = signed_header(&payload);
    let (status, body) =
        post_request("/webhook", &[header], payload, configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Ignoring payment_intent.succeeded notification."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn wrong_method_is_not_allowed() {
    let _ = env_logger::try_init().ok();
    let (status, _) = get_request("/webhook", configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[actix_web::test]
async fn duplicate_deliveries_collapse_to_one_order() {
    let _ = env_logger::try_init().ok();
    let payload = completed_payload("cs_test_1", 5000);
    let app = test::init_service(App::new().configure(configure_duplicate)).await;

    let (name, value) = signed_header(&payload);
    let req =
        TestRequest::post().uri("/webhook").insert_header((name, value.as_str())).set_payload(payload.clone()).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    assert!(body.contains("Order 5678901234 created"), "Unexpected body: {body}");

    let (name, value) = signed_header(&payload);
    let req = TestRequest::post().uri("/webhook").insert_header((name, value.as_str())).set_payload(payload).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    assert!(body.contains("Session cs_test_1 has already been processed."), "Unexpected body: {body}");
}
