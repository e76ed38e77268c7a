use actix_web::{
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
};
use serde_json::json;
use stripe_tools::{SessionBuilder, StripeApiError};

use super::{
    helpers::{get_request, post_json},
    mocks::MockPaymentProcessor,
};
use crate::{
    config::ServerConfig,
    mapping::MappingConfig,
    routes::{checkout_session_resource, health, OrderDetailsRoute},
};

const CHECKOUT_URL: &str = "https://checkout.stripe.com/c/pay/cs_test_a1b2c3";

fn install(cfg: &mut ServiceConfig, payments: MockPaymentProcessor) {
    cfg.service(health)
        .service(checkout_session_resource::<MockPaymentProcessor>())
        .service(OrderDetailsRoute::<MockPaymentProcessor>::new())
        .app_data(web::Data::new(payments))
        .app_data(web::Data::new(ServerConfig::default()))
        .app_data(web::Data::new(MappingConfig::default()));
}

fn new_session_with_url() -> Result<stripe_tools::CheckoutSession, StripeApiError> {
    let mut session = SessionBuilder::random_session();
    session.url = Some(CHECKOUT_URL.to_string());
    Ok(session)
}

fn configure_no_calls(cfg: &mut ServiceConfig) {
    install(cfg, MockPaymentProcessor::new());
}

fn configure_free_shipping(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments
        .expect_create_checkout_session()
        .withf(|params| {
            params.payment_method_types == ["p24"]
                && params.mode == "payment"
                && params.customer_email.as_deref() == Some("anna@example.com")
                && params.locale.as_deref() == Some("pl")
                && params.success_url == "https://luxenordique.com/pages/success?session_id={CHECKOUT_SESSION_ID}"
                && params.cancel_url == "https://luxenordique.com/cart"
                && params.shipping_options.len() == 1
                && params.shipping_options[0].amount.value() == 0
        })
        .returning(|_| new_session_with_url());
    install(cfg, payments);
}

fn configure_paid_shipping(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments
        .expect_create_checkout_session()
        .withf(|params| {
            params.customer_email.is_none()
                && params.shipping_options.len() == 2
                && params.shipping_options[0].amount.value() == 2000
                && params.shipping_options[1].amount.value() == 3500
        })
        .returning(|_| new_session_with_url());
    install(cfg, payments);
}

fn configure_details(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments.expect_fetch_session_expanded().withf(|id| id == "cs_test_1").returning(|_| {
        let mut session = SessionBuilder::new();
        session
            .id("cs_test_1")
            .amount_total(27000)
            .customer("Anna Kowalska", "anna@example.com")
            .shipping_rate("DPD – Dostawa standardowa", 2000)
            .line_item("Wool scarf", Some(2), 15000)
            .line_item("Leather gloves", Some(1), 10000);
        Ok(session.build())
    });
    install(cfg, payments);
}

fn configure_details_failure(cfg: &mut ServiceConfig) {
    let mut payments = MockPaymentProcessor::new();
    payments
        .expect_fetch_session_expanded()
        .returning(|_| Err(StripeApiError::QueryError { status: 404, message: "No such session".to_string() }));
    install(cfg, payments);
}

#[actix_web::test]
async fn health_endpoint_responds() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/health", configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn checkout_session_is_created() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure_free_shipping)).await;
    let body = json!({
        "items": [{ "name": "Wool scarf", "amount": 12500, "quantity": 2 }],
        "total_amount": 25000,
        "customer_email": "anna@example.com",
        "locale": "pl"
    });
    let req = TestRequest::post().uri("/create-checkout-session").set_json(body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let cors = res.headers().get("Access-Control-Allow-Origin").expect("A CORS header");
    assert_eq!(cors, "*");
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    assert!(body.contains(CHECKOUT_URL), "Unexpected body: {body}");
}

#[actix_web::test]
async fn paid_tiers_are_offered_below_the_free_shipping_threshold() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "items": [{ "name": "Leather gloves", "amount": 10000, "quantity": 1 }],
        "total_amount": 10000,
        "customer_email": "not-an-email"
    });
    let (status, body) =
        post_json("/create-checkout-session", body, configure_paid_shipping).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(CHECKOUT_URL), "Unexpected body: {body}");
}

#[actix_web::test]
async fn checkout_without_items_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "items": [], "total_amount": 5000 });
    let (status, body) =
        post_json("/create-checkout-session", body, configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Missing items or total amount."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn checkout_without_a_total_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({ "items": [{ "name": "Wool scarf", "amount": 12500, "quantity": 2 }] });
    let (status, body) =
        post_json("/create-checkout-session", body, configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Missing items or total amount."), "Unexpected body: {body}");
}

#[actix_web::test]
async fn preflight_carries_cors_headers() {
    let _ = env_logger::try_init().ok();
    let app = test::init_service(App::new().configure(configure_no_calls)).await;
    let req = TestRequest::default().method(Method::OPTIONS).uri("/create-checkout-session").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("Access-Control-Allow-Origin").expect("A CORS header"), "*");
    let methods = res.headers().get("Access-Control-Allow-Methods").expect("A CORS header");
    assert!(methods.to_str().unwrap().contains("POST"));
}

#[actix_web::test]
async fn order_details_reflect_the_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/order-details?session_id=cs_test_1", configure_details).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("anna@example.com"), "Unexpected body: {body}");
    assert!(body.contains("DPD – Dostawa standardowa"), "Unexpected body: {body}");
    assert!(body.contains("\"amount_total\":27000"), "Unexpected body: {body}");
    assert!(body.contains("\"shipping_cost\":2000"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn order_details_require_a_session_id() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("/order-details", configure_no_calls).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Missing session_id"), "Unexpected body: {body}");
}

#[actix_web::test]
async fn order_details_report_backend_failures() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        get_request("/order-details?session_id=cs_test_gone", configure_details_failure).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("Failed to retrieve order details"), "Unexpected body: {body}");
}
