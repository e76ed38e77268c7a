use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use shopify_tools::ShopifyApi;
use stripe_tools::StripeApi;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    mapping::MappingConfig,
    relay::{start_marker_sweeper, IdempotencyGuard},
    routes::{checkout_session_resource, health, OrderDetailsRoute},
    webhook_routes::StripeWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let payments =
        StripeApi::new(config.stripe.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let commerce =
        ShopifyApi::new(config.shopify.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let guard = Arc::new(IdempotencyGuard::new(Duration::from_secs(config.idempotency_ttl_secs)));
    start_marker_sweeper(Arc::clone(&guard));
    let srv = create_server_instance(config, payments, commerce, guard)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    payments: StripeApi,
    commerce: ShopifyApi,
    guard: Arc<IdempotencyGuard>,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("scb::access_log"))
            .app_data(web::Data::new(payments.clone()))
            .app_data(web::Data::new(commerce.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(MappingConfig::default()))
            .app_data(web::Data::from(Arc::clone(&guard)))
            .service(health)
            .service(StripeWebhookRoute::<StripeApi, ShopifyApi>::new())
            .service(checkout_session_resource::<StripeApi>())
            .service(OrderDetailsRoute::<StripeApi>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
