//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers suspend at every upstream call, so never block the worker thread here; anything
//! long-running and non-cpu-bound must be awaited.

use actix_web::{get, http::Method, web, HttpResponse, HttpResponseBuilder, Resource, Responder};
use log::*;
use scb_common::MinorUnits;
use stripe_tools::{CheckoutSessions, NewLineItem, NewSessionParams};

use crate::{
    config::ServerConfig,
    data_objects::{CheckoutRequest, CheckoutSessionResponse, OrderDetails, OrderDetailsQuery},
    errors::ServerError,
    mapping::MappingConfig,
};

// Actix cannot register generic handlers directly, so each route is wrapped in a small factory
// struct. Unmatched methods on a registered path fall through to the resource default, a 405.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .route(actix_web::web::[<$method:lower>]().to($name::< $( [< T $bounds:camel >], )+>));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

//----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//--------------------------------------   Checkout creation   -------------------------------------------------

/// The checkout-creation resource. Assembled by hand rather than through `route!`: the
/// storefront calls it cross-origin, so the OPTIONS preflight must be answered on the same path.
pub fn checkout_session_resource<B: CheckoutSessions + 'static>() -> Resource {
    web::resource("/create-checkout-session")
        .name("create_checkout_session")
        .route(web::post().to(create_checkout_session::<B>))
        .route(web::method(Method::OPTIONS).to(checkout_preflight))
}

pub async fn create_checkout_session<B: CheckoutSessions>(
    body: web::Json<CheckoutRequest>,
    payments: web::Data<B>,
    config: web::Data<ServerConfig>,
    mapping: web::Data<MappingConfig>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received checkout session request");
    let request = body.into_inner();
    let total = request.total_amount.unwrap_or_default();
    if request.items.is_empty() || total <= 0 {
        info!("💻️ Rejecting checkout request with {} item(s) and total {total}.", request.items.len());
        return Err(ServerError::InvalidRequestBody("Missing items or total amount.".to_string()));
    }
    let params = session_params(&request, MinorUnits::from(total), &config, &mapping);
    let session = match payments.create_checkout_session(&params).await {
        Ok(session) => session,
        Err(e) if e.is_timeout() => return Err(ServerError::UpstreamTimeout(e.to_string())),
        Err(e) => {
            error!("💳️ Could not create a checkout session. {e}");
            return Err(ServerError::BackendError(e.to_string()));
        },
    };
    let url = session
        .url
        .ok_or_else(|| ServerError::BackendError("The new session carries no redirect URL".to_string()))?;
    info!("💳️ Checkout session {} created.", session.id);
    Ok(with_cors(HttpResponse::Ok()).json(CheckoutSessionResponse { url }))
}

pub async fn checkout_preflight() -> HttpResponse {
    trace!("💻️ Received checkout preflight request");
    with_cors(HttpResponse::Ok()).finish()
}

fn with_cors(mut builder: HttpResponseBuilder) -> HttpResponseBuilder {
    builder
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Methods", "POST, OPTIONS"))
        .insert_header(("Access-Control-Allow-Headers", "Content-Type"));
    builder
}

fn session_params(
    request: &CheckoutRequest,
    total: MinorUnits,
    config: &ServerConfig,
    mapping: &MappingConfig,
) -> NewSessionParams {
    let line_items = request
        .items
        .iter()
        .map(|item| NewLineItem {
            name: item.name.clone(),
            unit_amount: MinorUnits::from(item.amount),
            quantity: item.quantity,
            currency: item.currency.clone().unwrap_or_else(|| "pln".to_string()),
            metadata: item.metadata.clone(),
        })
        .collect();
    let customer_email = request.customer_email.clone().filter(|e| e.contains('@'));
    if customer_email.is_none() {
        info!("💻️ No usable email on the checkout request. Proceeding without one.");
    }
    NewSessionParams {
        payment_method_types: vec!["p24".to_string()],
        mode: "payment".to_string(),
        line_items,
        shipping_options: mapping.shipping_options_for_total(total),
        allowed_shipping_countries: vec!["PL".to_string()],
        success_url: format!("{}/pages/success?session_id={{CHECKOUT_SESSION_ID}}", config.storefront_base_url),
        cancel_url: format!("{}/cart", config.storefront_base_url),
        customer_email,
        locale: request.locale.clone(),
    }
}

//--------------------------------------   Order details   -----------------------------------------------------

route!(order_details => Get "/order-details" impl CheckoutSessions);
/// What the storefront's success page shows the shopper, straight from an expanded session read.
pub async fn order_details<B: CheckoutSessions>(
    query: web::Query<OrderDetailsQuery>,
    payments: web::Data<B>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received order details request");
    let session_id = query
        .into_inner()
        .session_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::InvalidRequestPath("Missing session_id".to_string()))?;
    let session = match payments.fetch_session_expanded(&session_id).await {
        Ok(session) => session,
        Err(e) if e.is_timeout() => return Err(ServerError::UpstreamTimeout(e.to_string())),
        Err(e) => {
            warn!("💳️ Could not retrieve session {session_id}. {e}");
            return Err(ServerError::BackendError("Failed to retrieve order details".to_string()));
        },
    };
    Ok(HttpResponse::Ok().json(OrderDetails::from_session(&session)))
}
