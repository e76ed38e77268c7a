//! The inbound notification endpoint.
//!
//! Signature verification runs over the exact bytes the processor signed, so the handler takes
//! the raw body and never lets a JSON extractor near it first.

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use shopify_tools::CommerceOrders;
use stripe_tools::CheckoutSessions;

use crate::{
    config::ServerConfig,
    data_objects::JsonResponse,
    errors::ServerError,
    mapping::MappingConfig,
    relay::{process_notification, IdempotencyGuard, RelayOutcome},
    route,
};

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

route!(stripe_webhook => Post "/webhook" impl CheckoutSessions, CommerceOrders);
pub async fn stripe_webhook<BPay, BCom>(
    req: HttpRequest,
    body: web::Bytes,
    payments: web::Data<BPay>,
    commerce: web::Data<BCom>,
    config: web::Data<ServerConfig>,
    mapping: web::Data<MappingConfig>,
    guard: web::Data<IdempotencyGuard>,
) -> Result<HttpResponse, ServerError>
where
    BPay: CheckoutSessions,
    BCom: CommerceOrders,
{
    trace!("💻️ Received notification on {}", req.uri());
    let signature = req.headers().get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    let outcome =
        process_notification(&body, signature, &config, &mapping, payments.as_ref(), commerce.as_ref(), &guard)
            .await?;
    // Everything below must stay in the 200 range, otherwise the processor keeps redelivering a
    // notification whose failure is on our side.
    let result = match outcome {
        RelayOutcome::Submitted { session_id, order_id, degraded: false } => {
            JsonResponse::success(format!("Order {order_id} created for session {session_id}."))
        },
        RelayOutcome::Submitted { session_id, order_id, degraded: true } => {
            JsonResponse::success(format!("Degraded order {order_id} created for session {session_id}."))
        },
        RelayOutcome::Duplicate { session_id } => {
            JsonResponse::success(format!("Session {session_id} has already been processed."))
        },
        RelayOutcome::Ignored { event_type } => {
            JsonResponse::success(format!("Ignoring {event_type} notification."))
        },
        RelayOutcome::NormalizationFailed { session_id, reason } => {
            JsonResponse::failure(format!("Could not build an order for session {session_id}. {reason}"))
        },
        RelayOutcome::SubmissionFailed { session_id, reason } => {
            JsonResponse::failure(format!("Order creation failed for session {session_id}. {reason}"))
        },
    };
    Ok(HttpResponse::Ok().json(result))
}
