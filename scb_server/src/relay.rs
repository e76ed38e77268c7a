//! The notification dispatcher. Verifies the delivery, drives it through normalization and
//! submission, collapses duplicate deliveries for the same session, and decides what the
//! processor is told.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use log::*;
use shopify_tools::CommerceOrders;
use stripe_tools::{construct_event, CheckoutSessions};
use tokio::task::JoinHandle;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::{
        shopify::{submit_canonical_order, SubmissionError},
        stripe::{canonical_order_from_session, degraded_order_from_snapshot, OrderConversionError},
    },
    mapping::MappingConfig,
};

const SWEEP_INTERVAL_SECS: u64 = 60;

/// How an acknowledged delivery ended up. Everything here is terminal for the delivery; the
/// processor is not asked to redeliver any of it.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Submitted { session_id: String, order_id: i64, degraded: bool },
    /// Another delivery for the same session is in flight or recently settled.
    Duplicate { session_id: String },
    /// Verified, but not an event type this server acts on.
    Ignored { event_type: String },
    NormalizationFailed { session_id: String, reason: String },
    SubmissionFailed { session_id: String, reason: String },
}

/// Runs one delivery through verify, normalize and submit.
///
/// Returns an error only when the processor should take action itself: a failed verification
/// (400, the delivery is not ours to act on) or an upstream timeout (504, redelivery will retry
/// it). Every other result is an acknowledged [`RelayOutcome`].
pub async fn process_notification<P, C>(
    payload: &[u8],
    signature_header: Option<&str>,
    config: &ServerConfig,
    mapping: &MappingConfig,
    payments: &P,
    commerce: &C,
    guard: &IdempotencyGuard,
) -> Result<RelayOutcome, ServerError>
where
    P: CheckoutSessions,
    C: CommerceOrders,
{
    let header = signature_header
        .ok_or_else(|| ServerError::InvalidSignature("The signature header is missing".to_string()))?;
    let secret = config.stripe.webhook_secret.reveal();
    let event = construct_event(payload, header, secret, config.webhook_tolerance_secs).map_err(|e| {
        warn!("🔐️ Rejecting notification: {e}");
        ServerError::InvalidSignature(e.to_string())
    })?;
    if !event.is_checkout_completed() {
        info!("💳️ Ignoring {} notification {}.", event.event_type, event.id);
        return Ok(RelayOutcome::Ignored { event_type: event.event_type });
    }
    let Some(session_id) = event.session_id().map(String::from) else {
        warn!("💳️ Event {} is a completed checkout without a session id.", event.id);
        return Ok(RelayOutcome::NormalizationFailed {
            session_id: String::new(),
            reason: "The event payload carries no session id".to_string(),
        });
    };
    info!("💳️ Payment confirmed for session {session_id}.");
    if !guard.begin(&session_id) {
        info!("💳️ Session {session_id} already has a delivery in flight or settled. Collapsing this one.");
        return Ok(RelayOutcome::Duplicate { session_id });
    }

    let conversion = match payments.fetch_session_expanded(&session_id).await {
        Ok(session) => canonical_order_from_session(&session, mapping),
        Err(e) if e.is_timeout() => {
            guard.release(&session_id);
            warn!("💳️ The authoritative read of session {session_id} timed out. Redelivery will retry it. {e}");
            return Err(ServerError::UpstreamTimeout(e.to_string()));
        },
        Err(e) => {
            warn!("💳️ Could not re-fetch session {session_id} ({e}). Degrading to the event snapshot.");
            match event.session_snapshot() {
                Ok(snapshot) => degraded_order_from_snapshot(&snapshot, mapping),
                Err(e) => Err(OrderConversionError::FormatError(e.to_string())),
            }
        },
    };
    let order = match conversion {
        Ok(order) => order,
        Err(e) => {
            error!("💳️ Session {session_id} could not be turned into an order. {e}");
            guard.complete(&session_id);
            return Ok(RelayOutcome::NormalizationFailed { session_id, reason: e.to_string() });
        },
    };

    match submit_canonical_order(&order, commerce).await {
        Ok(created) => {
            guard.complete(&session_id);
            Ok(RelayOutcome::Submitted { session_id, order_id: created.id, degraded: order.degraded })
        },
        Err(SubmissionError::Timeout(reason)) => {
            guard.release(&session_id);
            Err(ServerError::UpstreamTimeout(reason))
        },
        Err(SubmissionError::Rejected(reason)) => {
            guard.complete(&session_id);
            Ok(RelayOutcome::SubmissionFailed { session_id, reason })
        },
    }
}

//--------------------------------------   Idempotency guard   -------------------------------------------------------

/// Collapses the processor's at-least-once deliveries into at most one downstream order per
/// session. A marker is held while a delivery is in flight and for a further TTL once it
/// settles.
#[derive(Debug)]
pub struct IdempotencyGuard {
    ttl: Duration,
    markers: Mutex<HashMap<String, Instant>>,
}

impl IdempotencyGuard {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, markers: Mutex::new(HashMap::new()) }
    }

    /// Claims the session for this delivery. Returns false when a live marker already exists.
    pub fn begin(&self, session_id: &str) -> bool {
        let mut markers = self.lock();
        match markers.get(session_id) {
            Some(stamp) if stamp.elapsed() < self.ttl => false,
            _ => {
                markers.insert(session_id.to_string(), Instant::now());
                true
            },
        }
    }

    /// Refreshes the marker so duplicates keep collapsing for a full TTL after settling.
    pub fn complete(&self, session_id: &str) {
        self.lock().insert(session_id.to_string(), Instant::now());
    }

    /// Drops the marker so a redelivery can retry, e.g. after an upstream timeout.
    pub fn release(&self, session_id: &str) {
        self.lock().remove(session_id);
    }

    /// Removes expired markers. Returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let mut markers = self.lock();
        let before = markers.len();
        markers.retain(|_, stamp| stamp.elapsed() < self.ttl);
        before - markers.len()
    }

    pub fn live_markers(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        // The marker map stays usable even if a holder panicked mid-delivery.
        self.markers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Spawns the background task that prunes expired session markers.
pub fn start_marker_sweeper(guard: Arc<IdempotencyGuard>) -> JoinHandle<()> {
    info!("🕰️ Session marker sweeper started. Markers expire after {}s.", guard.ttl.as_secs());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            trace!("🕰️ Sweeping expired session markers");
            let dropped = guard.sweep();
            if dropped > 0 {
                debug!("🕰️ Dropped {dropped} expired session marker(s). {} still live.", guard.live_markers());
            }
        }
    })
}
