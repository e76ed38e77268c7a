//! Verification of signed webhook notifications.
//!
//! The payment processor signs every notification with HMAC-SHA256 over the string
//! `"{timestamp}.{raw body}"` and sends the result in the `Stripe-Signature` header as
//! `t={timestamp},v1={hex digest}`. Verification therefore has to run over the exact bytes that
//! arrived on the wire. Parsing the body into JSON and serializing it again produces different
//! bytes and a digest that can never match, so callers must hand this module the untouched
//! request body.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha256;

use crate::{data_objects::CheckoutSession, error::WebhookError};

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";

type HmacSha256 = Hmac<Sha256>;

/// A verified notification from the payment processor. `data.object` is kept opaque; the
/// dispatcher decides how much of it to trust (usually only the session id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub livemode: bool,
    pub data: EventData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventData {
    pub object: Value,
}

impl Event {
    pub fn is_checkout_completed(&self) -> bool {
        self.event_type == CHECKOUT_SESSION_COMPLETED
    }

    /// The session identifier embedded in the event payload, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }

    /// Deserializes the embedded session snapshot. The snapshot is not authoritative (expandable
    /// relations are usually absent), but it is all that is available when a re-fetch fails.
    pub fn session_snapshot(&self) -> Result<CheckoutSession, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
    }
}

/// The hex HMAC-SHA256 digest of `"{timestamp}.{payload}"` under `secret`. Also used by tests to
/// produce valid headers.
pub fn compute_signature(timestamp: i64, payload: &[u8], secret: &str) -> Result<String, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::InvalidSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the signature header against the raw payload. Accepts if any `v1` entry matches the
/// expected digest and the timestamp is within `tolerance_secs` of now.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> Result<(), WebhookError> {
    let (timestamp, signatures) = parse_signature_header(header)?;
    if signatures.is_empty() {
        return Err(WebhookError::MissingSignature);
    }
    let age = Utc::now().timestamp() - timestamp;
    if age.abs() > tolerance_secs {
        return Err(WebhookError::TimestampOutOfTolerance(tolerance_secs));
    }
    let expected = compute_signature(timestamp, payload, secret)?;
    if signatures.iter().any(|sig| *sig == expected) {
        Ok(())
    } else {
        Err(WebhookError::SignatureMismatch)
    }
}

/// Verifies the signature and only then parses the payload into an [`Event`].
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> Result<Event, WebhookError> {
    verify_signature(payload, header, secret, tolerance_secs)?;
    serde_json::from_slice(payload).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
}

/// Splits `t=...,v1=...,v1=...` into the timestamp and the list of v1 digests. Entries under
/// other schemes (`v0` from test-mode endpoints) are ignored.
fn parse_signature_header(header: &str) -> Result<(i64, Vec<&str>), WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::with_capacity(1);
    for pair in header.split(',') {
        let mut kv = pair.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(v)) => {
                let t = v.parse::<i64>().map_err(|_| WebhookError::MalformedHeader)?;
                timestamp = Some(t);
            },
            (Some("v1"), Some(v)) => signatures.push(v),
            _ => {},
        }
    }
    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    Ok((timestamp, signatures))
}
