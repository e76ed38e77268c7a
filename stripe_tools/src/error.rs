use thiserror::Error;

#[derive(Debug, Error)]
pub enum StripeApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The call to the payment API exceeded its deadline: {0}")]
    Timeout(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
}

impl StripeApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("The signature header is missing or malformed")]
    MalformedHeader,
    #[error("The signature header carries no v1 signatures")]
    MissingSignature,
    #[error("The signature timestamp is outside the allowed tolerance of {0}s")]
    TimestampOutOfTolerance(i64),
    #[error("The signature does not match the payload")]
    SignatureMismatch,
    #[error("The signing secret could not be used as an HMAC key")]
    InvalidSecret,
    #[error("The event payload is not valid JSON: {0}")]
    InvalidPayload(String),
}
