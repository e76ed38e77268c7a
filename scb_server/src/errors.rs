use actix_web::{http::header::ContentType, http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("The notification signature could not be verified. {0}")]
    InvalidSignature(String),
    #[error("An upstream call did not complete in time. {0}")]
    UpstreamTimeout(String),
    #[error("Could not read request body. {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path. {0}")]
    InvalidRequestPath(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidSignature(_) | Self::InvalidRequestBody(_) | Self::InvalidRequestPath(_) => {
                StatusCode::BAD_REQUEST
            },
            // Signals the notifying processor that this delivery failed and should be retried.
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::Unspecified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let msg = self.to_string();
        let body = json!({"error": msg}).to_string();
        HttpResponse::build(self.status_code()).content_type(ContentType::json()).body(body)
    }
}
