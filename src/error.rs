//! Errors that end a request at the gateway boundary.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::audit::StoreError;

/// Every way a request can be refused or fail before a handler response is
/// returned to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Admission control shed the request. Not audited.
    #[error("rate limit exceeded")]
    Throttled,

    /// The mandatory audit write failed; the request is denied.
    #[error("audit write failed: {0}")]
    AuditWrite(#[from] StoreError),

    /// The credential could not be read by a verification strategy.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// The verification strategy refused the credential.
    #[error("request denied")]
    Denied,

    /// The handler could not decode an encoded body.
    #[error("failed to decode body: {0}")]
    Decode(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream timed out after {0} seconds")]
    UpstreamTimeout(u64),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Throttled => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::AuditWrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::MalformedCredential(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Denied => StatusCode::FORBIDDEN,
            GatewayError::Decode(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Body shown to the caller. Internal detail stays in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            GatewayError::Throttled => "Too Many Requests",
            GatewayError::AuditWrite(_) => "Internal Server Error",
            GatewayError::MalformedCredential(_) => "Unauthorized",
            GatewayError::Denied => "Forbidden",
            GatewayError::Decode(_) => "Bad Request",
            GatewayError::Upstream(_) => "Bad Gateway",
            GatewayError::UpstreamTimeout(_) => "Gateway Timeout",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(GatewayError::Throttled.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            GatewayError::AuditWrite(StoreError::Timeout(5)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::MalformedCredential("x".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(GatewayError::Denied.status(), StatusCode::FORBIDDEN);
        assert_eq!(GatewayError::Decode("x".into()).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::AuditWrite(StoreError::Timeout(3000));
        assert_eq!(err.to_string(), "audit write failed: audit write timed out after 3000 ms");
    }

    #[test]
    fn test_response_hides_detail() {
        let response = GatewayError::AuditWrite(StoreError::Unavailable("db down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
