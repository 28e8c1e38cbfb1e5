//! Rendering a [`HandlerResponse`] as an HTTP response.

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::gateway::HandlerResponse;

impl IntoResponse for HandlerResponse {
    fn into_response(self) -> Response {
        let Ok(status) = StatusCode::from_u16(self.status_code) else {
            tracing::error!(status = self.status_code, "Handler returned an invalid status code");
            return StatusCode::BAD_GATEWAY.into_response();
        };

        let body = if self.is_body_base64_encoded {
            match STANDARD.decode(self.body.as_bytes()) {
                Ok(bytes) => Body::from(bytes),
                Err(e) => {
                    tracing::error!(error = %e, "Handler returned an undecodable body");
                    return StatusCode::BAD_GATEWAY.into_response();
                }
            }
        } else {
            Body::from(self.body)
        };

        let mut response = Response::new(body);
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid handler header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_headers_and_status() {
        let response = HandlerResponse::text(201, "made")
            .with_header("Access-Control-Allow-Origin", "*")
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"made");
    }

    #[tokio::test]
    async fn test_base64_body_decoded() {
        let mut handler_response = HandlerResponse::text(200, "aGVsbG8=");
        handler_response.is_body_base64_encoded = true;

        let response = handler_response.into_response();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[test]
    fn test_invalid_status() {
        let response = HandlerResponse::text(42, "").into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
