//! Shapes crossing the boundaries between transport, authorizer and handler.

use axum::body::Bytes;
use std::collections::HashMap;

/// An inbound request as seen by the gateway.
///
/// Header names are lowercase. Binary bodies arrive base64 encoded with
/// `is_body_base64_encoded` set.
#[derive(Debug, Clone, Default)]
pub struct GatewayRequest {
    pub request_id: String,
    pub source_ip: String,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    pub is_body_base64_encoded: bool,
    pub http_method: String,
    pub path: String,
    pub query: Option<String>,
    /// Epoch seconds at which the transport received the request.
    pub received_at: i64,
}

impl GatewayRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// The authorizer's verdict. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Decision {
    pub allowed: bool,
    /// Claims forwarded to the handler alongside the request.
    pub principal_context: HashMap<String, String>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            principal_context: HashMap::new(),
        }
    }

    pub fn allow_with(principal_context: HashMap<String, String>) -> Self {
        Self {
            allowed: true,
            principal_context,
        }
    }

    pub fn deny() -> Self {
        Self::default()
    }
}

/// The original request plus the decision context, as delivered to a handler.
#[derive(Debug, Clone)]
pub struct ForwardedRequest {
    pub request: GatewayRequest,
    pub context: HashMap<String, String>,
}

/// What a handler returns. The transport decodes `body` before replying when
/// `is_body_base64_encoded` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
    pub is_body_base64_encoded: bool,
}

impl HandlerResponse {
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            body: body.into(),
            headers: HashMap::new(),
            is_body_base64_encoded: false,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_ignores_case() {
        let mut request = GatewayRequest::default();
        request
            .headers
            .insert("authorization".to_string(), "Bearer t".to_string());

        assert_eq!(request.header("Authorization"), Some("Bearer t"));
        assert_eq!(request.header("x-missing"), None);
    }

    #[test]
    fn test_decisions() {
        assert!(Decision::allow().allowed);
        assert!(Decision::allow().principal_context.is_empty());
        assert!(!Decision::deny().allowed);
    }
}
