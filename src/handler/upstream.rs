//! Forwards allowed requests to an upstream HTTP service.

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    http::{header, Request},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::GatewayError;
use crate::gateway::{ForwardedRequest, HandlerResponse};
use crate::handler::DownstreamHandler;

/// Prefix for decision context entries forwarded as headers.
pub const CONTEXT_HEADER_PREFIX: &str = "x-gateway-context-";

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.contains(&name)
}

pub struct UpstreamHandler {
    client: Client<HttpConnector, Body>,
    upstream: String,
    timeout: Duration,
    max_body_size: usize,
}

impl UpstreamHandler {
    /// `upstream` is a host:port authority.
    pub fn new(upstream: impl Into<String>, timeout: Duration, max_body_size: usize) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            upstream: upstream.into(),
            timeout,
            max_body_size,
        }
    }

    fn build_request(&self, forwarded: &ForwardedRequest) -> Result<Request<Body>, GatewayError> {
        let request = &forwarded.request;

        // Forward the bytes the caller sent, not the transport's encoding.
        let body: Bytes = if request.is_body_base64_encoded {
            STANDARD
                .decode(&request.body)
                .map_err(|e| GatewayError::Decode(e.to_string()))?
                .into()
        } else {
            request.body.clone()
        };

        let uri = match &request.query {
            Some(q) => format!("http://{}{}?{}", self.upstream, request.path, q),
            None => format!("http://{}{}", self.upstream, request.path),
        };

        let mut builder = Request::builder()
            .method(request.http_method.as_str())
            .uri(uri);

        for (name, value) in &request.headers {
            // Context headers are only ever set from the decision below.
            if is_hop_by_hop(name)
                || name == "host"
                || name == "content-length"
                || name == "x-request-id"
                || name.starts_with(CONTEXT_HEADER_PREFIX)
            {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = builder.header("x-request-id", request.request_id.as_str());
        for (key, value) in &forwarded.context {
            builder = builder.header(format!("{}{}", CONTEXT_HEADER_PREFIX, key), value.as_str());
        }

        builder
            .body(Body::from(body))
            .map_err(|e| GatewayError::Upstream(format!("invalid forwarded request: {e}")))
    }
}

#[async_trait]
impl DownstreamHandler for UpstreamHandler {
    async fn handle(&self, forwarded: ForwardedRequest) -> Result<HandlerResponse, GatewayError> {
        let request_id = forwarded.request.request_id.clone();
        let req = self.build_request(&forwarded)?;

        let response = match tokio::time::timeout(self.timeout, self.client.request(req)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::error!(request_id = %request_id, upstream = %self.upstream, error = %e, "Upstream error");
                return Err(GatewayError::Upstream(e.to_string()));
            }
            Err(_) => {
                tracing::error!(request_id = %request_id, upstream = %self.upstream, "Upstream timeout");
                return Err(GatewayError::UpstreamTimeout(self.timeout.as_secs()));
            }
        };

        let (parts, body) = response.into_parts();
        let mut headers = HashMap::new();
        for (name, value) in parts.headers.iter() {
            if is_hop_by_hop(name.as_str()) || *name == header::CONTENT_LENGTH {
                continue;
            }
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }

        let bytes = axum::body::to_bytes(Body::new(body), self.max_body_size)
            .await
            .map_err(|e| GatewayError::Upstream(format!("failed to read upstream body: {e}")))?;

        let (body, is_body_base64_encoded) = match String::from_utf8(bytes.to_vec()) {
            Ok(text) => (text, false),
            Err(e) => (STANDARD.encode(e.into_bytes()), true),
        };

        Ok(HandlerResponse {
            status_code: parts.status.as_u16(),
            body,
            headers,
            is_body_base64_encoded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayRequest;

    #[test]
    fn test_build_request_carries_context() {
        let handler = UpstreamHandler::new("127.0.0.1:9", Duration::from_secs(1), 1024);
        let mut request = GatewayRequest {
            request_id: "r1".to_string(),
            http_method: "POST".to_string(),
            path: "/generate".to_string(),
            query: Some("v=2".to_string()),
            body: Bytes::from_static(b"aGk="),
            is_body_base64_encoded: true,
            ..Default::default()
        };
        request.headers.insert("connection".to_string(), "keep-alive".to_string());
        request.headers.insert("content-type".to_string(), "image/png".to_string());
        request
            .headers
            .insert("x-gateway-context-principal".to_string(), "admin".to_string());
        request
            .headers
            .insert("x-gateway-context-role".to_string(), "root".to_string());

        let forwarded = ForwardedRequest {
            request,
            context: HashMap::from([("principal".to_string(), "alice".to_string())]),
        };
        let req = handler.build_request(&forwarded).unwrap();

        assert_eq!(req.uri().to_string(), "http://127.0.0.1:9/generate?v=2");
        assert_eq!(req.headers()["x-request-id"], "r1");
        let principals: Vec<_> = req
            .headers()
            .get_all("x-gateway-context-principal")
            .iter()
            .collect();
        assert_eq!(principals, vec!["alice"]);
        assert!(req.headers().get("x-gateway-context-role").is_none());
        assert_eq!(req.headers()["content-type"], "image/png");
        assert!(req.headers().get("connection").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        // Port 9 (discard) is closed on test hosts.
        let handler = UpstreamHandler::new("127.0.0.1:9", Duration::from_secs(2), 1024);
        let forwarded = ForwardedRequest {
            request: GatewayRequest {
                request_id: "r1".to_string(),
                http_method: "GET".to_string(),
                path: "/".to_string(),
                ..Default::default()
            },
            context: HashMap::new(),
        };

        let err = handler.handle(forwarded).await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
    }
}
