//! Turning an HTTP request into a [`GatewayRequest`].
//!
//! This is where the transport assigns what the rest of the gateway treats
//! as given: request id, source address and receive time.

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::gateway::GatewayRequest;

pub const X_REQUEST_ID: &str = "x-request-id";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Transport options for building gateway requests.
#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    pub trust_forwarded_for: bool,
    pub max_body_size: usize,
}

/// Read the body and metadata of `request`.
///
/// The `x-request-id` header is taken as given. The server replaces any
/// caller-sent value before this runs unless the listener trusts inbound
/// ids. Fails with 413 when the body exceeds `max_body_size`.
pub async fn into_gateway_request(
    request: Request<Body>,
    peer: SocketAddr,
    options: TransportOptions,
) -> Result<GatewayRequest, StatusCode> {
    let received_at = epoch_seconds();
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let source_ip = source_ip(&parts.headers, peer, options.trust_forwarded_for);
    let headers = flatten_headers(&parts.headers);

    let bytes = axum::body::to_bytes(body, options.max_body_size)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let (body, is_body_base64_encoded) = if bytes.is_empty() || is_textual(content_type) {
        (bytes, false)
    } else {
        (STANDARD.encode(&bytes).into(), true)
    };

    Ok(GatewayRequest {
        request_id,
        source_ip,
        headers,
        body,
        is_body_base64_encoded,
        http_method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        received_at,
    })
}

fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// The caller's address: the TCP peer, or the first `X-Forwarded-For` hop
/// when the listener sits behind a trusted proxy.
fn source_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_string()
}

/// Lowercase names; repeated headers are joined with a comma. Values that
/// are not valid UTF-8 are dropped.
fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else { continue };
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push(',');
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    flat
}

/// Bodies with these content types pass through verbatim; anything else is
/// base64 encoded for the handler.
fn is_textual(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else { return true };
    let mime = ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    mime.starts_with("text/")
        || mime == "application/json"
        || mime.ends_with("+json")
        || mime == "application/xml"
        || mime.ends_with("+xml")
        || mime == "application/x-www-form-urlencoded"
}
