//! Downstream handlers.
//!
//! A handler only ever sees requests that were admitted and allowed. It may
//! be invoked concurrently and in any order.

pub mod prompt;
pub mod upstream;

pub use prompt::PromptHandler;
pub use upstream::UpstreamHandler;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::gateway::{ForwardedRequest, HandlerResponse};

#[async_trait]
pub trait DownstreamHandler: Send + Sync {
    async fn handle(&self, request: ForwardedRequest) -> Result<HandlerResponse, GatewayError>;
}

/// Add the cross-origin headers browser callers need.
pub fn with_cors(response: HandlerResponse) -> HandlerResponse {
    response
        .with_header("Access-Control-Allow-Origin", "*")
        .with_header("Access-Control-Allow-Methods", "POST,OPTIONS")
}

/// Build the handler selected by configuration.
pub fn from_config(config: &GatewayConfig) -> Arc<dyn DownstreamHandler> {
    match &config.handler.upstream {
        Some(upstream) => {
            tracing::info!(upstream = %upstream, "Forwarding allowed requests upstream");
            Arc::new(UpstreamHandler::new(
                upstream.clone(),
                Duration::from_secs(config.handler.timeout_secs),
                config.security.max_body_size,
            ))
        }
        None => Arc::new(PromptHandler),
    }
}
