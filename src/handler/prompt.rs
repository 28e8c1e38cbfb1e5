//! Built-in prompt handler.
//!
//! Stands in for the generation backend: it decodes and logs the payload and
//! acknowledges it. No generation happens here.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::gateway::{ForwardedRequest, HandlerResponse};
use crate::handler::{with_cors, DownstreamHandler};

/// A generation request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptRequest {
    pub text_prompts: Vec<TextPrompt>,
    pub cfg_scale: f64,
    pub steps: u32,
    pub seed: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextPrompt {
    pub text: String,
}

#[derive(Debug, Default)]
pub struct PromptHandler;

#[async_trait]
impl DownstreamHandler for PromptHandler {
    async fn handle(&self, forwarded: ForwardedRequest) -> Result<HandlerResponse, GatewayError> {
        let request = &forwarded.request;

        let payload = if request.is_body_base64_encoded {
            STANDARD
                .decode(&request.body)
                .map_err(|e| GatewayError::Decode(e.to_string()))?
        } else {
            request.body.to_vec()
        };

        tracing::info!(
            request_id = %request.request_id,
            bytes = payload.len(),
            principal = forwarded.context.get("principal").map(String::as_str).unwrap_or("-"),
            "Payload received"
        );

        if let Ok(prompt) = serde_json::from_slice::<PromptRequest>(&payload) {
            tracing::debug!(
                request_id = %request.request_id,
                prompts = prompt.text_prompts.len(),
                steps = prompt.steps,
                seed = prompt.seed,
                "Prompt request"
            );
        }

        Ok(with_cors(HandlerResponse::text(200, "Success")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayRequest;
    use axum::body::Bytes;
    use std::collections::HashMap;

    fn forwarded(body: &'static [u8], encoded: bool) -> ForwardedRequest {
        ForwardedRequest {
            request: GatewayRequest {
                request_id: "r1".to_string(),
                body: Bytes::from_static(body),
                is_body_base64_encoded: encoded,
                ..Default::default()
            },
            context: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_success_with_cors() {
        let response = PromptHandler
            .handle(forwarded(br#"{"text_prompts":[{"text":"a cat"}],"steps":30}"#, false))
            .await
            .unwrap();

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "Success");
        assert!(!response.is_body_base64_encoded);
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "POST,OPTIONS");
    }

    #[tokio::test]
    async fn test_decodes_base64_body() {
        // "hello"
        let response = PromptHandler.handle(forwarded(b"aGVsbG8=", true)).await.unwrap();
        assert_eq!(response.status_code, 200);
    }

    #[tokio::test]
    async fn test_bad_base64_is_decode_error() {
        let err = PromptHandler.handle(forwarded(b"not base64!", true)).await.unwrap_err();
        assert!(matches!(err, GatewayError::Decode(_)));
    }
}
