//! Request sequencing: admission, then authorization, then the handler.

use std::sync::Arc;
use std::time::Instant;

use crate::admission::Admission;
use crate::authz::Authorizer;
use crate::error::GatewayError;
use crate::gateway::contract::{ForwardedRequest, GatewayRequest, HandlerResponse};
use crate::handler::DownstreamHandler;
use crate::observability::metrics;

/// Composes the three stages without any of them knowing about the others.
pub struct Gateway {
    admission: Arc<dyn Admission>,
    authorizer: Authorizer,
    handler: Arc<dyn DownstreamHandler>,
}

impl Gateway {
    pub fn new(
        admission: Arc<dyn Admission>,
        authorizer: Authorizer,
        handler: Arc<dyn DownstreamHandler>,
    ) -> Self {
        Self {
            admission,
            authorizer,
            handler,
        }
    }

    /// Run one request through the pipeline.
    ///
    /// Shed requests never reach the authorizer and are not audited. Denied
    /// requests and failed audit writes never reach the handler.
    pub async fn dispatch(&self, request: GatewayRequest) -> Result<HandlerResponse, GatewayError> {
        if !self.admission.admit(Instant::now()) {
            tracing::warn!(
                request_id = %request.request_id,
                source_ip = %request.source_ip,
                "Admission limit exceeded"
            );
            metrics::record_throttled();
            return Err(GatewayError::Throttled);
        }

        let decision = self.authorizer.authorize(&request).await?;
        if !decision.allowed {
            return Err(GatewayError::Denied);
        }

        tracing::debug!(
            request_id = %request.request_id,
            method = %request.http_method,
            path = %request.path,
            "Forwarding to handler"
        );

        self.handler
            .handle(ForwardedRequest {
                request,
                context: decision.principal_context,
            })
            .await
    }
}
