//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the gateway pipeline from configuration
//! - Create the Axum router and wire middleware (request id, tracing, limits)
//! - Serve until shutdown, applying admission limit changes on reload
//! - Start the admin API when enabled

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderName, HeaderValue, Request},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetRequestHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use uuid::Uuid;

use crate::admin::{self, AdminState};
use crate::admission::{Admission, TokenBucket, Unlimited};
use crate::audit::{self, AuditStore, StoreError};
use crate::authz::{verifier, Authorizer};
use crate::config::{AdmissionConfig, GatewayConfig};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::handler;
use crate::http::request::{into_gateway_request, TransportOptions, X_REQUEST_ID};
use crate::observability::metrics;

/// Application state injected into the gateway handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub transport: TransportOptions,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    bucket: Arc<TokenBucket>,
    store: Arc<dyn AuditStore>,
}

impl HttpServer {
    /// Open the configured audit store and build the server.
    pub async fn new(config: GatewayConfig) -> Result<Self, StoreError> {
        let store = audit::open_store(&config.audit).await?;
        Ok(Self::with_store(config, store))
    }

    /// Build the server around an existing audit store.
    pub fn with_store(config: GatewayConfig, store: Arc<dyn AuditStore>) -> Self {
        let bucket = Arc::new(TokenBucket::from_config(&config.admission));
        let admission: Arc<dyn Admission> = if config.admission.enabled {
            bucket.clone() as Arc<dyn Admission>
        } else {
            tracing::warn!("Admission control disabled");
            Arc::new(Unlimited)
        };

        let authorizer = Authorizer::new(
            store.clone(),
            verifier::from_config(&config.authz),
            Duration::from_millis(config.audit.write_timeout_ms),
        );
        let gateway = Arc::new(Gateway::new(
            admission,
            authorizer,
            handler::from_config(&config),
        ));

        let state = AppState {
            gateway,
            transport: TransportOptions {
                trust_forwarded_for: config.listener.trust_forwarded_for,
                max_body_size: config.security.max_body_size,
            },
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            bucket,
            store,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.listener.trust_request_id {
            return router;
        }
        // The request id keys the audit record, so callers never choose it.
        router.layer(SetRequestHeaderLayer::overriding(
            HeaderName::from_static(X_REQUEST_ID),
            assign_request_id,
        ))
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Admission sections received on `admission_updates` reconfigure the
    /// bucket in place.
    pub async fn run(
        self,
        listener: TcpListener,
        mut admission_updates: mpsc::UnboundedReceiver<AdmissionConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            audit_table = %self.store.table(),
            "HTTP server starting"
        );

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_router = admin::setup_admin_router(AdminState {
                store: self.store.clone(),
                bucket: self.bucket.clone(),
                api_key: self.config.admin.api_key.clone(),
            });
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %self.config.admin.bind_address, "Admin API starting");
            tokio::spawn(async move {
                let result = axum::serve(admin_listener, admin_router)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin API failed");
                }
            });
        }

        let bucket = self.bucket.clone();
        let mut current = self.config.admission.clone();
        tokio::spawn(async move {
            while let Some(admission) = admission_updates.recv().await {
                apply_reload(&bucket, &current, &admission);
                current = admission;
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn assign_request_id(_request: &Request<Body>) -> Option<HeaderValue> {
    HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()
}

fn apply_reload(bucket: &TokenBucket, old: &AdmissionConfig, new: &AdmissionConfig) {
    if old.burst_capacity != new.burst_capacity || old.sustained_rate != new.sustained_rate {
        bucket.reconfigure(new.burst_capacity, new.sustained_rate);
    }
    if old.enabled != new.enabled {
        tracing::warn!("admission.enabled changed; takes effect on restart");
    }
}

/// Entry point for every inbound request.
async fn gateway_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();

    let gateway_request = match into_gateway_request(request, peer, state.transport).await {
        Ok(r) => r,
        Err(status) => {
            metrics::record_request(&method, status.as_u16(), start);
            return status.into_response();
        }
    };
    let request_id = gateway_request.request_id.clone();

    let response = match state.gateway.dispatch(gateway_request).await {
        Ok(handler_response) => handler_response.into_response(),
        Err(e) => {
            match &e {
                GatewayError::Throttled | GatewayError::AuditWrite(_) => {}
                _ => tracing::info!(request_id = %request_id, error = %e, "Request refused"),
            }
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reload_reconfigures_bucket() {
        let current = AdmissionConfig::default();
        let bucket = TokenBucket::from_config(&current);

        let mut new = current.clone();
        new.burst_capacity = 3;
        apply_reload(&bucket, &current, &new);

        assert_eq!(bucket.snapshot().burst_capacity, 3);
    }
}
