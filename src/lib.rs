//! Audited authorization gateway.
//!
//! Every inbound request passes admission control, then an authorizer that
//! writes an audit record before deciding, and only then reaches the
//! downstream handler.

pub mod admin;
pub mod admission;
pub mod audit;
pub mod authz;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use gateway::Gateway;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
