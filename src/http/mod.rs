//! HTTP transport subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum router, request id, tracing, timeout, body limit)
//!     → request.rs (request id, source ip, receive time → GatewayRequest)
//!     → gateway pipeline
//!     → response.rs (HandlerResponse → HTTP response)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
