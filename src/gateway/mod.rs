//! Gateway contract and sequencing.
//!
//! # Data Flow
//! ```text
//! GatewayRequest
//!     → Admission::admit      (shed → Throttled)
//!     → Authorizer::authorize (audit, then verify → Decision)
//!     → ForwardedRequest { request, context }
//!     → DownstreamHandler::handle
//!     → HandlerResponse
//! ```

pub mod contract;
pub mod pipeline;

pub use contract::{Decision, ForwardedRequest, GatewayRequest, HandlerResponse};
pub use pipeline::Gateway;
