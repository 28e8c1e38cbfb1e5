//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! Ctrl+C
//!     → Shutdown::trigger
//!     → gateway listener and admin API stop accepting, drain, exit
//! ```
//!
//! Audit writes already in flight run on their own tasks and are not cut
//! short by a request being dropped during drain.

pub mod shutdown;

pub use shutdown::Shutdown;
