//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing response:
//!     → headers.rs (add hardening headers)
//! Incoming request:
//!     → body size limit (tower-http, configured in http::server)
//! ```

pub mod headers;
