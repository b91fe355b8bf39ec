//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware chain)
//!     → request.rs (request ID, tracing span)
//!     → dispatch.rs (matched module route: context, deadline, errors)
//!       or introspection endpoint
//!       or fallback (JSON 404 under the prefix, static page elsewhere)
//!     → envelope.rs (merge standard fields into JSON objects)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod envelope;
pub mod request;
pub mod response;
pub mod server;

pub use envelope::Envelope;
pub use request::{RequestIdMaker, X_REQUEST_ID};
pub use response::{ApiError, ErrorCode, ErrorResponder};
pub use server::{AppState, HttpServer};
