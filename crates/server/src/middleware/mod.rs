//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (propagate or mint `x-request-id`)
//! 4. Session layer (tower-sessions, in-memory store)
//!
//! Handlers then use the [`PortalSession`] or [`RequireIdentity`] extractors.

pub mod portal;
pub mod request_id;
pub mod session;

pub use portal::{IdentityRejection, Pipeline, PortalSession, RequireIdentity};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
