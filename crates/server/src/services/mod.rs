//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Session resolution (mock directory or identity provider)
//! - `capabilities` - Admin overlays and derived capabilities
//! - `pipeline` - Resolve the session, then build the capability gate
//! - `welcome` - First-visit welcome marker

pub mod auth;
pub mod capabilities;
pub mod pipeline;
pub mod welcome;

pub use auth::{
    AuthBackend, AuthError, AuthStrategy, BrowserContext, MockBackend, MockUser, Navigation,
    ProviderBackend, SessionResolver, UserDirectory,
};
pub use capabilities::{CapabilityGate, GateOutcome};
pub use pipeline::SessionPipeline;
