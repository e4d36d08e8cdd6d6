//! Core types for the AI portal.
//!
//! This module provides type-safe wrappers for identities, roles and capabilities.

pub mod capabilities;
pub mod email;
pub mod flags;
pub mod id;
pub mod identity;
pub mod role;

pub use capabilities::Capabilities;
pub use email::{Email, EmailError};
pub use flags::{CapabilityFlag, FeatureFlags, UnknownFlag};
pub use id::*;
pub use identity::{AUTHENTICATION_FAILED, Identity, SessionStatus, SessionStatusView};
pub use role::{Role, UnknownRole};
