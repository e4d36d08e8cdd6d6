//! JSON API consumed by the portal front end.

pub mod flags;
pub mod session;
pub mod welcome;
