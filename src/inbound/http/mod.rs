//! Inbound HTTP adapter: handlers, extractors, and error mapping.

pub mod auth;
pub mod courses;
pub mod error;
pub mod health;
pub mod session;
pub mod state;
pub mod users;
pub(crate) mod validation;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use error::ApiResult;
