//! Domain entities, value types, and ports.
//!
//! Everything here is transport and storage agnostic: HTTP adapters live
//! under `inbound`, Diesel adapters under `outbound`. Types validate their
//! invariants at construction and document their serialisation contracts in
//! each type's Rustdoc.

pub mod auth;
pub mod course;
pub mod error;
pub mod ports;
pub mod user;

pub use self::auth::{AuthToken, CredentialValidationError, LoginCredentials, PASSWORD_MIN};
pub use self::course::{
    Course, CourseId, CourseName, CourseValidationError, Introduction, Price, Teacher,
};
pub use self::error::{Error, ErrorCode};
pub use self::user::{User, UserId, UserValidationError, Username};
