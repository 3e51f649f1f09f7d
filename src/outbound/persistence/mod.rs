//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports, backed by
//! PostgreSQL via `diesel-async` with `bb8` connection pooling. Adapters
//! stay thin: they translate between Diesel rows and domain types and map
//! database errors to port errors, nothing more. Row structs and schema
//! definitions are internal and never leak to the domain layer.

mod diesel_course_repository;
mod diesel_user_repository;
mod models;
mod pool;
pub(crate) mod schema;

pub use diesel_course_repository::DieselCourseRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
