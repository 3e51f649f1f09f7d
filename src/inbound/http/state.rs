//! Shared HTTP adapter state.
//!
//! Handlers receive this bundle via `actix_web::web::Data`, so they depend
//! only on domain ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CourseRepository, InMemoryCourseRepository, InMemoryUserRepository, UserRepository,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub courses: Arc<dyn CourseRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl HttpState {
    /// Construct state from explicit port implementations.
    pub fn new(courses: Arc<dyn CourseRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { courses, users }
    }

    /// State backed by in-memory stores, for tests and database-less runs.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryCourseRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        )
    }
}
