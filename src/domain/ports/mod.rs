//! Ports: async traits the inbound adapters depend on and the outbound
//! adapters implement, plus in-memory fixtures for tests and
//! database-less runs.

mod course_repository;
mod macros;
mod user_repository;

pub use course_repository::{
    CourseChanges, CourseRepository, CourseRepositoryError, InMemoryCourseRepository, NewCourse,
};
pub use user_repository::{
    InMemoryUserRepository, NewUserAccount, RegisteredUser, UserCredentials, UserRepository,
    UserRepositoryError,
};

#[cfg(test)]
pub use course_repository::MockCourseRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
