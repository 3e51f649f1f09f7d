//! Port for course persistence.
//!
//! Adapters provide durable storage with a uniqueness constraint on the
//! course name and default ordering by ascending price. Ownership checks do
//! not live here; handlers fetch the record and compare teachers before
//! calling a mutating operation.

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::course::{Course, CourseId, CourseName, Introduction, Price, Teacher};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by course repository adapters.
    pub enum CourseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "course store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "course store query failed: {message}",
        /// The unique constraint on the course name was violated.
        DuplicateName { name: String } =>
            "a course named \"{name}\" already exists",
        /// No course exists with the requested id.
        NotFound => "course not found",
    }
}

/// Fields required to create a course.
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub name: CourseName,
    pub introduction: Introduction,
    pub price: Price,
    /// Acting user; always becomes the owner regardless of request input.
    pub teacher: Teacher,
}

/// Partial update: `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub name: Option<CourseName>,
    pub introduction: Option<Introduction>,
    pub price: Option<Price>,
}

impl CourseChanges {
    /// Whether the update carries no field changes at all.
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.introduction.is_none() && self.price.is_none()
    }
}

/// Port for course storage and retrieval.
///
/// Every mutating operation refreshes `updated_at`; `created_at` is set once
/// on insert and never touched again.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// All courses, ordered by ascending price.
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Insert a new course and return the stored record.
    ///
    /// Fails with [`CourseRepositoryError::DuplicateName`] when another
    /// course already uses the name.
    async fn create(&self, new_course: NewCourse) -> Result<Course, CourseRepositoryError>;

    /// Fetch one course, or `None` when the id is unknown.
    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError>;

    /// Apply a partial update and return the refreshed record.
    ///
    /// Fails with [`CourseRepositoryError::NotFound`] when the id is unknown
    /// and [`CourseRepositoryError::DuplicateName`] when a renamed course
    /// collides with an existing name.
    async fn update(
        &self,
        id: &CourseId,
        changes: CourseChanges,
    ) -> Result<Course, CourseRepositoryError>;

    /// Remove a course. Fails with [`CourseRepositoryError::NotFound`] when
    /// the id is unknown.
    async fn delete(&self, id: &CourseId) -> Result<(), CourseRepositoryError>;
}

/// In-memory implementation backing tests and database-less development runs.
///
/// Mirrors the store semantics the Diesel adapter relies on: name
/// uniqueness, price-ascending listing, and `updated_at` refresh on mutation.
#[derive(Debug, Default)]
pub struct InMemoryCourseRepository {
    courses: std::sync::Mutex<Vec<Course>>,
}

impl InMemoryCourseRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Course>>, CourseRepositoryError> {
        self.courses
            .lock()
            .map_err(|_| CourseRepositoryError::query("course store mutex poisoned"))
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut courses = self.lock()?.clone();
        courses.sort_by_key(|course| course.price.minor_units());
        Ok(courses)
    }

    async fn create(&self, new_course: NewCourse) -> Result<Course, CourseRepositoryError> {
        let mut courses = self.lock()?;
        if courses
            .iter()
            .any(|course| course.name.as_ref() == new_course.name.as_ref())
        {
            return Err(CourseRepositoryError::duplicate_name(
                new_course.name.as_ref(),
            ));
        }

        let now = Utc::now();
        let course = Course {
            id: CourseId::random(),
            name: new_course.name,
            introduction: new_course.introduction,
            teacher: new_course.teacher,
            price: new_course.price,
            created_at: now,
            updated_at: now,
        };
        courses.push(course.clone());
        Ok(course)
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        let courses = self.lock()?;
        Ok(courses.iter().find(|course| course.id == *id).cloned())
    }

    async fn update(
        &self,
        id: &CourseId,
        changes: CourseChanges,
    ) -> Result<Course, CourseRepositoryError> {
        let mut courses = self.lock()?;

        if let Some(name) = &changes.name {
            if courses
                .iter()
                .any(|course| course.id != *id && course.name.as_ref() == name.as_ref())
            {
                return Err(CourseRepositoryError::duplicate_name(name.as_ref()));
            }
        }

        let course = courses
            .iter_mut()
            .find(|course| course.id == *id)
            .ok_or_else(CourseRepositoryError::not_found)?;

        if let Some(name) = changes.name {
            course.name = name;
        }
        if let Some(introduction) = changes.introduction {
            course.introduction = introduction;
        }
        if let Some(price) = changes.price {
            course.price = price;
        }
        course.updated_at = Utc::now();
        Ok(course.clone())
    }

    async fn delete(&self, id: &CourseId) -> Result<(), CourseRepositoryError> {
        let mut courses = self.lock()?;
        let before = courses.len();
        courses.retain(|course| course.id != *id);
        if courses.len() == before {
            return Err(CourseRepositoryError::not_found());
        }
        Ok(())
    }
}
