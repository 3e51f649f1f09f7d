//! PostgreSQL-backed `CourseRepository` implementation using Diesel ORM.
//!
//! A thin adapter: translates between Diesel rows and domain course types,
//! leaving the uniqueness constraint and ordering to the database.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{CourseChanges, CourseRepository, CourseRepositoryError, NewCourse};
use crate::domain::{Course, CourseId, CourseName, Introduction, Price, Teacher, UserId, Username};

use super::models::{CourseChangesetRow, CourseRow, NewCourseRow};
use super::pool::{DbPool, PoolError};
use super::schema::{courses, users};

/// Diesel-backed implementation of the `CourseRepository` port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CourseRepositoryError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            CourseRepositoryError::connection(message)
        }
    }
}

fn map_diesel_error(error: diesel::result::Error) -> CourseRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => CourseRepositoryError::query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            CourseRepositoryError::connection("database connection error")
        }
        _ => CourseRepositoryError::query("database error"),
    }
}

/// Map a write failure, promoting unique-constraint violations on the
/// course name to [`CourseRepositoryError::DuplicateName`].
fn map_write_error(error: diesel::result::Error, name: &str) -> CourseRepositoryError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    if matches!(
        &error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    ) {
        return CourseRepositoryError::duplicate_name(name);
    }
    map_diesel_error(error)
}

/// Convert a joined database row to a domain course.
///
/// Stored values already passed validation on the way in, so a failure here
/// means the row was modified outside the application.
fn row_to_course(row: CourseRow, username: String) -> Result<Course, CourseRepositoryError> {
    let invalid = |what: &str| CourseRepositoryError::query(format!("stored {what} is invalid"));

    Ok(Course {
        id: CourseId::from_uuid(row.id),
        name: CourseName::new(row.name).map_err(|_| invalid("course name"))?,
        introduction: Introduction::new(row.introduction)
            .map_err(|_| invalid("course introduction"))?,
        teacher: Teacher {
            id: UserId::from_uuid(row.teacher_id),
            username: Username::new(username).map_err(|_| invalid("teacher username"))?,
        },
        price: Price::from_minor_units(row.price_cents).map_err(|_| invalid("course price"))?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn list(&self) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<(CourseRow, String)> = courses::table
            .inner_join(users::table)
            .order(courses::price_cents.asc())
            .select((CourseRow::as_select(), users::username))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter()
            .map(|(row, username)| row_to_course(row, username))
            .collect()
    }

    async fn create(&self, new_course: NewCourse) -> Result<Course, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let row = NewCourseRow {
            id,
            name: new_course.name.as_ref(),
            introduction: new_course.introduction.as_ref(),
            teacher_id: *new_course.teacher.id.as_uuid(),
            price_cents: new_course.price.minor_units(),
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(courses::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map_err(|err| map_write_error(err, new_course.name.as_ref()))?;

        Ok(Course {
            id: CourseId::from_uuid(id),
            name: new_course.name,
            introduction: new_course.introduction,
            teacher: new_course.teacher,
            price: new_course.price,
            created_at: now,
            updated_at: now,
        })
    }

    async fn find_by_id(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<(CourseRow, String)> = courses::table
            .inner_join(users::table)
            .filter(courses::id.eq(id.as_uuid()))
            .select((CourseRow::as_select(), users::username))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(|(row, username)| row_to_course(row, username))
            .transpose()
    }

    async fn update(
        &self,
        id: &CourseId,
        changes: CourseChanges,
    ) -> Result<Course, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let changeset = CourseChangesetRow {
            name: changes.name.as_ref().map(AsRef::as_ref),
            introduction: changes.introduction.as_ref().map(AsRef::as_ref),
            price_cents: changes.price.map(|price| price.minor_units()),
            updated_at: Utc::now(),
        };
        let attempted_name = changeset.name.unwrap_or_default().to_owned();

        let row: Option<CourseRow> = diesel::update(courses::table.find(id.as_uuid()))
            .set(&changeset)
            .returning(CourseRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(|err| map_write_error(err, &attempted_name))?;
        let row = row.ok_or_else(CourseRepositoryError::not_found)?;

        let username: String = users::table
            .find(row.teacher_id)
            .select(users::username)
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_course(row, username)
    }

    async fn delete(&self, id: &CourseId) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(courses::table.find(id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if deleted == 0 {
            return Err(CourseRepositoryError::not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let err = map_pool_error(PoolError::checkout("connection refused"));
        assert!(matches!(err, CourseRepositoryError::Connection { .. }));
        assert!(err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn unique_violations_map_to_duplicate_name() {
        let diesel_err = diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );
        let err = map_write_error(diesel_err, "Algebra");
        assert!(
            matches!(err, CourseRepositoryError::DuplicateName { ref name } if name == "Algebra")
        );
    }

    #[rstest]
    fn other_write_errors_pass_through_as_query_errors() {
        let err = map_write_error(diesel::result::Error::NotFound, "Algebra");
        assert!(matches!(err, CourseRepositoryError::Query { .. }));
    }

    #[rstest]
    fn valid_rows_convert_to_domain_courses() {
        let now = Utc::now();
        let row = CourseRow {
            id: Uuid::new_v4(),
            name: "Algebra".to_owned(),
            introduction: "From groups to rings.".to_owned(),
            teacher_id: Uuid::new_v4(),
            price_cents: 999,
            created_at: now,
            updated_at: now,
        };

        let course = row_to_course(row, "alice".to_owned()).expect("valid row");
        assert_eq!(course.price.minor_units(), 999);
        assert_eq!(course.teacher.username.as_ref(), "alice");
    }

    #[rstest]
    fn corrupt_rows_surface_as_query_errors() {
        let now = Utc::now();
        let row = CourseRow {
            id: Uuid::new_v4(),
            name: String::new(),
            introduction: "intro".to_owned(),
            teacher_id: Uuid::new_v4(),
            price_cents: 999,
            created_at: now,
            updated_at: now,
        };

        let err = row_to_course(row, "alice".to_owned()).expect_err("blank name");
        assert!(matches!(err, CourseRepositoryError::Query { .. }));
    }
}
