//! Course API handlers.
//!
//! Every endpoint requires an authenticated caller; mutating an existing
//! course additionally requires being its teacher.

use actix_web::{HttpResponse, delete, get, post, route, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::{CourseChanges, CourseRepositoryError, NewCourse};
use crate::domain::{
    Course, CourseId, CourseName, Error, Introduction, Price, Teacher, User,
};
use crate::inbound::http::auth::ActingUser;
use crate::inbound::http::error::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldErrors, field_error};

/// Course as rendered to API clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    /// Stable course identifier.
    pub id: Uuid,
    pub name: String,
    pub introduction: String,
    /// Username of the owning teacher.
    pub teacher: String,
    /// Decimal price with two fractional digits, e.g. `"9.99"`.
    #[schema(example = "9.99")]
    pub price: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        Self {
            id: *course.id.as_uuid(),
            name: course.name.to_string(),
            introduction: course.introduction.as_ref().to_owned(),
            teacher: course.teacher.username.to_string(),
            price: course.price.to_string(),
            created_at: course.created_at.to_rfc3339(),
            updated_at: course.updated_at.to_rfc3339(),
        }
    }
}

/// Price accepted either as a JSON number or a decimal string.
///
/// Documented as a string in the OpenAPI schema; the number form is a
/// convenience for hand-written clients.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(serde_json::Number),
    Text(String),
}

impl PriceField {
    fn parse(&self) -> Result<Price, crate::domain::CourseValidationError> {
        match self {
            Self::Number(number) => Price::parse(&number.to_string()),
            Self::Text(text) => Price::parse(text),
        }
    }
}

/// Body of `POST /api/v1/courses`.
///
/// All fields are optional at the serde level so missing ones surface as
/// field-keyed validation errors rather than a deserialisation failure. A
/// `teacher` field, if supplied, is ignored: ownership always falls to the
/// authenticated caller.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCourseRequest {
    pub name: Option<String>,
    pub introduction: Option<String>,
    #[schema(value_type = Option<String>, example = "9.99")]
    pub price: Option<PriceField>,
    #[serde(default)]
    #[schema(ignore)]
    pub teacher: Option<serde_json::Value>,
}

impl CreateCourseRequest {
    fn into_new_course(self, acting: &User) -> Result<NewCourse, Error> {
        let mut errors = FieldErrors::new();

        let name = match self.name {
            Some(raw) => match CourseName::new(raw) {
                Ok(name) => Some(name),
                Err(err) => {
                    errors.push("name", err.to_string());
                    None
                }
            },
            None => {
                errors.missing("name");
                None
            }
        };
        let introduction = match self.introduction {
            Some(raw) => match Introduction::new(raw) {
                Ok(introduction) => Some(introduction),
                Err(err) => {
                    errors.push("introduction", err.to_string());
                    None
                }
            },
            None => {
                errors.missing("introduction");
                None
            }
        };
        let price = match self.price {
            Some(raw) => match raw.parse() {
                Ok(price) => Some(price),
                Err(err) => {
                    errors.push("price", err.to_string());
                    None
                }
            },
            None => {
                errors.missing("price");
                None
            }
        };

        errors.into_result()?;
        // All three are Some once validation passed.
        let (Some(name), Some(introduction), Some(price)) = (name, introduction, price) else {
            return Err(Error::internal("course validation lost a field"));
        };
        Ok(NewCourse {
            name,
            introduction,
            price,
            teacher: Teacher {
                id: acting.id,
                username: acting.username.clone(),
            },
        })
    }
}

/// Body of `PUT`/`PATCH /api/v1/courses/{id}`.
///
/// Both verbs apply a partial update: absent fields keep their stored
/// values. Matches create in ignoring any supplied `teacher`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCourseRequest {
    pub name: Option<String>,
    pub introduction: Option<String>,
    #[schema(value_type = Option<String>, example = "9.99")]
    pub price: Option<PriceField>,
    #[serde(default)]
    #[schema(ignore)]
    pub teacher: Option<serde_json::Value>,
}

impl UpdateCourseRequest {
    fn into_changes(self) -> Result<CourseChanges, Error> {
        let mut errors = FieldErrors::new();
        let mut changes = CourseChanges::default();

        if let Some(raw) = self.name {
            match CourseName::new(raw) {
                Ok(name) => changes.name = Some(name),
                Err(err) => errors.push("name", err.to_string()),
            }
        }
        if let Some(raw) = self.introduction {
            match Introduction::new(raw) {
                Ok(introduction) => changes.introduction = Some(introduction),
                Err(err) => errors.push("introduction", err.to_string()),
            }
        }
        if let Some(raw) = self.price {
            match raw.parse() {
                Ok(price) => changes.price = Some(price),
                Err(err) => errors.push("price", err.to_string()),
            }
        }

        errors.into_result()?;
        Ok(changes)
    }
}

/// Body of a successful `DELETE /api/v1/courses/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

fn map_course_repo_error(err: CourseRepositoryError) -> Error {
    match err {
        CourseRepositoryError::DuplicateName { name } => field_error(
            "name",
            format!("a course named \"{name}\" already exists"),
        ),
        CourseRepositoryError::NotFound => Error::not_found("course not found"),
        CourseRepositoryError::Connection { .. } | CourseRepositoryError::Query { .. } => {
            Error::internal(format!("course store failure: {err}"))
        }
    }
}

fn parse_course_id(raw: &str) -> Result<CourseId, Error> {
    Uuid::parse_str(raw)
        .map(CourseId::from_uuid)
        .map_err(|_| Error::not_found("course not found"))
}

/// Fetch a course and verify the acting user owns it.
async fn owned_course(
    state: &HttpState,
    id: &CourseId,
    acting: &User,
) -> Result<Course, Error> {
    let course = state
        .courses
        .find_by_id(id)
        .await
        .map_err(map_course_repo_error)?
        .ok_or_else(|| Error::not_found("course not found"))?;
    if !course.is_owned_by(&acting.id) {
        return Err(Error::forbidden("only the course teacher may modify it"));
    }
    Ok(course)
}

/// List all courses, cheapest first.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    responses(
        (status = 200, description = "Courses ordered by ascending price", body = [CourseResponse]),
        (status = 401, description = "Authentication required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "listCourses"
)]
#[get("/api/v1/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    _acting: ActingUser,
) -> ApiResult<HttpResponse> {
    let courses = state.courses.list().await.map_err(map_course_repo_error)?;
    let body: Vec<CourseResponse> = courses.into_iter().map(CourseResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Create a course owned by the authenticated caller.
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation failed", body = Error),
        (status = 401, description = "Authentication required", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "createCourse"
)]
#[post("/api/v1/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    acting: ActingUser,
    body: web::Json<CreateCourseRequest>,
) -> ApiResult<HttpResponse> {
    let new_course = body.into_inner().into_new_course(acting.user())?;
    let course = state
        .courses
        .create(new_course)
        .await
        .map_err(map_course_repo_error)?;
    info!(course_id = %course.id, teacher = %course.teacher.username, "course created");
    Ok(HttpResponse::Created().json(CourseResponse::from(course)))
}

/// Fetch a single course.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course", body = CourseResponse),
        (status = 401, description = "Authentication required", body = Error),
        (status = 404, description = "Course not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "getCourse"
)]
#[get("/api/v1/courses/{id}")]
pub async fn get_course(
    state: web::Data<HttpState>,
    _acting: ActingUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_course_id(&path)?;
    let course = state
        .courses
        .find_by_id(&id)
        .await
        .map_err(map_course_repo_error)?
        .ok_or_else(|| Error::not_found("course not found"))?;
    Ok(HttpResponse::Ok().json(CourseResponse::from(course)))
}

/// Partially update a course. `PUT` and `PATCH` behave identically.
#[utoipa::path(
    put,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course identifier")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 400, description = "Validation failed", body = Error),
        (status = 401, description = "Authentication required", body = Error),
        (status = 403, description = "Caller does not own the course", body = Error),
        (status = 404, description = "Course not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "updateCourse"
)]
#[route("/api/v1/courses/{id}", method = "PUT", method = "PATCH")]
pub async fn update_course(
    state: web::Data<HttpState>,
    acting: ActingUser,
    path: web::Path<String>,
    body: web::Json<UpdateCourseRequest>,
) -> ApiResult<HttpResponse> {
    let id = parse_course_id(&path)?;
    // Existence and ownership are settled before the body is validated, so
    // an unknown id reads as 404 even when the body is bad.
    owned_course(&state, &id, acting.user()).await?;
    let changes = body.into_inner().into_changes()?;

    let course = state
        .courses
        .update(&id, changes)
        .await
        .map_err(map_course_repo_error)?;
    info!(course_id = %course.id, "course updated");
    Ok(HttpResponse::Ok().json(CourseResponse::from(course)))
}

/// Delete a course owned by the authenticated caller.
#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(("id" = Uuid, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course deleted", body = DeleteResponse),
        (status = 401, description = "Authentication required", body = Error),
        (status = 403, description = "Caller does not own the course", body = Error),
        (status = 404, description = "Course not found", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["courses"],
    operation_id = "deleteCourse"
)]
#[delete("/api/v1/courses/{id}")]
pub async fn delete_course(
    state: web::Data<HttpState>,
    acting: ActingUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_course_id(&path)?;
    let course = owned_course(&state, &id, acting.user()).await?;

    state
        .courses
        .delete(&id)
        .await
        .map_err(map_course_repo_error)?;
    info!(course_id = %id, "course deleted");
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("course \"{}\" deleted", course.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockCourseRepository;
    use crate::domain::{UserId, Username};
    use chrono::Utc;
    use rstest::rstest;
    use std::sync::Arc;

    fn acting_user(name: &str) -> User {
        User {
            id: UserId::random(),
            username: Username::new(name).expect("username"),
            created_at: Utc::now(),
        }
    }

    fn sample_course(owner: &User) -> Course {
        Course {
            id: CourseId::random(),
            name: CourseName::new("Algebra").expect("name"),
            introduction: Introduction::new("From groups to rings.").expect("introduction"),
            teacher: Teacher {
                id: owner.id,
                username: owner.username.clone(),
            },
            price: Price::parse("9.99").expect("price"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    fn create_request_collects_all_field_failures() {
        let request = CreateCourseRequest {
            name: None,
            introduction: Some(String::new()),
            price: Some(PriceField::Text("minus five".into())),
            teacher: None,
        };

        let err = request
            .into_new_course(&acting_user("alice"))
            .expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert!(details.get("name").is_some());
        assert!(details.get("introduction").is_some());
        assert!(details.get("price").is_some());
    }

    #[rstest]
    fn create_request_assigns_the_acting_user_as_teacher() {
        let alice = acting_user("alice");
        let request = CreateCourseRequest {
            name: Some("Algebra".into()),
            introduction: Some("From groups to rings.".into()),
            price: Some(PriceField::Number(serde_json::Number::from(10))),
            teacher: Some(serde_json::json!("mallory")),
        };

        let new_course = request.into_new_course(&alice).expect("valid");
        assert_eq!(new_course.teacher.id, alice.id);
        assert_eq!(new_course.teacher.username, alice.username);
        assert_eq!(new_course.price.minor_units(), 1000);
    }

    #[rstest]
    fn update_request_with_no_fields_is_an_empty_change() {
        let request = UpdateCourseRequest {
            name: None,
            introduction: None,
            price: None,
            teacher: None,
        };
        let changes = request.into_changes().expect("valid");
        assert!(changes.is_empty());
    }

    #[rstest]
    #[case(PriceField::Text("9.99".into()), 999)]
    #[case(PriceField::Number(serde_json::Number::from(15)), 1500)]
    fn price_field_accepts_strings_and_numbers(#[case] field: PriceField, #[case] cents: i64) {
        assert_eq!(field.parse().expect("valid").minor_units(), cents);
    }

    #[rstest]
    fn unparseable_course_ids_read_as_not_found() {
        let err = parse_course_id("not-a-uuid").expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn ownership_check_rejects_non_owners() {
        let alice = acting_user("alice");
        let course = sample_course(&alice);
        let course_id = course.id;

        let mut courses = MockCourseRepository::new();
        courses
            .expect_find_by_id()
            .returning(move |_| Ok(Some(course.clone())));
        let state = HttpState::new(Arc::new(courses), Arc::new(
            crate::domain::ports::InMemoryUserRepository::new(),
        ));

        let bob = acting_user("bob");
        let err = owned_course(&state, &course_id, &bob)
            .await
            .expect_err("not the owner");
        assert_eq!(err.code(), ErrorCode::Forbidden);

        let ok = owned_course(&state, &course_id, &alice).await.expect("owner");
        assert_eq!(ok.id, course_id);
    }

    #[actix_web::test]
    async fn store_failures_surface_as_internal_errors() {
        use actix_web::http::header::AUTHORIZATION;
        use actix_web::{App, http::StatusCode, test};

        use crate::domain::AuthToken;
        use crate::domain::ports::{
            InMemoryUserRepository, NewUserAccount, UserRepository as _,
        };

        let mut courses = MockCourseRepository::new();
        courses
            .expect_list()
            .returning(|| Err(CourseRepositoryError::connection("refused")));

        let users = InMemoryUserRepository::new();
        let token = AuthToken::generate();
        users
            .create(NewUserAccount {
                username: Username::new("alice").expect("username"),
                password_hash: "$argon2id$fixture".to_owned(),
                token: token.clone(),
            })
            .await
            .expect("registered");

        let state = web::Data::new(HttpState::new(Arc::new(courses), Arc::new(users)));
        let app = test::init_service(App::new().app_data(state).service(list_courses)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/courses")
                .insert_header((AUTHORIZATION, format!("Token {token}")))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "internal server error");
    }
}
