//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the generated OpenAPI specification for the REST
//! API: all course and user endpoints, the error schema, and the two
//! authentication schemes (session cookie and API token header). Swagger UI
//! serves the document at `/docs` in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::courses::{
    CourseResponse, CreateCourseRequest, DeleteResponse, UpdateCourseRequest,
};
use crate::inbound::http::users::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

/// Enrich the generated document with both authentication schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
        components.add_security_scheme(
            "ApiToken",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "`Token <key>` using the API token issued at registration.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Courseboard API",
        description = "CRUD interface for courses with ownership-based write permission."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = []), ("ApiToken" = [])),
    paths(
        crate::inbound::http::users::register_user,
        crate::inbound::http::users::login,
        crate::inbound::http::courses::list_courses,
        crate::inbound::http::courses::create_course,
        crate::inbound::http::courses::get_course,
        crate::inbound::http::courses::update_course,
        crate::inbound::http::courses::delete_course,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        CourseResponse,
        CreateCourseRequest,
        UpdateCourseRequest,
        DeleteResponse,
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        LoginResponse,
    )),
    tags(
        (name = "users", description = "Registration and authentication"),
        (name = "courses", description = "Course catalogue operations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
