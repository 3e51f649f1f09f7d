//! Shared helpers for endpoint integration tests.
//!
//! Tests drive the real application assembly (`build_app`) over in-memory
//! stores, so routing, session handling, extractors, and error mapping are
//! all exercised without a database.

#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{test, web};
use serde_json::{Value, json};

use courseboard::inbound::http::health::HealthState;
use courseboard::inbound::http::state::HttpState;
use courseboard::server::AppDependencies;

/// Fresh app dependencies backed by in-memory stores.
pub fn dependencies() -> AppDependencies {
    AppDependencies {
        health_state: web::Data::new(HealthState::new()),
        http_state: web::Data::new(HttpState::in_memory()),
        key: Key::generate(),
        cookie_secure: false,
        same_site: SameSite::Lax,
    }
}

/// Register an account and return the response status and JSON body.
pub async fn register<S, B>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let res = test::call_service(app, req).await;
    let status = res.status();
    (status, test::read_body_json(res).await)
}

/// Register an account and return its API token.
pub async fn register_for_token<S, B>(app: &S, username: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let (status, body) = register(app, username, "correct horse battery").await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
    body["token"].as_str().expect("token string").to_owned()
}

/// Log in and return the session cookie.
pub async fn login_for_cookie<S, B>(
    app: &S,
    username: &str,
    password: &str,
) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let res = test::call_service(app, req).await;
    assert_eq!(res.status(), StatusCode::OK, "login failed");
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Create a course authenticated by API token.
pub async fn create_course<S, B>(
    app: &S,
    token: &str,
    name: &str,
    price: &str,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/courses")
        .insert_header((AUTHORIZATION, format!("Token {token}")))
        .set_json(json!({
            "name": name,
            "introduction": format!("An introduction to {name}."),
            "price": price,
        }))
        .to_request();
    let res = test::call_service(app, req).await;
    let status = res.status();
    (status, test::read_body_json(res).await)
}

/// Fetch a single course by id, authenticated by API token.
pub async fn get_course<S, B>(app: &S, token: &str, id: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
    B::Error: std::fmt::Debug,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/courses/{id}"))
        .insert_header((AUTHORIZATION, format!("Token {token}")))
        .to_request();
    let res = test::call_service(app, req).await;
    let status = res.status();
    (status, test::read_body_json(res).await)
}
