//! Acting-user resolution for authenticated endpoints.
//!
//! Two credential schemes are accepted: an
//! `Authorization: Token <key>` (or `Bearer <key>`) header carrying the API
//! token issued at registration, or the session cookie established by
//! `POST /api/v1/login`. The header wins when both are present.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::ports::UserRepositoryError;
use crate::domain::{AuthToken, Error, User};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// The authenticated caller of the current request.
///
/// Extracting this rejects unauthenticated requests with 401 before the
/// handler body runs; ownership checks happen later, in the handler.
#[derive(Debug, Clone)]
pub struct ActingUser(pub User);

impl ActingUser {
    /// The authenticated user.
    pub fn user(&self) -> &User {
        &self.0
    }
}

fn map_user_repo_error(err: UserRepositoryError) -> Error {
    Error::internal(format!("user lookup failed: {err}"))
}

/// Pull a token out of the `Authorization` header, if one is present.
///
/// Returns `Err` for a header that is present but not in a recognised
/// `Token <key>` / `Bearer <key>` shape.
fn header_token(req: &HttpRequest) -> Result<Option<AuthToken>, Error> {
    let Some(value) = req.headers().get(AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| Error::unauthorized("malformed authorization header"))?;
    let (scheme, key) = raw
        .split_once(' ')
        .ok_or_else(|| Error::unauthorized("malformed authorization header"))?;
    if !scheme.eq_ignore_ascii_case("token") && !scheme.eq_ignore_ascii_case("bearer") {
        return Err(Error::unauthorized("unsupported authorization scheme"));
    }
    let token = AuthToken::parse(key.trim()).map_err(|_| Error::unauthorized("invalid token"))?;
    Ok(Some(token))
}

async fn resolve_token(
    state: &HttpState,
    token: AuthToken,
) -> Result<ActingUser, Error> {
    let user = state
        .users
        .find_by_token(&token)
        .await
        .map_err(map_user_repo_error)?;
    user.map(ActingUser)
        .ok_or_else(|| Error::unauthorized("invalid token"))
}

async fn resolve_session(
    state: &HttpState,
    session: SessionContext,
) -> Result<ActingUser, Error> {
    let user_id = session
        .user_id()?
        .ok_or_else(|| Error::unauthorized("login required"))?;
    let user = state
        .users
        .find_by_id(&user_id)
        .await
        .map_err(map_user_repo_error)?;
    // A session naming an unknown user means the account was deleted.
    user.map(ActingUser)
        .ok_or_else(|| Error::unauthorized("login required"))
}

impl FromRequest for ActingUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = header_token(req);
        let session_fut = SessionContext::from_request(req, payload);

        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("http state is not configured"))?;
            if let Some(token) = token? {
                return resolve_token(&state, token).await;
            }
            let session = session_fut.await.map_err(Error::from)?;
            resolve_session(&state, session).await
        })
    }
}
