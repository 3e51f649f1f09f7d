//! Session wrapper keeping handlers free of actix-session specifics.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Newtype exposing domain-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Wrap the underlying actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Record the authenticated user in the session cookie.
    pub fn remember_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0
            .insert(USER_ID_KEY, user_id.as_uuid().to_string())
            .map_err(|err| Error::internal(format!("failed to persist session: {err}")))
    }

    /// Current session user, if any.
    ///
    /// A tampered or unparseable cookie value is treated as an anonymous
    /// session rather than an error.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|err| Error::internal(format!("failed to read session: {err}")))?;
        match raw {
            Some(value) => match Uuid::parse_str(&value) {
                Ok(id) => Ok(Some(UserId::from_uuid(id))),
                Err(err) => {
                    tracing::warn!(error = %err, "invalid user id in session cookie");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
