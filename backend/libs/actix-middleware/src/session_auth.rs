//! Cookie session authentication
//!
//! Reads the session token from the `auth_session` cookie and asks a
//! [`SessionValidator`] what it belongs to. Requests without a cookie pass
//! through anonymously. A valid session puts a [`SessionUser`] into the
//! request extensions; a session that was just extended gets its cookie
//! re-issued, and an unknown or expired token gets a blank cookie so the
//! browser drops it.

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::StatusCode,
    Error, HttpMessage, HttpResponse,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "auth_session";

/// A session the validator accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSession {
    pub session_id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    /// The expiry was pushed forward during this validation
    pub fresh: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("session lookup failed: {0}")]
pub struct SessionLookupError(pub String);

/// Resolves an opaque session token.
///
/// `Ok(None)` means the token is unknown or expired.
#[async_trait]
pub trait SessionValidator: Send + Sync + 'static {
    async fn validate_session(
        &self,
        token: &str,
    ) -> Result<Option<ValidatedSession>, SessionLookupError>;
}

/// Session cookie attributes
#[derive(Debug, Clone)]
pub struct SessionCookieConfig {
    pub name: String,
    pub secure: bool,
}

impl SessionCookieConfig {
    pub fn new(secure: bool) -> Self {
        Self {
            name: SESSION_COOKIE_NAME.to_string(),
            secure,
        }
    }

    pub fn session_cookie(&self, token: &str, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let max_age = (expires_at - Utc::now()).num_seconds().max(0);
        Cookie::build(self.name.clone(), token.to_string())
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::seconds(max_age))
            .finish()
    }

    pub fn blank_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.name.clone(), String::new())
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(CookieDuration::ZERO)
            .finish()
    }
}

/// Authenticated caller, available to handlers as an extractor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub session_id: String,
}

pub(crate) fn json_error(status: StatusCode, message: &'static str) -> Error {
    InternalError::from_response(
        message,
        HttpResponse::build(status).json(serde_json::json!({ "error": message })),
    )
    .into()
}

impl actix_web::FromRequest for SessionUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<SessionUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(json_error(StatusCode::UNAUTHORIZED, "Unauthorized"))),
        }
    }
}

/// Session authentication middleware
#[derive(Clone)]
pub struct SessionAuth {
    validator: Arc<dyn SessionValidator>,
    cookies: SessionCookieConfig,
}

impl SessionAuth {
    pub fn new(validator: Arc<dyn SessionValidator>, cookies: SessionCookieConfig) -> Self {
        Self { validator, cookies }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthService {
            service: Rc::new(service),
            validator: self.validator.clone(),
            cookies: self.cookies.clone(),
        }))
    }
}

pub struct SessionAuthService<S> {
    service: Rc<S>,
    validator: Arc<dyn SessionValidator>,
    cookies: SessionCookieConfig,
}

impl<S, B> Service<ServiceRequest> for SessionAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let validator = self.validator.clone();
        let cookies = self.cookies.clone();

        let token = req
            .cookie(&cookies.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        Box::pin(async move {
            let Some(token) = token else {
                return service.call(req).await;
            };

            let validation = validator.validate_session(&token).await.map_err(|e| {
                tracing::error!(error = %e, "Session validation failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            })?;

            let reissue = match &validation {
                Some(session) if session.fresh => {
                    Some(cookies.session_cookie(&token, session.expires_at))
                }
                Some(_) => None,
                None => Some(cookies.blank_cookie()),
            };

            if let Some(session) = validation {
                req.extensions_mut().insert(SessionUser {
                    user_id: session.user_id,
                    session_id: session.session_id,
                });
            }

            let mut res = service.call(req).await?;

            // Handlers that log in or out set the cookie themselves.
            let handler_set_cookie = res
                .response()
                .cookies()
                .any(|c| c.name() == cookies.name);

            if let Some(cookie) = reissue.filter(|_| !handler_set_cookie) {
                if let Err(e) = res.response_mut().add_cookie(&cookie) {
                    tracing::warn!(error = %e, "Failed to attach session cookie");
                }
            }

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_cookie_attributes() {
        let config = SessionCookieConfig::new(true);
        let cookie = config.session_cookie("token-value", Utc::now() + Duration::days(30));

        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "token-value");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        let max_age = cookie.max_age().map(|d| d.whole_days()).unwrap_or_default();
        assert!((29..=30).contains(&max_age));
    }

    #[test]
    fn test_blank_cookie_expires_immediately() {
        let cookie = SessionCookieConfig::new(false).blank_cookie();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
        assert_eq!(cookie.secure(), Some(false));
    }

    #[test]
    fn test_past_expiry_clamps_to_zero() {
        let cookie = SessionCookieConfig::new(false)
            .session_cookie("t", Utc::now() - Duration::hours(1));
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
