/// Sign-up, sign-in, sign-out and the Google OAuth round trip
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    http::header,
    web, HttpRequest, HttpResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::requests::{LoginRequest, SignupRequest};
use crate::error::{AppError, Result};
use crate::metrics;
use crate::security::tokens::{code_challenge, generate_code_verifier, generate_oauth_state};
use crate::services::{AccountService, SessionService};
use crate::AppState;
use actix_middleware::SessionUser;

pub const OAUTH_STATE_COOKIE: &str = "google_oauth_state";
pub const CODE_VERIFIER_COOKIE: &str = "google_code_verifier";
const OAUTH_COOKIE_MAX_AGE_MINUTES: i64 = 10;

fn redirect(location: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, location));
    builder
}

/// Open a session for the user and send them home with the cookie set.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<HttpResponse> {
    let (token, session) = SessionService::new(state.db.clone())
        .create_session(user_id)
        .await?;

    Ok(redirect("/")
        .cookie(state.cookies.session_cookie(&token, session.expires_at))
        .finish())
}

fn oauth_cookie(state: &AppState, name: &str, value: String) -> Cookie<'static> {
    Cookie::build(name.to_string(), value)
        .path("/")
        .http_only(true)
        .secure(state.cookies.secure)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::minutes(OAUTH_COOKIE_MAX_AGE_MINUTES))
        .finish()
}

fn expired_cookie(name: &str) -> Cookie<'static> {
    Cookie::build(name.to_string(), String::new())
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish()
}

pub async fn signup(
    state: web::Data<AppState>,
    body: web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    let user = AccountService::new(state.db.clone(), state.chat.clone())
        .signup(body.into_inner())
        .await?;

    start_session(&state, user.id).await
}

pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let user = AccountService::new(state.db.clone(), state.chat.clone())
        .login(body.into_inner())
        .await?;

    metrics::record_login("password");
    start_session(&state, user.id).await
}

pub async fn logout(state: web::Data<AppState>, user: SessionUser) -> Result<HttpResponse> {
    SessionService::new(state.db.clone())
        .invalidate(&user.session_id)
        .await?;

    tracing::info!(user_id = %user.user_id, "User logged out");
    Ok(redirect("/login").cookie(state.cookies.blank_cookie()).finish())
}

pub async fn google_start(state: web::Data<AppState>) -> HttpResponse {
    let oauth_state = generate_oauth_state();
    let verifier = generate_code_verifier();
    let url = state
        .google
        .authorization_url(&oauth_state, &code_challenge(&verifier));

    redirect(&url)
        .cookie(oauth_cookie(&state, OAUTH_STATE_COOKIE, oauth_state))
        .cookie(oauth_cookie(&state, CODE_VERIFIER_COOKIE, verifier))
        .finish()
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

pub async fn google_callback(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<GoogleCallbackQuery>,
) -> Result<HttpResponse> {
    let stored_state = req.cookie(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let verifier = req.cookie(CODE_VERIFIER_COOKIE).map(|c| c.value().to_string());

    let (code, verifier) = match (&query.code, &query.state, stored_state, verifier) {
        (Some(code), Some(returned), Some(stored), Some(verifier)) if *returned == stored => {
            (code.clone(), verifier)
        }
        _ => return Err(AppError::validation("Invalid OAuth callback")),
    };

    let google_user = state.google.exchange_code(&code, &verifier).await?;
    let user = AccountService::new(state.db.clone(), state.chat.clone())
        .google_login(&google_user)
        .await?;
    metrics::record_login("google");

    let mut response = start_session(&state, user.id).await?;
    for name in [OAUTH_STATE_COOKIE, CODE_VERIFIER_COOKIE] {
        response
            .add_cookie(&expired_cookie(name))
            .map_err(|e| AppError::Internal(format!("Failed to clear OAuth cookie: {}", e)))?;
    }
    Ok(response)
}
