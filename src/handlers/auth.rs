//! Session endpoints: register, login, logout, current identity
//!
//! On success the session token travels back twice: in the response body
//! for API clients and as an http-only cookie for browsers. Logout clears
//! the cookie and revokes the token it carried.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use super::{reject, session_token, with_identity, with_state};
use crate::auth::identity::{Identity, Role};
use crate::config::ServerConfig;
use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MIN_PASSWORD_LENGTH, SESSION_COOKIE};
use crate::core::state::AppState;
use crate::error::{Result, SiteKeeperError};
use crate::security::AuthTimer;

const BODY_LIMIT: u64 = 16 * 1024;
const MIN_AUTH_DURATION: Duration = Duration::from_millis(100);

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Requested role; defaults to client. Administrative accounts are
    /// provisioned out of band, never self-registered.
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Public view of an account; the password hash never leaves the store
#[derive(Debug, Serialize)]
pub struct IdentityResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            role: identity.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub expires_in: u64,
    pub identity: IdentityResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Session endpoint routes
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let register = warp::path!("api" / "auth" / "register")
        .and(warp::post())
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_register);

    let login = warp::path!("api" / "auth" / "login")
        .and(warp::post())
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handle_login);

    let logout = warp::path!("api" / "auth" / "logout")
        .and(warp::post())
        .and(session_token())
        .and(with_state(state.clone()))
        .and_then(handle_logout);

    let me = warp::path!("api" / "auth" / "me")
        .and(warp::get())
        .and(with_identity(state.clone()))
        .and_then(handle_me);

    let password = warp::path!("api" / "auth" / "password")
        .and(warp::put())
        .and(with_identity(state.clone()))
        .and(warp::body::content_length_limit(BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state))
        .and_then(handle_change_password);

    register.or(login).or(logout).or(me).or(password)
}

fn validate_registration(req: &RegisterRequest) -> Result<Role> {
    if req.name.trim().is_empty() || req.name.len() > MAX_NAME_LENGTH {
        return Err(SiteKeeperError::ValidationError(
            "Name must be between 1 and 100 characters".to_string(),
        ));
    }
    if !req.email.contains('@') || req.email.len() > MAX_EMAIL_LENGTH {
        return Err(SiteKeeperError::ValidationError(
            "A valid email address is required".to_string(),
        ));
    }
    if req.password.len() < MIN_PASSWORD_LENGTH {
        return Err(SiteKeeperError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    match req.role {
        Some(Role::Admin) => Err(SiteKeeperError::ValidationError(
            "Administrative accounts cannot be self-registered".to_string(),
        )),
        Some(role) => Ok(role),
        None => Ok(Role::Client),
    }
}

/// Build the Set-Cookie value carrying the session token
fn session_cookie(config: &ServerConfig, token: &str, max_age_secs: u64) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    );
    if config.secure_cookies {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(config: &ServerConfig) -> String {
    session_cookie(config, "", 0)
}

fn session_reply(
    state: &AppState,
    identity: &Identity,
    token: String,
    status: StatusCode,
) -> impl Reply {
    let cookie = session_cookie(&state.config, &token, state.tokens.ttl_secs());
    let body = SessionResponse {
        token,
        expires_in: state.tokens.ttl_secs(),
        identity: IdentityResponse::from(identity),
    };
    warp::reply::with_header(
        warp::reply::with_status(warp::reply::json(&body), status),
        "set-cookie",
        cookie,
    )
}

async fn handle_register(
    req: RegisterRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    let role = validate_registration(&req).map_err(reject)?;

    let identity = state
        .credentials
        .register(req.name.trim().to_string(), req.email, &req.password, role)
        .await
        .map_err(reject)?;

    let token = state.tokens.issue(&identity).map_err(reject)?;
    log::info!("Account registered: {}", identity.id);

    Ok(session_reply(&state, &identity, token, StatusCode::CREATED))
}

async fn handle_login(
    req: LoginRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    // Failures take the same minimum time whether the email was unknown
    // or the password wrong
    let timer = AuthTimer::new(MIN_AUTH_DURATION);

    let outcome = state.credentials.authenticate(&req.email, &req.password).await;
    timer.wait().await;

    let identity = outcome.map_err(reject)?;
    let token = state.tokens.issue(&identity).map_err(reject)?;
    log::info!("Login: {}", identity.id);

    Ok(session_reply(&state, &identity, token, StatusCode::OK))
}

async fn handle_logout(
    token: Option<String>,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    // Revocation is idempotent, so logout succeeds even when the token is
    // missing, malformed, or already dead
    if let Some(token) = token {
        state.tokens.revoke(&token).await;
    }

    Ok(warp::reply::with_header(
        warp::reply::json(&MessageResponse {
            message: "Logged out".to_string(),
        }),
        "set-cookie",
        clear_session_cookie(&state.config),
    ))
}

async fn handle_me(identity: Identity) -> std::result::Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&IdentityResponse::from(&identity)))
}

async fn handle_change_password(
    identity: Identity,
    req: ChangePasswordRequest,
    state: AppState,
) -> std::result::Result<impl Reply, Rejection> {
    if req.new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(reject(SiteKeeperError::ValidationError(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))));
    }

    let updated = state
        .credentials
        .change_password(identity.id, &req.old_password, &req.new_password)
        .await
        .map_err(reject)?;

    log::info!("Password changed: {}", updated.id);
    Ok(warp::reply::json(&IdentityResponse::from(&updated)))
}
