//! Request handlers for the HTTP API
//!
//! Handlers marshal request bodies into auth/store calls and map the
//! typed error taxonomy onto HTTP status codes. The session token is
//! accepted from the session cookie or an Authorization bearer header.

pub mod auth;
pub mod content;

use serde::Serialize;
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::auth::identity::Identity;
use crate::constants::{MAX_TOKEN_LENGTH, SESSION_COOKIE};
use crate::core::state::AppState;
use crate::error::SiteKeeperError;

/// Rejection wrapper carrying a typed error through warp
#[derive(Debug)]
pub struct ApiReject(pub SiteKeeperError);

impl warp::reject::Reject for ApiReject {}

/// Wrap a typed error as a warp rejection
pub fn reject(err: SiteKeeperError) -> Rejection {
    warp::reject::custom(ApiReject(err))
}

/// Extracts bearer token from an Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    auth_header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

/// Include the shared application state in a request
pub fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// Extract the raw session token, if any, from cookie or header
///
/// The cookie wins when both are present; the header form exists for
/// non-browser API clients.
pub fn session_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .map(|cookie: Option<String>, header: Option<String>| {
            cookie.or_else(|| header.as_deref().and_then(extract_bearer_token))
        })
}

/// Resolve the request's session token into an authenticated identity
pub fn with_identity(state: AppState) -> impl Filter<Extract = (Identity,), Error = Rejection> + Clone {
    session_token()
        .and(with_state(state))
        .and_then(|token: Option<String>, state: AppState| async move {
            let token = token.ok_or_else(|| reject(SiteKeeperError::Unauthenticated))?;
            if token.len() > MAX_TOKEN_LENGTH {
                return Err(reject(SiteKeeperError::Unauthenticated));
            }
            state.guard.resolve_identity(&token).await.map_err(reject)
        })
}

/// All API routes plus the health check
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&serde_json::json!({
                "status": "ok"
            }))
        });

    health
        .or(auth::routes(state.clone()))
        .or(content::routes(state))
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn status_for(err: &SiteKeeperError) -> StatusCode {
    match err {
        SiteKeeperError::InvalidCredentials | SiteKeeperError::Unauthenticated => {
            StatusCode::UNAUTHORIZED
        }
        SiteKeeperError::Forbidden => StatusCode::FORBIDDEN,
        SiteKeeperError::NotFound(_) => StatusCode::NOT_FOUND,
        SiteKeeperError::Conflict(_) => StatusCode::CONFLICT,
        SiteKeeperError::ValidationError(_) => StatusCode::BAD_REQUEST,
        SiteKeeperError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SiteKeeperError::AuthError(_)
        | SiteKeeperError::StorageError(_)
        | SiteKeeperError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map rejections onto JSON error responses
pub async fn handle_rejection(err: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Resource not found".to_string())
    } else if let Some(ApiReject(api_err)) = err.find::<ApiReject>() {
        // Internal failures keep their detail in the log, not the response
        if status_for(api_err) == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("Request failed: {}", api_err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        } else {
            (status_for(api_err), api_err.to_string())
        }
    } else if err
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "Invalid request body".to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        )
    } else {
        log::error!("Unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        )
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorBody { error: message }),
        status,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(
            extract_bearer_token("Bearer abc.def.ghi"),
            Some("abc.def.ghi".to_string())
        );
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token(""), None);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&SiteKeeperError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(&SiteKeeperError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status_for(&SiteKeeperError::Conflict("x".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&SiteKeeperError::Unavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
