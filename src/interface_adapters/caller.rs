use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

use crate::domain::entities::User;
use crate::domain::errors::AuthError;
use crate::domain::ports::Directory;
use crate::interface_adapters::api_errors::{ApiError, LOGIN_FAILED, SERVICE_UNAVAILABLE};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::verify_session::VerifySessionUseCase;

// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "rbsessionid";

// Identity presented with a request.
#[derive(Debug, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    // Basic credentials that could not be decoded.
    MalformedBasic,
    Token(String),
}

// Authenticated user making the request, or None for anonymous callers.
#[derive(Debug)]
pub struct Caller(pub Option<User>);

// The Authorization header wins over the session cookie.
pub fn credentials(headers: &HeaderMap) -> Option<Credentials> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        if let Some(encoded) = value.strip_prefix("Basic ") {
            return Some(decode_basic(encoded.trim()).unwrap_or(Credentials::MalformedBasic));
        }
        if let Some(token) = value.strip_prefix("Bearer ") {
            let token = token.trim();
            if !token.is_empty() {
                return Some(Credentials::Token(token.to_string()));
            }
        }
    }

    session_cookie(headers).map(Credentials::Token)
}

// Session token from a Bearer header or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    match credentials(headers)? {
        Credentials::Token(token) => Some(token),
        Credentials::Basic { .. } | Credentials::MalformedBasic => session_cookie(headers),
    }
}

fn decode_basic(encoded: &str) -> Option<Credentials> {
    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(Credentials::Basic {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let directory = state.directory();

        match credentials(&parts.headers) {
            None => Ok(Caller(None)),
            Some(Credentials::MalformedBasic) => Err(ApiError::new(LOGIN_FAILED)),
            Some(Credentials::Basic { username, password }) => {
                let user = directory
                    .authenticate(&username, &password)
                    .await
                    .map_err(|err| {
                        tracing::error!(error = %err, "directory lookup failed");
                        ApiError::new(SERVICE_UNAVAILABLE)
                    })?;

                match user {
                    Some(user) => Ok(Caller(Some(user))),
                    None => {
                        tracing::warn!(%username, "basic authentication failed");
                        Err(ApiError::new(LOGIN_FAILED))
                    }
                }
            }
            Some(Credentials::Token(token)) => {
                let use_case = VerifySessionUseCase {
                    clock: SystemClock,
                    store: state.session_store(),
                };

                let session = match use_case.execute(&token).await {
                    Ok(session) => session,
                    Err(AuthError::StorageFailure) => {
                        return Err(ApiError::new(SERVICE_UNAVAILABLE));
                    }
                    // Stale or unknown tokens fall back to an anonymous caller.
                    Err(_) => return Ok(Caller(None)),
                };

                let user = directory
                    .user(&session.username)
                    .await
                    .map_err(|_| ApiError::new(SERVICE_UNAVAILABLE))?;
                Ok(Caller(user))
            }
        }
    }
}
