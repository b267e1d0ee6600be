use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{HeaderMap, HeaderName, header::SET_COOKIE};
use std::sync::Arc;

use crate::interface_adapters::api_errors::ApiError;
use crate::interface_adapters::caller::{SESSION_COOKIE, session_token};
use crate::interface_adapters::handlers::map_auth_error;
use crate::interface_adapters::protocol::{
    ApiResponse, LoginForm, LoginResponse, LogoutResponse, UserPayload,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::login::LoginUseCase;
use crate::use_cases::logout::LogoutUseCase;

// Handler for issuing a session token.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<([(HeaderName, String); 1], ApiResponse<LoginResponse>), ApiError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let username = form.username.unwrap_or_default();
    let password = form.password.unwrap_or_default();

    let use_case = LoginUseCase {
        clock: SystemClock,
        store: state.session_store(),
        directory: state.directory(),
        ttl_seconds: state.site.session_ttl_seconds,
    };

    let result = use_case
        .execute(&username, &password)
        .await
        .inspect_err(|_| tracing::warn!(%username, "login failed"))
        .map_err(map_auth_error)?;

    tracing::info!(username = %result.user.username, "logged in");

    let cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        result.token, state.site.session_ttl_seconds
    );

    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok(LoginResponse {
            token: result.token,
            expires_at: result.expires_at,
            user: UserPayload::from(&result.user),
        }),
    ))
}

// Handler for revoking the presented session token.
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<([(HeaderName, String); 1], ApiResponse<LogoutResponse>), ApiError> {
    let token = session_token(&headers);
    let use_case = LogoutUseCase {
        store: state.session_store(),
    };

    let result = use_case
        .execute(token.as_deref())
        .await
        .map_err(map_auth_error)?;

    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    Ok((
        [(SET_COOKIE, cookie)],
        ApiResponse::ok(LogoutResponse {
            revoked: result.revoked,
        }),
    ))
}
