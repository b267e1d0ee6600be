use axum::extract::{FromRequestParts, Path};
use axum::http::StatusCode;
use axum::http::request::Parts;
use std::collections::HashMap;

// Review request id taken from the `{review_request_id}` path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviewRequestId(pub u64);

// Repository id taken from the `{repository_id}` path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepositoryId(pub u64);

// Review group name taken from the `{group_name}` path segment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupName(pub String);

// Group names are ASCII letters, digits, `_` and `-`.
pub fn is_group_name(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

// Object ids are positive decimal integers; anything else is an unknown URL.
pub fn parse_object_id(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|id| *id > 0)
}

async fn object_id<S>(parts: &mut Parts, state: &S, key: &str) -> Result<u64, StatusCode>
where
    S: Send + Sync,
{
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    params
        .get(key)
        .and_then(|raw| parse_object_id(raw))
        .ok_or(StatusCode::NOT_FOUND)
}

impl<S> FromRequestParts<S> for ReviewRequestId
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        object_id(parts, state, "review_request_id")
            .await
            .map(ReviewRequestId)
    }
}

impl<S> FromRequestParts<S> for RepositoryId
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        object_id(parts, state, "repository_id")
            .await
            .map(RepositoryId)
    }
}

impl<S> FromRequestParts<S> for GroupName
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::NOT_FOUND)?;

        params
            .get("group_name")
            .filter(|raw| is_group_name(raw))
            .map(|raw| GroupName(raw.clone()))
            .ok_or(StatusCode::NOT_FOUND)
    }
}
