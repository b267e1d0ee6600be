use axum::extract::rejection::{FormRejection, QueryRejection};
use axum::extract::{Form, Path, Query, State};
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::User;
use crate::domain::errors::ReviewError;
use crate::interface_adapters::api_errors::ApiError;
use crate::interface_adapters::caller::Caller;
use crate::interface_adapters::extractors::ReviewRequestId;
use crate::interface_adapters::handlers::{is_flag_set, map_review_error};
use crate::interface_adapters::protocol::{
    ApiResponse, CloseForm, CountResponse, Empty, NewReviewRequestForm, ReviewRequestDetailResponse,
    ReviewRequestListQuery, ReviewRequestListResponse, ReviewRequestPayload,
    ReviewRequestResponse,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::review_requests::{
    CloseReviewRequestUseCase, CreateReviewRequestUseCase, GetReviewRequestUseCase,
    ListReviewRequestsUseCase, NewReviewRequest, PublishReviewRequestUseCase,
    ReopenReviewRequestUseCase, ReviewRequestQuery, StarReviewRequestUseCase,
};

// Comma separated list parameter with blanks dropped.
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number(name: &str, value: Option<&str>) -> Result<Option<u64>, ReviewError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ReviewError::InvalidParameter(name.to_string())),
    }
}

impl ReviewRequestListQuery {
    fn to_query(&self) -> Result<ReviewRequestQuery, ReviewError> {
        Ok(ReviewRequestQuery {
            status: self.status.clone(),
            from_user: self.from_user.clone(),
            to_users: split_list(self.to_users.as_deref()),
            to_users_directly: split_list(self.to_users_directly.as_deref()),
            to_users_groups: split_list(self.to_users_groups.as_deref()),
            to_groups: split_list(self.to_groups.as_deref()),
            repository: parse_number("repository", self.repository.as_deref())?,
            changenum: parse_number("changenum", self.changenum.as_deref())?,
        })
    }
}

#[tracing::instrument(skip_all)]
pub async fn list_review_requests(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    query: Result<Query<ReviewRequestListQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let params = query.map(|Query(params)| params).unwrap_or_default();

    let use_case = ListReviewRequestsUseCase {
        store: state.review_store(),
        directory: state.directory(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let review_requests = async {
        let query = params.to_query()?;
        use_case.execute(caller.as_ref(), &query).await
    }
    .await
    .map_err(map_review_error)?;

    if is_flag_set(params.counts_only.as_deref()) {
        return Ok(ApiResponse::ok(CountResponse {
            count: review_requests.len(),
        })
        .into_response());
    }

    Ok(ApiResponse::ok(ReviewRequestListResponse {
        total_results: review_requests.len(),
        review_requests: review_requests
            .iter()
            .map(ReviewRequestPayload::from)
            .collect(),
    })
    .into_response())
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn get_review_request(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<ReviewRequestDetailResponse>, ApiError> {
    let use_case = GetReviewRequestUseCase {
        store: state.review_store(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let details = use_case
        .execute(caller.as_ref(), id)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(ReviewRequestDetailResponse {
        review_request: ReviewRequestPayload::from(&details.review_request),
        starred: details.starred,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn create_review_request(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    form: Result<Form<NewReviewRequestForm>, FormRejection>,
) -> Result<ApiResponse<ReviewRequestResponse>, ApiError> {
    let form = form.map(|Form(form)| form).unwrap_or_default();

    let use_case = CreateReviewRequestUseCase {
        clock: SystemClock,
        store: state.review_store(),
        directory: state.directory(),
        scm: state.scm.clone(),
        repository_locks: state.repository_locks.clone(),
    };

    let review_request = async {
        // Login is checked before the form is looked at.
        if caller.is_none() {
            return Err(ReviewError::NotLoggedIn);
        }
        let request = NewReviewRequest {
            repository: form.repository,
            changenum: parse_number("changenum", form.changenum.as_deref())?,
            submit_as: form.submit_as.filter(|name| !name.is_empty()),
        };
        use_case.execute(caller.as_ref(), request).await
    }
    .await
    .map_err(map_review_error)?;

    Ok(ApiResponse::created(ReviewRequestResponse {
        review_request: ReviewRequestPayload::from(&review_request),
    }))
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn star_review_request(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<Empty>, ApiError> {
    set_starred(&state, caller.as_ref(), id, true).await
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn unstar_review_request(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<Empty>, ApiError> {
    set_starred(&state, caller.as_ref(), id, false).await
}

async fn set_starred(
    state: &AppState,
    caller: Option<&User>,
    id: u64,
    starred: bool,
) -> Result<ApiResponse<Empty>, ApiError> {
    let use_case = StarReviewRequestUseCase {
        store: state.review_store(),
    };

    use_case
        .execute(caller, id, starred)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(Empty {}))
}

// Handles both `close/` (form `type`) and `close/{close_type}/`; the form wins.
#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn close_review_request(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Path(params): Path<HashMap<String, String>>,
    Caller(caller): Caller,
    form: Result<Form<CloseForm>, FormRejection>,
) -> Result<ApiResponse<Empty>, ApiError> {
    let close_type = form
        .ok()
        .and_then(|Form(form)| form.close_type)
        .or_else(|| params.get("close_type").cloned());

    let use_case = CloseReviewRequestUseCase {
        clock: SystemClock,
        store: state.review_store(),
        locks: state.review_request_locks.clone(),
    };

    use_case
        .execute(caller.as_ref(), id, close_type.as_deref())
        .await
        .map_err(map_review_error)?;

    tracing::info!(close_type = close_type.as_deref(), "review request closed");
    Ok(ApiResponse::ok(Empty {}))
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn reopen_review_request(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<Empty>, ApiError> {
    let use_case = ReopenReviewRequestUseCase {
        clock: SystemClock,
        store: state.review_store(),
        locks: state.review_request_locks.clone(),
    };

    use_case
        .execute(caller.as_ref(), id)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(Empty {}))
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn publish_review_request(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<Empty>, ApiError> {
    let use_case = PublishReviewRequestUseCase {
        clock: SystemClock,
        store: state.review_store(),
        locks: state.review_request_locks.clone(),
    };

    use_case
        .execute(caller.as_ref(), id)
        .await
        .map_err(map_review_error)?;

    tracing::info!("review request published");
    Ok(ApiResponse::ok(Empty {}))
}
