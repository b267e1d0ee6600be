use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Path, State};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::fields::FieldValue;
use crate::interface_adapters::api_errors::ApiError;
use crate::interface_adapters::caller::Caller;
use crate::interface_adapters::extractors::ReviewRequestId;
use crate::interface_adapters::handlers::map_review_error;
use crate::interface_adapters::protocol::{
    ApiResponse, DraftPayload, DraftResponse, Empty, ReviewRequestPayload, ReviewRequestResponse,
    ValueForm,
};
use crate::interface_adapters::state::{AppState, SystemClock};
use crate::use_cases::draft::{DiscardDraftUseCase, GetDraftUseCase, PublishDraftUseCase};
use crate::use_cases::set_draft_field::SetDraftFieldUseCase;
use crate::use_cases::update_draft::UpdateDraftUseCase;

// Handler for setting one draft field; replies with the stored value under the field name.
#[tracing::instrument(skip_all, fields(review_request_id = id, field = %field_name))]
pub async fn set_draft_field(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Path((_, field_name)): Path<(String, String)>,
    Caller(caller): Caller,
    form: Result<Form<ValueForm>, FormRejection>,
) -> Result<ApiResponse<BTreeMap<String, FieldValue>>, ApiError> {
    let value = form.ok().and_then(|Form(form)| form.value);

    let use_case = SetDraftFieldUseCase {
        clock: SystemClock,
        store: state.review_store(),
        directory: state.directory(),
        locks: state.review_request_locks.clone(),
    };

    let result = use_case
        .execute(caller.as_ref(), id, &field_name, value.as_deref())
        .await
        .map_err(map_review_error)?;

    tracing::debug!("draft field stored");
    Ok(ApiResponse::ok(BTreeMap::from([(
        result.field.to_string(),
        result.value,
    )])))
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn get_draft(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<DraftResponse>, ApiError> {
    let use_case = GetDraftUseCase {
        store: state.review_store(),
    };

    let draft = use_case
        .execute(caller.as_ref(), id)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(DraftResponse {
        draft: DraftPayload::from(&draft),
    }))
}

// Handler for setting several draft fields in one request.
#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn update_draft(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
    form: Result<Form<BTreeMap<String, String>>, FormRejection>,
) -> Result<ApiResponse<DraftResponse>, ApiError> {
    let fields = form.map(|Form(fields)| fields).unwrap_or_default();

    let use_case = UpdateDraftUseCase {
        clock: SystemClock,
        store: state.review_store(),
        directory: state.directory(),
        locks: state.review_request_locks.clone(),
    };

    let draft = use_case
        .execute(caller.as_ref(), id, &fields)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(DraftResponse {
        draft: DraftPayload::from(&draft),
    }))
}

#[tracing::instrument(skip_all, fields(review_request_id = id))]
pub async fn discard_draft(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<Empty>, ApiError> {
    let use_case = DiscardDraftUseCase {
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
pub async fn publish_draft(
    State(state): State<Arc<AppState>>,
    ReviewRequestId(id): ReviewRequestId,
    Caller(caller): Caller,
) -> Result<ApiResponse<ReviewRequestResponse>, ApiError> {
    let use_case = PublishDraftUseCase {
        clock: SystemClock,
        store: state.review_store(),
        locks: state.review_request_locks.clone(),
    };

    let review_request = use_case
        .execute(caller.as_ref(), id)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(ReviewRequestResponse {
        review_request: ReviewRequestPayload::from(&review_request),
    }))
}
