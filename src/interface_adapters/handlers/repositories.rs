use axum::extract::State;
use std::sync::Arc;

use crate::interface_adapters::api_errors::ApiError;
use crate::interface_adapters::caller::Caller;
use crate::interface_adapters::extractors::RepositoryId;
use crate::interface_adapters::handlers::map_review_error;
use crate::interface_adapters::protocol::{
    ApiResponse, RepositoryInfoResponse, RepositoryListResponse, RepositoryPayload,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::repositories::{ListRepositoriesUseCase, RepositoryInfoUseCase};

#[tracing::instrument(skip_all)]
pub async fn list_repositories(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
) -> Result<ApiResponse<RepositoryListResponse>, ApiError> {
    let use_case = ListRepositoriesUseCase {
        directory: state.directory(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let repositories = use_case
        .execute(caller.as_ref())
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(RepositoryListResponse {
        total_results: repositories.len(),
        repositories: repositories.iter().map(RepositoryPayload::from).collect(),
    }))
}

// Handler for server-side repository information, fetched through the SCM port.
#[tracing::instrument(skip_all, fields(repository_id = id))]
pub async fn repository_info(
    State(state): State<Arc<AppState>>,
    RepositoryId(id): RepositoryId,
    Caller(caller): Caller,
) -> Result<ApiResponse<RepositoryInfoResponse>, ApiError> {
    let use_case = RepositoryInfoUseCase {
        directory: state.directory(),
        scm: state.scm.clone(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let info = use_case
        .execute(caller.as_ref(), id)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(RepositoryInfoResponse { info }))
}
