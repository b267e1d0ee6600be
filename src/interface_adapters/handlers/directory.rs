use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use std::sync::Arc;

use crate::domain::entities::User;
use crate::interface_adapters::api_errors::ApiError;
use crate::interface_adapters::caller::Caller;
use crate::interface_adapters::extractors::GroupName;
use crate::interface_adapters::handlers::{is_flag_set, map_review_error};
use crate::interface_adapters::protocol::{
    ApiResponse, GroupListQuery, GroupListResponse, GroupPayload, UserListQuery,
    UserListResponse, UserPayload,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::directory::{
    GroupQuery, ListGroupUsersUseCase, ListGroupsUseCase, ListUsersUseCase, UserQuery,
};

fn user_list(users: &[User]) -> UserListResponse {
    UserListResponse {
        total_results: users.len(),
        users: users.iter().map(UserPayload::from).collect(),
    }
}

#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    query: Result<Query<UserListQuery>, QueryRejection>,
) -> Result<ApiResponse<UserListResponse>, ApiError> {
    let params = query.map(|Query(params)| params).unwrap_or_default();

    let use_case = ListUsersUseCase {
        directory: state.directory(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let query = UserQuery {
        fullname: is_flag_set(params.fullname.as_deref()),
        q: params.q,
    };
    let users = use_case
        .execute(caller.as_ref(), &query)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(user_list(&users)))
}

#[tracing::instrument(skip_all)]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
    Caller(caller): Caller,
    query: Result<Query<GroupListQuery>, QueryRejection>,
) -> Result<ApiResponse<GroupListResponse>, ApiError> {
    let params = query.map(|Query(params)| params).unwrap_or_default();

    let use_case = ListGroupsUseCase {
        directory: state.directory(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let query = GroupQuery {
        displayname: is_flag_set(params.displayname.as_deref()),
        q: params.q,
    };
    let groups = use_case
        .execute(caller.as_ref(), &query)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(GroupListResponse {
        total_results: groups.len(),
        groups: groups.iter().map(GroupPayload::from).collect(),
    }))
}

#[tracing::instrument(skip_all, fields(group_name = %name))]
pub async fn list_group_users(
    State(state): State<Arc<AppState>>,
    GroupName(name): GroupName,
    Caller(caller): Caller,
) -> Result<ApiResponse<UserListResponse>, ApiError> {
    let use_case = ListGroupUsersUseCase {
        directory: state.directory(),
        allow_anonymous: state.site.allow_anonymous,
    };

    let members = use_case
        .execute(caller.as_ref(), &name)
        .await
        .map_err(map_review_error)?;

    Ok(ApiResponse::ok(user_list(&members)))
}
