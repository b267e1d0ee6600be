use crate::interface_adapters::handlers::{
    accounts, directory, drafts, info, repositories, review_requests,
};
use crate::interface_adapters::state::AppState;
use axum::http::StatusCode;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/accounts/login/", post(accounts::login))
        .route("/accounts/logout/", post(accounts::logout))
        .route("/info/", get(info::server_info))
        .route("/users/", get(directory::list_users))
        .route("/groups/", get(directory::list_groups))
        .route(
            "/groups/{group_name}/users/",
            get(directory::list_group_users),
        )
        .route("/repositories/", get(repositories::list_repositories))
        .route(
            "/repositories/{repository_id}/info/",
            get(repositories::repository_info),
        )
        .route("/reviewrequests/", get(review_requests::list_review_requests))
        .route(
            "/reviewrequests/new/",
            post(review_requests::create_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/",
            get(review_requests::get_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/star/",
            post(review_requests::star_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/unstar/",
            post(review_requests::unstar_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/close/",
            post(review_requests::close_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/close/{close_type}/",
            post(review_requests::close_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/reopen/",
            post(review_requests::reopen_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/publish/",
            post(review_requests::publish_review_request),
        )
        .route(
            "/reviewrequests/{review_request_id}/draft/",
            get(drafts::get_draft),
        )
        .route(
            "/reviewrequests/{review_request_id}/draft/set/",
            post(drafts::update_draft),
        )
        .route(
            "/reviewrequests/{review_request_id}/draft/set/{field_name}/",
            post(drafts::set_draft_field),
        )
        .route(
            "/reviewrequests/{review_request_id}/draft/discard/",
            post(drafts::discard_draft),
        )
        .route(
            "/reviewrequests/{review_request_id}/draft/publish/",
            post(drafts::publish_draft),
        );

    Router::new()
        .nest("/api/json", api)
        .fallback(not_found)
        .with_state(state)
}

// Unknown URLs get a bare 404 without an envelope.
async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
