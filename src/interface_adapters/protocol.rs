use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Group, Repository, ReviewRequest, ReviewRequestDraft, User};
use crate::domain::fields::DraftField;

// Successful response body: `{"stat": "ok", ...payload}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    stat: &'static str,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            stat: "ok",
            payload,
        }
    }
}

// Status code plus the payload to wrap in an ok envelope.
#[derive(Debug)]
pub struct ApiResponse<T>(pub StatusCode, pub T);

impl<T> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self(StatusCode::OK, payload)
    }

    pub fn created(payload: T) -> Self {
        Self(StatusCode::CREATED, payload)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.0, Json(Envelope::ok(self.1))).into_response()
    }
}

// Payload for operations that report nothing beyond success.
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

// Form body for a single draft field set.
#[derive(Debug, Default, Deserialize)]
pub struct ValueForm {
    pub value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewReviewRequestForm {
    pub repository: Option<String>,
    pub changenum: Option<String>,
    pub submit_as: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CloseForm {
    #[serde(rename = "type")]
    pub close_type: Option<String>,
}

// Query string accepted by the review request list.
#[derive(Debug, Default, Deserialize)]
pub struct ReviewRequestListQuery {
    pub status: Option<String>,
    #[serde(rename = "from-user")]
    pub from_user: Option<String>,
    #[serde(rename = "to-users")]
    pub to_users: Option<String>,
    #[serde(rename = "to-users-directly")]
    pub to_users_directly: Option<String>,
    #[serde(rename = "to-users-groups")]
    pub to_users_groups: Option<String>,
    #[serde(rename = "to-groups")]
    pub to_groups: Option<String>,
    pub repository: Option<String>,
    pub changenum: Option<String>,
    #[serde(rename = "counts-only")]
    pub counts_only: Option<String>,
}

// Query string accepted by the user list.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
    pub fullname: Option<String>,
}

// Query string accepted by the review group list.
#[derive(Debug, Default, Deserialize)]
pub struct GroupListQuery {
    pub q: Option<String>,
    pub displayname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub fullname: String,
    pub email: String,
}

impl From<&User> for UserPayload {
    fn from(user: &User) -> Self {
        let fullname = format!("{} {}", user.first_name, user.last_name)
            .trim()
            .to_string();
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            fullname,
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GroupPayload {
    pub name: String,
    pub display_name: String,
    pub url: String,
}

impl From<&Group> for GroupPayload {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            display_name: group.display_name.clone(),
            url: format!("/groups/{}/", group.name),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewRequestPayload {
    pub id: u64,
    pub submitter: String,
    pub time_added: u64,
    pub last_updated: u64,
    pub status: &'static str,
    pub public: bool,
    pub changenum: Option<u64>,
    pub repository: u64,
    pub summary: String,
    pub description: String,
    pub testing_done: String,
    pub bugs_closed: Vec<String>,
    pub branch: String,
    pub target_groups: Vec<String>,
    pub target_people: Vec<String>,
}

impl From<&ReviewRequest> for ReviewRequestPayload {
    fn from(review_request: &ReviewRequest) -> Self {
        Self {
            id: review_request.id,
            submitter: review_request.submitter.clone(),
            time_added: review_request.time_added,
            last_updated: review_request.last_updated,
            status: review_request.status.as_str(),
            public: review_request.public,
            changenum: review_request.changenum,
            repository: review_request.repository_id,
            summary: review_request.summary.clone(),
            description: review_request.description.clone(),
            testing_done: review_request.testing_done.clone(),
            bugs_closed: review_request.bugs_closed.clone(),
            branch: review_request.branch.clone(),
            target_groups: review_request.target_groups.clone(),
            target_people: review_request.target_people.clone(),
        }
    }
}

// Draft fields keyed by the names they are set with.
#[derive(Debug, Serialize)]
pub struct DraftPayload {
    pub review_request: u64,
    pub last_updated: u64,
    pub summary: String,
    pub description: String,
    pub testing_done: String,
    pub bugs_closed: Vec<String>,
    pub branch: String,
    pub target_groups: Vec<String>,
    pub target_people: Vec<String>,
    pub changedescription: String,
    #[serde(flatten)]
    pub screenshot_captions: BTreeMap<String, String>,
}

impl From<&ReviewRequestDraft> for DraftPayload {
    fn from(draft: &ReviewRequestDraft) -> Self {
        Self {
            review_request: draft.review_request_id,
            last_updated: draft.last_updated,
            summary: draft.summary.clone(),
            description: draft.description.clone(),
            testing_done: draft.testing_done.clone(),
            bugs_closed: draft.bugs_closed.clone(),
            branch: draft.branch.clone(),
            target_groups: draft.target_groups.clone(),
            target_people: draft.target_people.clone(),
            changedescription: draft.changedescription.clone(),
            screenshot_captions: draft
                .screenshot_captions
                .iter()
                .map(|(id, caption)| {
                    (
                        DraftField::ScreenshotCaption(*id).to_string(),
                        caption.clone(),
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepositoryPayload {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub tool: String,
}

impl From<&Repository> for RepositoryPayload {
    fn from(repository: &Repository) -> Self {
        Self {
            id: repository.id,
            name: repository.name.clone(),
            path: repository.path.clone(),
            tool: repository.tool.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReviewRequestResponse {
    pub review_request: ReviewRequestPayload,
}

// Item read; `starred` reflects the caller's own star.
#[derive(Debug, Serialize)]
pub struct ReviewRequestDetailResponse {
    pub review_request: ReviewRequestPayload,
    pub starred: bool,
}

#[derive(Debug, Serialize)]
pub struct ReviewRequestListResponse {
    pub review_requests: Vec<ReviewRequestPayload>,
    pub total_results: usize,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: DraftPayload,
}

#[derive(Debug, Serialize)]
pub struct RepositoryListResponse {
    pub repositories: Vec<RepositoryPayload>,
    pub total_results: usize,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserPayload>,
    pub total_results: usize,
}

#[derive(Debug, Serialize)]
pub struct GroupListResponse {
    pub groups: Vec<GroupPayload>,
    pub total_results: usize,
}

#[derive(Debug, Serialize)]
pub struct RepositoryInfoResponse {
    pub info: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: u64,
    pub user: UserPayload,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub revoked: bool,
}

#[derive(Debug, Serialize)]
pub struct ProductInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub package_version: &'static str,
    pub is_release: bool,
}

#[derive(Debug, Serialize)]
pub struct AdministratorPayload {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SiteInfo {
    pub url: String,
    pub administrators: Vec<AdministratorPayload>,
}

#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub product: ProductInfo,
    pub site: SiteInfo,
}

#[derive(Debug, Serialize)]
pub struct ServerInfoResponse {
    pub info: ServerInfo,
}
