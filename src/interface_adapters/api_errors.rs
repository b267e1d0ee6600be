use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};

// One row of the static API error table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorDef {
    pub code: u32,
    pub http_status: StatusCode,
    pub message: &'static str,
}

const fn def(code: u32, http_status: StatusCode, message: &'static str) -> ErrorDef {
    ErrorDef {
        code,
        http_status,
        message,
    }
}

pub const SERVICE_UNAVAILABLE: ErrorDef = def(
    1,
    StatusCode::SERVICE_UNAVAILABLE,
    "The web service is temporarily unavailable",
);
pub const DOES_NOT_EXIST: ErrorDef = def(100, StatusCode::NOT_FOUND, "Object does not exist");
pub const PERMISSION_DENIED: ErrorDef = def(
    101,
    StatusCode::FORBIDDEN,
    "You don't have permission for this",
);
pub const INVALID_ATTRIBUTE: ErrorDef = def(102, StatusCode::BAD_REQUEST, "Invalid attribute");
pub const NOT_LOGGED_IN: ErrorDef = def(103, StatusCode::UNAUTHORIZED, "You are not logged in");
pub const LOGIN_FAILED: ErrorDef = def(
    104,
    StatusCode::UNAUTHORIZED,
    "The username or password was not correct",
);
pub const INVALID_FORM_DATA: ErrorDef = def(
    105,
    StatusCode::BAD_REQUEST,
    "One or more fields had errors",
);
pub const MISSING_ATTRIBUTE: ErrorDef = def(
    106,
    StatusCode::BAD_REQUEST,
    "Missing value for the attribute",
);
pub const INVALID_CHANGE_NUMBER: ErrorDef = def(
    203,
    StatusCode::NOT_FOUND,
    "The change number specified could not be found",
);
pub const CHANGE_NUMBER_IN_USE: ErrorDef = def(
    204,
    StatusCode::CONFLICT,
    "The change number specified has already been used",
);
pub const MISSING_REPOSITORY: ErrorDef = def(
    205,
    StatusCode::BAD_REQUEST,
    "A repository path must be specified",
);
pub const INVALID_REPOSITORY: ErrorDef = def(
    206,
    StatusCode::BAD_REQUEST,
    "The repository path specified is not in the list of known repositories",
);
pub const INVALID_USER: ErrorDef = def(208, StatusCode::BAD_REQUEST, "User does not exist");
pub const REPO_NOT_IMPLEMENTED: ErrorDef = def(
    209,
    StatusCode::NOT_IMPLEMENTED,
    "The specified repository is not able to perform this action",
);
pub const REPO_INFO_ERROR: ErrorDef = def(
    210,
    StatusCode::INTERNAL_SERVER_ERROR,
    "There was an error fetching extended information for this repository",
);
pub const NOTHING_TO_PUBLISH: ErrorDef = def(
    211,
    StatusCode::BAD_REQUEST,
    "You attempted to publish a review request that doesn't have an associated draft",
);
pub const EMPTY_CHANGESET: ErrorDef = def(
    212,
    StatusCode::BAD_REQUEST,
    "The change number specified represents an empty changeset",
);
pub const BAD_HOST_KEY: ErrorDef = def(
    214,
    StatusCode::FORBIDDEN,
    "The SSH key on the host does not match the stored key",
);
pub const UNVERIFIED_HOST_KEY: ErrorDef = def(
    215,
    StatusCode::FORBIDDEN,
    "The SSH key on the host is unverified",
);
pub const UNVERIFIED_HOST_CERT: ErrorDef = def(
    216,
    StatusCode::FORBIDDEN,
    "The HTTPS certificate on the host is unverified",
);
pub const MISSING_USER_KEY: ErrorDef = def(
    217,
    StatusCode::FORBIDDEN,
    "A public SSH key was requested, but no SSH key was available to send",
);
pub const REPO_AUTHENTICATION_ERROR: ErrorDef = def(
    218,
    StatusCode::FORBIDDEN,
    "Unable to authenticate with the repository using the provided credentials",
);

pub const ALL: [ErrorDef; 22] = [
    SERVICE_UNAVAILABLE,
    DOES_NOT_EXIST,
    PERMISSION_DENIED,
    INVALID_ATTRIBUTE,
    NOT_LOGGED_IN,
    LOGIN_FAILED,
    INVALID_FORM_DATA,
    MISSING_ATTRIBUTE,
    INVALID_CHANGE_NUMBER,
    CHANGE_NUMBER_IN_USE,
    MISSING_REPOSITORY,
    INVALID_REPOSITORY,
    INVALID_USER,
    REPO_NOT_IMPLEMENTED,
    REPO_INFO_ERROR,
    NOTHING_TO_PUBLISH,
    EMPTY_CHANGESET,
    BAD_HOST_KEY,
    UNVERIFIED_HOST_KEY,
    UNVERIFIED_HOST_CERT,
    MISSING_USER_KEY,
    REPO_AUTHENTICATION_ERROR,
];

// Envelope keys owned by the error itself.
const RESERVED_KEYS: [&str; 2] = ["stat", "err"];

// A failed API call: a table entry plus any per-failure fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub def: ErrorDef,
    pub extra: Map<String, Value>,
}

impl ApiError {
    pub fn new(def: ErrorDef) -> Self {
        Self {
            def,
            extra: Map::new(),
        }
    }

    // Attach an extra top-level field. `stat` and `err` are never overwritten.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        if !RESERVED_KEYS.contains(&key) {
            self.extra.insert(key.to_string(), value.into());
        }
        self
    }

    pub fn body(&self) -> Value {
        let mut body = self.extra.clone();
        body.insert("stat".to_string(), Value::from("fail"));
        body.insert(
            "err".to_string(),
            json!({ "code": self.def.code, "msg": self.def.message }),
        );
        Value::Object(body)
    }
}

impl From<ErrorDef> for ApiError {
    fn from(def: ErrorDef) -> Self {
        ApiError::new(def)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.def.http_status, Json(self.body())).into_response()
    }
}
