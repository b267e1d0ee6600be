// HTTP handlers: extract, run one use case, map its outcome onto the envelope.

pub mod accounts;
pub mod directory;
pub mod drafts;
pub mod info;
pub mod repositories;
pub mod review_requests;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::json;

use crate::domain::errors::{AuthError, ReviewError, ScmError};
use crate::interface_adapters::api_errors::{self, ApiError};
use crate::interface_adapters::protocol::ReviewRequestPayload;

// Query flags count as set unless absent, `0` or `false`.
pub(crate) fn is_flag_set(value: Option<&str>) -> bool {
    matches!(value, Some(value) if value != "0" && !value.eq_ignore_ascii_case("false"))
}

pub(crate) fn map_review_error(err: ReviewError) -> ApiError {
    if err == ReviewError::StorageFailure {
        tracing::error!("review store unavailable");
    } else {
        tracing::warn!(error = ?err, "review request failed");
    }

    match err {
        ReviewError::NotLoggedIn => api_errors::NOT_LOGGED_IN.into(),
        ReviewError::ReviewRequestNotFound
        | ReviewError::DraftNotFound
        | ReviewError::RepositoryNotFound
        | ReviewError::GroupNotFound => api_errors::DOES_NOT_EXIST.into(),
        ReviewError::PermissionDenied => api_errors::PERMISSION_DENIED.into(),
        ReviewError::UnknownField(name) | ReviewError::InvalidParameter(name) => {
            ApiError::new(api_errors::INVALID_ATTRIBUTE).with("attribute", name)
        }
        ReviewError::InvalidCloseType(close_type) => {
            ApiError::new(api_errors::INVALID_ATTRIBUTE).with("attribute", close_type)
        }
        ReviewError::MissingAttribute(name) => {
            ApiError::new(api_errors::MISSING_ATTRIBUTE).with("attribute", name)
        }
        ReviewError::InvalidFieldValue { field, detail } => {
            ApiError::new(api_errors::INVALID_FORM_DATA)
                .with("attribute", field)
                .with("detail", detail)
        }
        ReviewError::InvalidFields(fields) => {
            ApiError::new(api_errors::INVALID_FORM_DATA).with("fields", json!(fields))
        }
        ReviewError::NothingToPublish => api_errors::NOTHING_TO_PUBLISH.into(),
        ReviewError::MissingRepository => api_errors::MISSING_REPOSITORY.into(),
        ReviewError::InvalidRepository(repository) => {
            ApiError::new(api_errors::INVALID_REPOSITORY).with("repository", repository)
        }
        ReviewError::InvalidUser(_) => api_errors::INVALID_USER.into(),
        ReviewError::ChangeNumberInUse(review_request) => {
            ApiError::new(api_errors::CHANGE_NUMBER_IN_USE).with(
                "review_request",
                json!(ReviewRequestPayload::from(review_request.as_ref())),
            )
        }
        ReviewError::Scm(err) => map_scm_error(err),
        ReviewError::StorageFailure => api_errors::SERVICE_UNAVAILABLE.into(),
    }
}

// Host keys travel base64 encoded.
pub(crate) fn map_scm_error(err: ScmError) -> ApiError {
    match err {
        ScmError::InvalidChangeNumber(_) => api_errors::INVALID_CHANGE_NUMBER.into(),
        ScmError::EmptyChangeset(_) => api_errors::EMPTY_CHANGESET.into(),
        ScmError::BadHostKey {
            hostname,
            expected_key,
            key,
        } => ApiError::new(api_errors::BAD_HOST_KEY)
            .with("hostname", hostname)
            .with("expected_key", STANDARD.encode(expected_key))
            .with("key", STANDARD.encode(key)),
        ScmError::UnverifiedHostKey { hostname, key } => {
            ApiError::new(api_errors::UNVERIFIED_HOST_KEY)
                .with("hostname", hostname)
                .with("key", STANDARD.encode(key))
        }
        ScmError::UnverifiedHostCert {
            hostname,
            fingerprint,
        } => ApiError::new(api_errors::UNVERIFIED_HOST_CERT).with(
            "certificate",
            json!({ "hostname": hostname, "fingerprint": fingerprint }),
        ),
        ScmError::MissingUserKey => api_errors::MISSING_USER_KEY.into(),
        ScmError::AuthenticationFailed => api_errors::REPO_AUTHENTICATION_ERROR.into(),
        ScmError::NotImplemented => api_errors::REPO_NOT_IMPLEMENTED.into(),
        ScmError::Unavailable(message) => {
            tracing::error!(%message, "scm unavailable");
            api_errors::REPO_INFO_ERROR.into()
        }
    }
}

pub(crate) fn map_auth_error(err: AuthError) -> ApiError {
    match err {
        AuthError::LoginFailed => api_errors::LOGIN_FAILED.into(),
        AuthError::InvalidToken | AuthError::SessionExpired => api_errors::NOT_LOGGED_IN.into(),
        AuthError::StorageFailure => {
            tracing::error!("session store unavailable");
            api_errors::SERVICE_UNAVAILABLE.into()
        }
    }
}
