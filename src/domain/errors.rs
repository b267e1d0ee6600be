use std::collections::BTreeMap;
use std::fmt;

use crate::domain::entities::ReviewRequest;

// Domain-level errors for session workflows.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthError {
    LoginFailed,
    InvalidToken,
    SessionExpired,
    StorageFailure,
}

// Domain-level errors for review request, draft and repository workflows.
#[derive(Debug, PartialEq, Eq)]
pub enum ReviewError {
    NotLoggedIn,
    ReviewRequestNotFound,
    DraftNotFound,
    RepositoryNotFound,
    GroupNotFound,
    PermissionDenied,
    UnknownField(String),
    InvalidParameter(String),
    InvalidCloseType(Option<String>),
    MissingAttribute(&'static str),
    InvalidFieldValue { field: String, detail: Vec<String> },
    InvalidFields(BTreeMap<String, Vec<String>>),
    NothingToPublish,
    MissingRepository,
    InvalidRepository(String),
    InvalidUser(String),
    ChangeNumberInUse(Box<ReviewRequest>),
    Scm(ScmError),
    StorageFailure,
}

impl From<ScmError> for ReviewError {
    fn from(err: ScmError) -> Self {
        ReviewError::Scm(err)
    }
}

// Failures reported by the source control system behind a repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScmError {
    InvalidChangeNumber(u64),
    EmptyChangeset(u64),
    BadHostKey {
        hostname: String,
        expected_key: Vec<u8>,
        key: Vec<u8>,
    },
    UnverifiedHostKey {
        hostname: String,
        key: Vec<u8>,
    },
    UnverifiedHostCert {
        hostname: String,
        fingerprint: String,
    },
    MissingUserKey,
    AuthenticationFailed,
    NotImplemented,
    Unavailable(String),
}

impl fmt::Display for ScmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScmError::InvalidChangeNumber(number) => write!(f, "change {number} not found"),
            ScmError::EmptyChangeset(number) => write!(f, "change {number} is empty"),
            ScmError::BadHostKey { hostname, .. } => {
                write!(f, "host key for {hostname} does not match the stored key")
            }
            ScmError::UnverifiedHostKey { hostname, .. } => {
                write!(f, "host key for {hostname} is unverified")
            }
            ScmError::UnverifiedHostCert {
                hostname,
                fingerprint,
            } => write!(f, "certificate {fingerprint} for {hostname} is unverified"),
            ScmError::MissingUserKey => f.write_str("no user key available"),
            ScmError::AuthenticationFailed => f.write_str("repository authentication failed"),
            ScmError::NotImplemented => f.write_str("operation not supported by this repository"),
            ScmError::Unavailable(message) => write!(f, "scm unavailable: {message}"),
        }
    }
}

impl std::error::Error for ScmError {}
