use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::domain::entities::{
    Changeset, Group, Repository, ReviewRequest, ReviewRequestDraft, Session, User,
};
use crate::domain::errors::ScmError;

// Port for session storage used by account use cases.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, token: String, session: Session) -> Result<(), String>;
    async fn get(&self, token: &str) -> Result<Option<Session>, String>;
    async fn remove(&self, token: &str) -> Result<bool, String>;
    // Drops every session expiring at or before `now`; returns how many went.
    async fn remove_expired(&self, now: u64) -> Result<usize, String>;
}

// Port for review requests, their drafts and per-user stars.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn review_request(&self, id: u64) -> Result<Option<ReviewRequest>, String>;
    async fn review_requests(&self) -> Result<Vec<ReviewRequest>, String>;
    // Each call hands out a fresh id, even under concurrent creation.
    async fn allocate_review_request_id(&self) -> Result<u64, String>;
    async fn save_review_request(&self, review_request: ReviewRequest) -> Result<(), String>;

    async fn draft(&self, review_request_id: u64) -> Result<Option<ReviewRequestDraft>, String>;
    async fn save_draft(&self, draft: ReviewRequestDraft) -> Result<(), String>;
    async fn delete_draft(&self, review_request_id: u64) -> Result<bool, String>;

    async fn starred(&self, username: &str) -> Result<BTreeSet<u64>, String>;
    async fn set_starred(
        &self,
        username: &str,
        review_request_id: u64,
        starred: bool,
    ) -> Result<(), String>;
}

// Port for users, groups and repositories known to the site.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, String>;
    async fn user(&self, username: &str) -> Result<Option<User>, String>;
    async fn users(&self) -> Result<Vec<User>, String>;
    // Case-insensitive lookup by name or display name.
    async fn group(&self, name: &str) -> Result<Option<Group>, String>;
    async fn groups(&self) -> Result<Vec<Group>, String>;
    async fn repository(&self, id: u64) -> Result<Option<Repository>, String>;
    async fn repositories(&self) -> Result<Vec<Repository>, String>;
}

// Port for the source control system behind a repository.
#[async_trait]
pub trait ScmClient: Send + Sync {
    async fn changeset(
        &self,
        repository: &Repository,
        changenum: u64,
    ) -> Result<Option<Changeset>, ScmError>;

    async fn repository_info(
        &self,
        repository: &Repository,
    ) -> Result<BTreeMap<String, String>, ScmError>;
}

#[async_trait]
impl<T: ScmClient + ?Sized> ScmClient for Arc<T> {
    async fn changeset(
        &self,
        repository: &Repository,
        changenum: u64,
    ) -> Result<Option<Changeset>, ScmError> {
        (**self).changeset(repository, changenum).await
    }

    async fn repository_info(
        &self,
        repository: &Repository,
    ) -> Result<BTreeMap<String, String>, ScmError> {
        (**self).repository_info(repository).await
    }
}

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> u64;
}
