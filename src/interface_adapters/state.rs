use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use url::Url;

use crate::domain::entities::{Group, Repository, ReviewRequest, ReviewRequestDraft, Session, User};
use crate::domain::ports::{Clock, Directory, ReviewStore, ScmClient, SessionStore};
use crate::use_cases::locks::EntityLocks;

#[derive(Clone, Debug)]
pub struct Administrator {
    pub name: String,
    pub email: String,
}

// Site-wide settings exposed through the API.
#[derive(Clone, Debug)]
pub struct SiteSettings {
    pub url: Url,
    pub administrators: Vec<Administrator>,
    pub allow_anonymous: bool,
    pub session_ttl_seconds: u64,
}

// Review requests, drafts and stars held in memory.
#[derive(Debug, Default)]
pub struct ReviewRecords {
    pub review_requests: BTreeMap<u64, ReviewRequest>,
    pub drafts: BTreeMap<u64, ReviewRequestDraft>,
    pub stars: HashMap<String, BTreeSet<u64>>,
    pub last_id: u64,
}

impl ReviewRecords {
    pub fn seeded(review_requests: Vec<ReviewRequest>) -> Self {
        let review_requests: BTreeMap<u64, ReviewRequest> = review_requests
            .into_iter()
            .map(|review_request| (review_request.id, review_request))
            .collect();
        let last_id = review_requests.keys().max().copied().unwrap_or(0);

        Self {
            review_requests,
            last_id,
            ..Default::default()
        }
    }
}

// Users (with their passwords), groups and repositories; fixed at startup.
#[derive(Debug, Default)]
pub struct DirectoryRecords {
    pub users: Vec<(User, String)>,
    pub groups: Vec<Group>,
    pub repositories: Vec<Repository>,
}

// Application state shared by every handler.
pub struct AppState {
    pub sessions: Arc<Mutex<HashMap<String, Session>>>,
    pub reviews: Arc<Mutex<ReviewRecords>>,
    pub directory: Arc<DirectoryRecords>,
    pub scm: Arc<dyn ScmClient>,
    pub review_request_locks: EntityLocks,
    pub repository_locks: EntityLocks,
    pub site: SiteSettings,
}

impl AppState {
    pub fn new(
        site: SiteSettings,
        directory: DirectoryRecords,
        review_requests: Vec<ReviewRequest>,
        scm: Arc<dyn ScmClient>,
    ) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            reviews: Arc::new(Mutex::new(ReviewRecords::seeded(review_requests))),
            directory: Arc::new(directory),
            scm,
            review_request_locks: EntityLocks::new(),
            repository_locks: EntityLocks::new(),
            site,
        }
    }

    pub fn session_store(&self) -> InMemorySessionStore {
        InMemorySessionStore {
            sessions: self.sessions.clone(),
        }
    }

    pub fn review_store(&self) -> InMemoryReviewStore {
        InMemoryReviewStore {
            records: self.reviews.clone(),
        }
    }

    pub fn directory(&self) -> InMemoryDirectory {
        InMemoryDirectory {
            records: self.directory.clone(),
        }
    }
}

// In-memory session store adapter.
#[derive(Clone)]
pub struct InMemorySessionStore {
    pub sessions: Arc<Mutex<HashMap<String, Session>>>,
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, token: String, session: Session) -> Result<(), String> {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(token, session);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, String> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(token).cloned())
    }

    async fn remove(&self, token: &str) -> Result<bool, String> {
        let mut sessions = self.sessions.lock().await;
        Ok(sessions.remove(token).is_some())
    }

    async fn remove_expired(&self, now: u64) -> Result<usize, String> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.expires_at > now);
        Ok(before - sessions.len())
    }
}

// In-memory review store adapter.
#[derive(Clone)]
pub struct InMemoryReviewStore {
    pub records: Arc<Mutex<ReviewRecords>>,
}

#[async_trait]
impl ReviewStore for InMemoryReviewStore {
    async fn review_request(&self, id: u64) -> Result<Option<ReviewRequest>, String> {
        let records = self.records.lock().await;
        Ok(records.review_requests.get(&id).cloned())
    }

    async fn review_requests(&self) -> Result<Vec<ReviewRequest>, String> {
        let records = self.records.lock().await;
        Ok(records.review_requests.values().cloned().collect())
    }

    async fn allocate_review_request_id(&self) -> Result<u64, String> {
        let mut records = self.records.lock().await;
        records.last_id = records
            .last_id
            .checked_add(1)
            .ok_or_else(|| "review request ids exhausted".to_string())?;
        Ok(records.last_id)
    }

    async fn save_review_request(&self, review_request: ReviewRequest) -> Result<(), String> {
        let mut records = self.records.lock().await;
        records
            .review_requests
            .insert(review_request.id, review_request);
        Ok(())
    }

    async fn draft(&self, review_request_id: u64) -> Result<Option<ReviewRequestDraft>, String> {
        let records = self.records.lock().await;
        Ok(records.drafts.get(&review_request_id).cloned())
    }

    async fn save_draft(&self, draft: ReviewRequestDraft) -> Result<(), String> {
        let mut records = self.records.lock().await;
        records.drafts.insert(draft.review_request_id, draft);
        Ok(())
    }

    async fn delete_draft(&self, review_request_id: u64) -> Result<bool, String> {
        let mut records = self.records.lock().await;
        Ok(records.drafts.remove(&review_request_id).is_some())
    }

    async fn starred(&self, username: &str) -> Result<BTreeSet<u64>, String> {
        let records = self.records.lock().await;
        Ok(records.stars.get(username).cloned().unwrap_or_default())
    }

    async fn set_starred(
        &self,
        username: &str,
        review_request_id: u64,
        starred: bool,
    ) -> Result<(), String> {
        let mut records = self.records.lock().await;
        let stars = records.stars.entry(username.to_string()).or_default();
        if starred {
            stars.insert(review_request_id);
        } else {
            stars.remove(&review_request_id);
        }
        Ok(())
    }
}

// Read-only directory adapter over the startup records.
#[derive(Clone)]
pub struct InMemoryDirectory {
    pub records: Arc<DirectoryRecords>,
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, String> {
        Ok(self
            .records
            .users
            .iter()
            .find(|(user, secret)| user.username == username && secret == password)
            .map(|(user, _)| user.clone()))
    }

    async fn user(&self, username: &str) -> Result<Option<User>, String> {
        Ok(self
            .records
            .users
            .iter()
            .find(|(user, _)| user.username == username)
            .map(|(user, _)| user.clone()))
    }

    async fn users(&self) -> Result<Vec<User>, String> {
        Ok(self
            .records
            .users
            .iter()
            .map(|(user, _)| user.clone())
            .collect())
    }

    async fn group(&self, name: &str) -> Result<Option<Group>, String> {
        let name = name.to_lowercase();
        Ok(self
            .records
            .groups
            .iter()
            .find(|group| {
                group.name.to_lowercase() == name || group.display_name.to_lowercase() == name
            })
            .cloned())
    }

    async fn groups(&self) -> Result<Vec<Group>, String> {
        Ok(self.records.groups.clone())
    }

    async fn repository(&self, id: u64) -> Result<Option<Repository>, String> {
        Ok(self
            .records
            .repositories
            .iter()
            .find(|repository| repository.id == id)
            .cloned())
    }

    async fn repositories(&self) -> Result<Vec<Repository>, String> {
        Ok(self.records.repositories.clone())
    }
}

// System clock adapter used by the use cases.
#[derive(Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
