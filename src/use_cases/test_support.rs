use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::entities::{
    Changeset, Group, Repository, ReviewRequest, ReviewRequestDraft, ReviewRequestStatus,
    Screenshot, Session, User,
};
use crate::domain::errors::ScmError;
use crate::domain::ports::{Clock, Directory, ReviewStore, ScmClient, SessionStore};

pub(crate) type SessionTable = Arc<Mutex<HashMap<String, Session>>>;

// Shared fixed time source for deterministic use-case tests.
pub(crate) struct FixedClock(pub(crate) u64);

impl Clock for FixedClock {
    fn now_epoch_seconds(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Default)]
pub(crate) struct FailureFlags {
    pub insert: bool,
    pub get: bool,
    pub remove: bool,
    pub prune: bool,
}

#[derive(Clone)]
pub(crate) struct RecordingStore {
    sessions: SessionTable,
    failures: FailureFlags,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            failures: FailureFlags::default(),
        }
    }

    pub(crate) fn with_failures(mut self, failures: FailureFlags) -> Self {
        self.failures = failures;
        self
    }

    pub(crate) fn insert_test_session(&self, token: impl Into<String>, session: Session) {
        let mut guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.insert(token.into(), session);
    }

    pub(crate) fn get_test_session(&self, token: &str) -> Option<Session> {
        let guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.get(token).cloned()
    }

    pub(crate) fn session_count(&self) -> usize {
        self.sessions.lock().expect("sessions mutex poisoned").len()
    }
}

#[async_trait]
impl SessionStore for RecordingStore {
    async fn insert(&self, token: String, session: Session) -> Result<(), String> {
        if self.failures.insert {
            return Err("insert failed".to_string());
        }

        let mut guard = self.sessions.lock().expect("sessions mutex poisoned");
        guard.insert(token, session);
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<Session>, String> {
        if self.failures.get {
            return Err("get failed".to_string());
        }

        let guard = self.sessions.lock().expect("sessions mutex poisoned");
        Ok(guard.get(token).cloned())
    }

    async fn remove(&self, token: &str) -> Result<bool, String> {
        if self.failures.remove {
            return Err("remove failed".to_string());
        }

        let mut guard = self.sessions.lock().expect("sessions mutex poisoned");
        Ok(guard.remove(token).is_some())
    }

    async fn remove_expired(&self, now: u64) -> Result<usize, String> {
        if self.failures.prune {
            return Err("prune failed".to_string());
        }

        let mut guard = self.sessions.lock().expect("sessions mutex poisoned");
        let before = guard.len();
        guard.retain(|_, session| session.expires_at > now);
        Ok(before - guard.len())
    }
}

#[derive(Default)]
struct ReviewTables {
    review_requests: BTreeMap<u64, ReviewRequest>,
    drafts: BTreeMap<u64, ReviewRequestDraft>,
    stars: HashMap<String, BTreeSet<u64>>,
    last_allocated_id: u64,
}

// Review store fake that lets tests seed and inspect saved records.
#[derive(Clone, Default)]
pub(crate) struct RecordingReviewStore {
    tables: Arc<Mutex<ReviewTables>>,
    fail_writes: bool,
}

impl RecordingReviewStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub(crate) fn with_review_request(self, review_request: ReviewRequest) -> Self {
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .review_requests
            .insert(review_request.id, review_request);
        self
    }

    pub(crate) fn with_draft(self, draft: ReviewRequestDraft) -> Self {
        self.tables
            .lock()
            .expect("tables mutex poisoned")
            .drafts
            .insert(draft.review_request_id, draft);
        self
    }

    pub(crate) fn saved_review_request(&self, id: u64) -> Option<ReviewRequest> {
        let tables = self.tables.lock().expect("tables mutex poisoned");
        tables.review_requests.get(&id).cloned()
    }

    pub(crate) fn saved_draft(&self, id: u64) -> Option<ReviewRequestDraft> {
        let tables = self.tables.lock().expect("tables mutex poisoned");
        tables.drafts.get(&id).cloned()
    }

    pub(crate) fn stars_of(&self, username: &str) -> BTreeSet<u64> {
        let tables = self.tables.lock().expect("tables mutex poisoned");
        tables.stars.get(username).cloned().unwrap_or_default()
    }

    fn check_write(&self) -> Result<(), String> {
        if self.fail_writes {
            return Err("write failed".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for RecordingReviewStore {
    async fn review_request(&self, id: u64) -> Result<Option<ReviewRequest>, String> {
        Ok(self.saved_review_request(id))
    }

    async fn review_requests(&self) -> Result<Vec<ReviewRequest>, String> {
        let tables = self.tables.lock().expect("tables mutex poisoned");
        Ok(tables.review_requests.values().cloned().collect())
    }

    async fn allocate_review_request_id(&self) -> Result<u64, String> {
        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        let seeded = tables.review_requests.keys().max().copied().unwrap_or(0);
        tables.last_allocated_id = tables.last_allocated_id.max(seeded) + 1;
        Ok(tables.last_allocated_id)
    }

    async fn save_review_request(&self, review_request: ReviewRequest) -> Result<(), String> {
        self.check_write()?;
        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        tables
            .review_requests
            .insert(review_request.id, review_request);
        Ok(())
    }

    async fn draft(&self, review_request_id: u64) -> Result<Option<ReviewRequestDraft>, String> {
        Ok(self.saved_draft(review_request_id))
    }

    async fn save_draft(&self, draft: ReviewRequestDraft) -> Result<(), String> {
        self.check_write()?;
        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        tables.drafts.insert(draft.review_request_id, draft);
        Ok(())
    }

    async fn delete_draft(&self, review_request_id: u64) -> Result<bool, String> {
        self.check_write()?;
        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        Ok(tables.drafts.remove(&review_request_id).is_some())
    }

    async fn starred(&self, username: &str) -> Result<BTreeSet<u64>, String> {
        Ok(self.stars_of(username))
    }

    async fn set_starred(
        &self,
        username: &str,
        review_request_id: u64,
        starred: bool,
    ) -> Result<(), String> {
        self.check_write()?;
        let mut tables = self.tables.lock().expect("tables mutex poisoned");
        let stars = tables.stars.entry(username.to_string()).or_default();
        if starred {
            stars.insert(review_request_id);
        } else {
            stars.remove(&review_request_id);
        }
        Ok(())
    }
}

// Directory fake seeded with a fixed cast of users, groups and repositories.
#[derive(Clone, Default)]
pub(crate) struct StaticDirectory {
    pub users: Vec<(User, String)>,
    pub groups: Vec<Group>,
    pub repositories: Vec<Repository>,
}

impl StaticDirectory {
    // alice submits, bob reviews, root is a superuser; one public repository.
    pub(crate) fn standard() -> Self {
        Self {
            users: vec![
                (test_user("alice"), "alice-password".to_string()),
                (test_user("bob"), "bob-password".to_string()),
                (
                    User {
                        is_superuser: true,
                        ..test_user("root")
                    },
                    "root-password".to_string(),
                ),
            ],
            groups: vec![Group {
                name: "core".to_string(),
                display_name: "Core Team".to_string(),
                users: vec!["bob".to_string()],
            }],
            repositories: vec![test_repository(1)],
        }
    }
}

#[async_trait]
impl Directory for StaticDirectory {
    async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, String> {
        Ok(self
            .users
            .iter()
            .find(|(user, secret)| user.username == username && secret == password)
            .map(|(user, _)| user.clone()))
    }

    async fn user(&self, username: &str) -> Result<Option<User>, String> {
        Ok(self
            .users
            .iter()
            .find(|(user, _)| user.username == username)
            .map(|(user, _)| user.clone()))
    }

    async fn users(&self) -> Result<Vec<User>, String> {
        Ok(self.users.iter().map(|(user, _)| user.clone()).collect())
    }

    async fn group(&self, name: &str) -> Result<Option<Group>, String> {
        Ok(self
            .groups
            .iter()
            .find(|group| {
                group.name.eq_ignore_ascii_case(name)
                    || group.display_name.eq_ignore_ascii_case(name)
            })
            .cloned())
    }

    async fn groups(&self) -> Result<Vec<Group>, String> {
        Ok(self.groups.clone())
    }

    async fn repository(&self, id: u64) -> Result<Option<Repository>, String> {
        Ok(self.repositories.iter().find(|repo| repo.id == id).cloned())
    }

    async fn repositories(&self) -> Result<Vec<Repository>, String> {
        Ok(self.repositories.clone())
    }
}

// SCM fake answering from a changeset table, or failing every call.
#[derive(Clone, Default)]
pub(crate) struct FakeScm {
    pub changesets: Vec<Changeset>,
    pub info: BTreeMap<String, String>,
    pub failure: Option<ScmError>,
}

#[async_trait]
impl ScmClient for FakeScm {
    async fn changeset(
        &self,
        _repository: &Repository,
        changenum: u64,
    ) -> Result<Option<Changeset>, ScmError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self
            .changesets
            .iter()
            .find(|changeset| changeset.number == changenum)
            .cloned())
    }

    async fn repository_info(
        &self,
        _repository: &Repository,
    ) -> Result<BTreeMap<String, String>, ScmError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        Ok(self.info.clone())
    }
}

pub(crate) fn test_user(username: &str) -> User {
    User {
        username: username.to_string(),
        first_name: String::new(),
        last_name: String::new(),
        email: format!("{username}@example.com"),
        is_superuser: false,
        permissions: BTreeSet::new(),
    }
}

pub(crate) fn test_repository(id: u64) -> Repository {
    Repository {
        id,
        name: format!("repo-{id}"),
        path: format!("/srv/repo-{id}"),
        mirror_path: String::new(),
        tool: "Subversion".to_string(),
        public: true,
        visible: true,
        users: Vec::new(),
        review_groups: Vec::new(),
    }
}

// Pending, unpublished request owned by alice with screenshot 42.
pub(crate) fn test_review_request(id: u64) -> ReviewRequest {
    ReviewRequest {
        id,
        submitter: "alice".to_string(),
        time_added: 1_700_000_000,
        last_updated: 1_700_000_000,
        status: ReviewRequestStatus::Pending,
        public: false,
        changenum: None,
        repository_id: 1,
        summary: "Initial summary".to_string(),
        description: "Initial description".to_string(),
        testing_done: String::new(),
        bugs_closed: Vec::new(),
        branch: "main".to_string(),
        target_groups: Vec::new(),
        target_people: Vec::new(),
        screenshots: vec![Screenshot {
            id: 42,
            caption: "Login dialog".to_string(),
        }],
    }
}
