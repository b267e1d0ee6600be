use crate::domain::entities::{
    PERM_SUBMIT_AS_ANOTHER_USER, Repository, ReviewRequest, ReviewRequestStatus, User,
};
use crate::domain::errors::{ReviewError, ScmError};
use crate::domain::ports::{Clock, Directory, ReviewStore, ScmClient};
use crate::use_cases::locks::EntityLocks;

pub(crate) async fn load_review_request<R>(store: &R, id: u64) -> Result<ReviewRequest, ReviewError>
where
    R: ReviewStore,
{
    store
        .review_request(id)
        .await
        .map_err(|_| ReviewError::StorageFailure)?
        .ok_or(ReviewError::ReviewRequestNotFound)
}

// Load a review request the caller is allowed to modify.
pub(crate) async fn load_mutable<R>(
    store: &R,
    caller: &User,
    id: u64,
) -> Result<ReviewRequest, ReviewError>
where
    R: ReviewStore,
{
    let review_request = load_review_request(store, id).await?;
    if !review_request.is_mutable_by(caller) {
        return Err(ReviewError::PermissionDenied);
    }
    Ok(review_request)
}

// Reads are open to anonymous callers unless the site requires login.
pub(crate) fn check_read_access(
    caller: Option<&User>,
    allow_anonymous: bool,
) -> Result<(), ReviewError> {
    if caller.is_none() && !allow_anonymous {
        return Err(ReviewError::NotLoggedIn);
    }
    Ok(())
}

// A readable review request together with the caller's star on it.
#[derive(Debug)]
pub struct ReviewRequestDetails {
    pub review_request: ReviewRequest,
    pub starred: bool,
}

pub struct GetReviewRequestUseCase<R> {
    pub store: R,
    pub allow_anonymous: bool,
}

impl<R> GetReviewRequestUseCase<R>
where
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        id: u64,
    ) -> Result<ReviewRequestDetails, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let review_request = load_review_request(&self.store, id).await?;
        if !review_request.is_accessible_by(caller) {
            return Err(ReviewError::PermissionDenied);
        }

        // Anonymous callers have no starred set.
        let starred = match caller {
            Some(user) => self
                .store
                .starred(&user.username)
                .await
                .map_err(|_| ReviewError::StorageFailure)?
                .contains(&id),
            None => false,
        };

        Ok(ReviewRequestDetails {
            review_request,
            starred,
        })
    }
}

// Filters accepted by the review request list.
#[derive(Debug, Default)]
pub struct ReviewRequestQuery {
    // None means pending; Some("all") disables status filtering.
    pub status: Option<String>,
    pub from_user: Option<String>,
    pub to_users: Vec<String>,
    pub to_users_directly: Vec<String>,
    // Users whose review groups the request must target.
    pub to_users_groups: Vec<String>,
    pub to_groups: Vec<String>,
    pub repository: Option<u64>,
    pub changenum: Option<u64>,
}

pub struct ListReviewRequestsUseCase<R, D> {
    pub store: R,
    pub directory: D,
    pub allow_anonymous: bool,
}

impl<R, D> ListReviewRequestsUseCase<R, D>
where
    R: ReviewStore,
    D: Directory,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        query: &ReviewRequestQuery,
    ) -> Result<Vec<ReviewRequest>, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let status = match query.status.as_deref() {
            None => Some(ReviewRequestStatus::Pending),
            Some("all") => None,
            Some(value) => Some(
                ReviewRequestStatus::parse(value)
                    .ok_or_else(|| ReviewError::InvalidParameter("status".to_string()))?,
            ),
        };

        let groups = if query.to_users.is_empty() && query.to_users_groups.is_empty() {
            Vec::new()
        } else {
            self.directory
                .groups()
                .await
                .map_err(|_| ReviewError::StorageFailure)?
        };

        let mut matches: Vec<ReviewRequest> = self
            .store
            .review_requests()
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .into_iter()
            .filter(|rr| rr.is_accessible_by(caller))
            .filter(|rr| status.is_none_or(|status| rr.status == status))
            .filter(|rr| query.from_user.as_ref().is_none_or(|user| &rr.submitter == user))
            .filter(|rr| query.repository.is_none_or(|id| rr.repository_id == id))
            .filter(|rr| query.changenum.is_none_or(|n| rr.changenum == Some(n)))
            .filter(|rr| {
                query
                    .to_users_directly
                    .iter()
                    .all(|user| rr.target_people.contains(user))
            })
            .filter(|rr| {
                query.to_groups.iter().all(|group| {
                    rr.target_groups
                        .iter()
                        .any(|target| target.eq_ignore_ascii_case(group))
                })
            })
            .filter(|rr| {
                query.to_users.iter().all(|user| {
                    rr.target_people.contains(user)
                        || groups.iter().any(|group| {
                            group.has_member(user) && rr.target_groups.contains(&group.name)
                        })
                })
            })
            .filter(|rr| {
                query.to_users_groups.iter().all(|user| {
                    groups.iter().any(|group| {
                        group.has_member(user) && rr.target_groups.contains(&group.name)
                    })
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(matches)
    }
}

// Parameters for filing a new review request.
#[derive(Debug, Default)]
pub struct NewReviewRequest {
    // Repository id, path or mirror path.
    pub repository: Option<String>,
    pub changenum: Option<u64>,
    pub submit_as: Option<String>,
}

pub struct CreateReviewRequestUseCase<C, R, D, S> {
    pub clock: C,
    pub store: R,
    pub directory: D,
    pub scm: S,
    // Keyed by repository id so a change number is claimed once.
    pub repository_locks: EntityLocks,
}

impl<C, R, D, S> CreateReviewRequestUseCase<C, R, D, S>
where
    C: Clock,
    R: ReviewStore,
    D: Directory,
    S: ScmClient,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        request: NewReviewRequest,
    ) -> Result<ReviewRequest, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;

        let submitter = match request.submit_as.as_deref() {
            Some(name) if name != caller.username => {
                if !caller.has_perm(PERM_SUBMIT_AS_ANOTHER_USER) {
                    return Err(ReviewError::PermissionDenied);
                }
                self.directory
                    .user(name)
                    .await
                    .map_err(|_| ReviewError::StorageFailure)?
                    .ok_or_else(|| ReviewError::InvalidUser(name.to_string()))?
                    .username
            }
            _ => caller.username.clone(),
        };

        let raw_repository = request
            .repository
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ReviewError::MissingRepository)?;
        let repository = self.resolve_repository(raw_repository).await?;

        let _guard = self.repository_locks.lock(repository.id).await;

        let changeset = match request.changenum {
            Some(changenum) => {
                self.ensure_change_number_unused(&repository, changenum)
                    .await?;
                let changeset = self
                    .scm
                    .changeset(&repository, changenum)
                    .await?
                    .ok_or(ScmError::InvalidChangeNumber(changenum))?;
                if changeset.files.is_empty() {
                    return Err(ScmError::EmptyChangeset(changenum).into());
                }
                Some(changeset)
            }
            None => None,
        };

        let id = self
            .store
            .allocate_review_request_id()
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        let now = self.clock.now_epoch_seconds();

        let mut review_request = ReviewRequest {
            id,
            submitter,
            time_added: now,
            last_updated: now,
            status: ReviewRequestStatus::Pending,
            public: false,
            changenum: request.changenum,
            repository_id: repository.id,
            summary: String::new(),
            description: String::new(),
            testing_done: String::new(),
            bugs_closed: Vec::new(),
            branch: String::new(),
            target_groups: Vec::new(),
            target_people: Vec::new(),
            screenshots: Vec::new(),
        };
        if let Some(changeset) = changeset {
            review_request.summary = changeset.summary;
            review_request.description = changeset.description;
            review_request.testing_done = changeset.testing_done;
            review_request.branch = changeset.branch;
            review_request.bugs_closed = changeset.bugs_closed;
        }

        self.store
            .save_review_request(review_request.clone())
            .await
            .map_err(|_| ReviewError::StorageFailure)?;

        tracing::info!(
            review_request_id = id,
            repository_id = repository.id,
            submitter = %review_request.submitter,
            "review request created"
        );
        Ok(review_request)
    }

    async fn resolve_repository(&self, raw: &str) -> Result<Repository, ReviewError> {
        let found = match raw.parse::<u64>() {
            Ok(id) => self
                .directory
                .repository(id)
                .await
                .map_err(|_| ReviewError::StorageFailure)?,
            Err(_) => self
                .directory
                .repositories()
                .await
                .map_err(|_| ReviewError::StorageFailure)?
                .into_iter()
                .find(|repository| repository.matches_path(raw)),
        };

        found.ok_or_else(|| ReviewError::InvalidRepository(raw.to_string()))
    }

    async fn ensure_change_number_unused(
        &self,
        repository: &Repository,
        changenum: u64,
    ) -> Result<(), ReviewError> {
        let existing = self
            .store
            .review_requests()
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .into_iter()
            .find(|rr| rr.repository_id == repository.id && rr.changenum == Some(changenum));

        match existing {
            Some(review_request) => Err(ReviewError::ChangeNumberInUse(Box::new(review_request))),
            None => Ok(()),
        }
    }
}

pub struct StarReviewRequestUseCase<R> {
    pub store: R,
}

impl<R> StarReviewRequestUseCase<R>
where
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        id: u64,
        starred: bool,
    ) -> Result<(), ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;
        load_review_request(&self.store, id).await?;

        self.store
            .set_starred(&caller.username, id, starred)
            .await
            .map_err(|_| ReviewError::StorageFailure)
    }
}

pub struct CloseReviewRequestUseCase<C, R> {
    pub clock: C,
    pub store: R,
    pub locks: EntityLocks,
}

impl<C, R> CloseReviewRequestUseCase<C, R>
where
    C: Clock,
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        id: u64,
        close_type: Option<&str>,
    ) -> Result<ReviewRequest, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;

        let status = match close_type {
            Some("submitted") => ReviewRequestStatus::Submitted,
            Some("discarded") => ReviewRequestStatus::Discarded,
            other => return Err(ReviewError::InvalidCloseType(other.map(str::to_string))),
        };

        let _guard = self.locks.lock(id).await;
        let mut review_request = load_mutable(&self.store, caller, id).await?;
        review_request.status = status;
        review_request.last_updated = self.clock.now_epoch_seconds();

        self.store
            .save_review_request(review_request.clone())
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        Ok(review_request)
    }
}

pub struct ReopenReviewRequestUseCase<C, R> {
    pub clock: C,
    pub store: R,
    pub locks: EntityLocks,
}

impl<C, R> ReopenReviewRequestUseCase<C, R>
where
    C: Clock,
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        id: u64,
    ) -> Result<ReviewRequest, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;

        let _guard = self.locks.lock(id).await;
        let mut review_request = load_mutable(&self.store, caller, id).await?;
        review_request.status = ReviewRequestStatus::Pending;
        review_request.last_updated = self.clock.now_epoch_seconds();

        self.store
            .save_review_request(review_request.clone())
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        Ok(review_request)
    }
}

// Publishes the pending draft, or a never-published request as it stands.
pub struct PublishReviewRequestUseCase<C, R> {
    pub clock: C,
    pub store: R,
    pub locks: EntityLocks,
}

impl<C, R> PublishReviewRequestUseCase<C, R>
where
    C: Clock,
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        id: u64,
    ) -> Result<ReviewRequest, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;

        let _guard = self.locks.lock(id).await;
        let mut review_request = load_mutable(&self.store, caller, id).await?;
        let draft = self
            .store
            .draft(id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?;

        let now = self.clock.now_epoch_seconds();
        match draft {
            Some(draft) => draft.publish_into(&mut review_request, now),
            None if review_request.public => return Err(ReviewError::NothingToPublish),
            None => {
                review_request.public = true;
                review_request.last_updated = now;
            }
        }

        self.store
            .save_review_request(review_request.clone())
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        self.store
            .delete_draft(id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        Ok(review_request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Changeset, ReviewRequestDraft};
    use std::collections::BTreeSet;
    use crate::use_cases::test_support::{
        FakeScm, FixedClock, RecordingReviewStore, StaticDirectory, test_review_request, test_user,
    };

    fn changeset(number: u64, files: &[&str]) -> Changeset {
        Changeset {
            number,
            summary: "Changeset summary".to_string(),
            description: "Changeset description".to_string(),
            testing_done: "Changeset testing".to_string(),
            branch: "trunk".to_string(),
            bugs_closed: vec!["100".to_string()],
            files: files.iter().map(|file| file.to_string()).collect(),
        }
    }

    fn create_use_case(
        store: RecordingReviewStore,
        scm: FakeScm,
    ) -> CreateReviewRequestUseCase<FixedClock, RecordingReviewStore, StaticDirectory, FakeScm> {
        CreateReviewRequestUseCase {
            clock: FixedClock(1_700_001_000),
            store,
            directory: StaticDirectory::standard(),
            scm,
            repository_locks: EntityLocks::new(),
        }
    }

    fn new_request(repository: &str, changenum: Option<u64>) -> NewReviewRequest {
        NewReviewRequest {
            repository: Some(repository.to_string()),
            changenum,
            submit_as: None,
        }
    }

    #[tokio::test]
    async fn when_request_is_private_then_other_users_get_permission_denied() {
        let use_case = GetReviewRequestUseCase {
            store: RecordingReviewStore::new().with_review_request(test_review_request(7)),
            allow_anonymous: true,
        };

        let bob = test_user("bob");
        let alice = test_user("alice");

        assert!(matches!(
            use_case.execute(Some(&bob), 7).await,
            Err(ReviewError::PermissionDenied)
        ));
        assert!(use_case.execute(Some(&alice), 7).await.is_ok());
        assert!(matches!(
            use_case.execute(Some(&alice), 8).await,
            Err(ReviewError::ReviewRequestNotFound)
        ));
    }

    #[tokio::test]
    async fn when_anonymous_reads_are_disabled_then_get_requires_login() {
        let mut public = test_review_request(7);
        public.public = true;
        let use_case = GetReviewRequestUseCase {
            store: RecordingReviewStore::new().with_review_request(public),
            allow_anonymous: false,
        };

        assert!(matches!(
            use_case.execute(None, 7).await,
            Err(ReviewError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn when_listing_then_filters_and_visibility_apply() {
        let mut public_pending = test_review_request(1);
        public_pending.public = true;
        public_pending.target_groups = vec!["core".to_string()];
        let mut public_submitted = test_review_request(2);
        public_submitted.public = true;
        public_submitted.status = ReviewRequestStatus::Submitted;
        let private_pending = test_review_request(3);

        let use_case = ListReviewRequestsUseCase {
            store: RecordingReviewStore::new()
                .with_review_request(public_pending)
                .with_review_request(public_submitted)
                .with_review_request(private_pending),
            directory: StaticDirectory::standard(),
            allow_anonymous: true,
        };

        let ids = |requests: Vec<ReviewRequest>| requests.iter().map(|rr| rr.id).collect::<Vec<_>>();

        let anonymous = use_case
            .execute(None, &ReviewRequestQuery::default())
            .await
            .expect("expected list to succeed");
        assert_eq!(ids(anonymous), vec![1]);

        let alice = test_user("alice");
        let own = use_case
            .execute(Some(&alice), &ReviewRequestQuery::default())
            .await
            .expect("expected list to succeed");
        assert_eq!(ids(own), vec![3, 1]);

        let all = use_case
            .execute(
                None,
                &ReviewRequestQuery {
                    status: Some("all".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("expected list to succeed");
        assert_eq!(ids(all), vec![2, 1]);

        let to_bob = use_case
            .execute(
                None,
                &ReviewRequestQuery {
                    to_users: vec!["bob".to_string()],
                    ..Default::default()
                },
            )
            .await
            .expect("expected list to succeed");
        assert_eq!(ids(to_bob), vec![1]);
    }

    #[tokio::test]
    async fn when_filtering_by_users_groups_then_direct_targets_do_not_count() {
        let mut via_group = test_review_request(1);
        via_group.public = true;
        via_group.target_groups = vec!["core".to_string()];
        let mut direct = test_review_request(2);
        direct.public = true;
        direct.target_people = vec!["bob".to_string()];

        let use_case = ListReviewRequestsUseCase {
            store: RecordingReviewStore::new()
                .with_review_request(via_group)
                .with_review_request(direct),
            directory: StaticDirectory::standard(),
            allow_anonymous: true,
        };
        let list = |to_users: &[&str], to_users_groups: &[&str]| ReviewRequestQuery {
            to_users: to_users.iter().map(|user| user.to_string()).collect(),
            to_users_groups: to_users_groups.iter().map(|user| user.to_string()).collect(),
            ..Default::default()
        };
        let ids = |requests: Vec<ReviewRequest>| requests.iter().map(|rr| rr.id).collect::<Vec<_>>();

        let to_bob = use_case
            .execute(None, &list(&["bob"], &[]))
            .await
            .expect("expected list to succeed");
        assert_eq!(ids(to_bob), vec![2, 1]);

        let to_bobs_groups = use_case
            .execute(None, &list(&[], &["bob"]))
            .await
            .expect("expected list to succeed");
        assert_eq!(ids(to_bobs_groups), vec![1]);

        let to_alices_groups = use_case
            .execute(None, &list(&[], &["alice"]))
            .await
            .expect("expected list to succeed");
        assert!(to_alices_groups.is_empty());
    }

    #[tokio::test]
    async fn when_status_filter_is_unknown_then_returns_invalid_parameter() {
        let use_case = ListReviewRequestsUseCase {
            store: RecordingReviewStore::new(),
            directory: StaticDirectory::standard(),
            allow_anonymous: true,
        };

        let result = use_case
            .execute(
                None,
                &ReviewRequestQuery {
                    status: Some("open".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(
            result.unwrap_err(),
            ReviewError::InvalidParameter("status".to_string())
        );
    }

    #[tokio::test]
    async fn when_changenum_is_known_then_request_is_prefilled_from_changeset() {
        let store = RecordingReviewStore::new();
        let scm = FakeScm {
            changesets: vec![changeset(1234, &["/trunk/main.c"])],
            ..Default::default()
        };
        let alice = test_user("alice");

        let created = create_use_case(store.clone(), scm)
            .execute(Some(&alice), new_request("/srv/repo-1", Some(1234)))
            .await
            .expect("expected creation to succeed");

        assert_eq!(created.id, 1);
        assert_eq!(created.submitter, "alice");
        assert_eq!(created.summary, "Changeset summary");
        assert_eq!(created.bugs_closed, vec!["100".to_string()]);
        assert_eq!(created.changenum, Some(1234));
        assert!(!created.public);
        assert_eq!(store.saved_review_request(1), Some(created));
    }

    #[tokio::test]
    async fn when_changenum_is_unknown_then_returns_invalid_change_number() {
        let alice = test_user("alice");

        let result = create_use_case(RecordingReviewStore::new(), FakeScm::default())
            .execute(Some(&alice), new_request("1", Some(99)))
            .await;

        assert_eq!(
            result.unwrap_err(),
            ReviewError::Scm(ScmError::InvalidChangeNumber(99))
        );
    }

    #[tokio::test]
    async fn when_changeset_has_no_files_then_returns_empty_changeset() {
        let alice = test_user("alice");
        let scm = FakeScm {
            changesets: vec![changeset(5, &[])],
            ..Default::default()
        };

        let result = create_use_case(RecordingReviewStore::new(), scm)
            .execute(Some(&alice), new_request("1", Some(5)))
            .await;

        assert_eq!(result.unwrap_err(), ReviewError::Scm(ScmError::EmptyChangeset(5)));
    }

    #[tokio::test]
    async fn when_changenum_is_already_used_then_returns_change_number_in_use() {
        let mut existing = test_review_request(3);
        existing.changenum = Some(1234);
        let store = RecordingReviewStore::new().with_review_request(existing.clone());
        let scm = FakeScm {
            changesets: vec![changeset(1234, &["a"])],
            ..Default::default()
        };
        let alice = test_user("alice");

        let result = create_use_case(store, scm)
            .execute(Some(&alice), new_request("1", Some(1234)))
            .await;

        assert_eq!(
            result.unwrap_err(),
            ReviewError::ChangeNumberInUse(Box::new(existing))
        );
    }

    #[tokio::test]
    async fn when_scm_host_key_is_unverified_then_error_is_passed_through() {
        let alice = test_user("alice");
        let failure = ScmError::UnverifiedHostKey {
            hostname: "svn.example.com".to_string(),
            key: vec![1, 2, 3],
        };
        let scm = FakeScm {
            failure: Some(failure.clone()),
            ..Default::default()
        };

        let result = create_use_case(RecordingReviewStore::new(), scm)
            .execute(Some(&alice), new_request("1", Some(1)))
            .await;

        assert_eq!(result.unwrap_err(), ReviewError::Scm(failure));
    }

    #[tokio::test]
    async fn when_repository_is_missing_or_unknown_then_returns_repository_errors() {
        let alice = test_user("alice");
        let use_case = create_use_case(RecordingReviewStore::new(), FakeScm::default());

        assert_eq!(
            use_case
                .execute(Some(&alice), NewReviewRequest::default())
                .await
                .unwrap_err(),
            ReviewError::MissingRepository
        );
        assert_eq!(
            use_case
                .execute(Some(&alice), new_request("/srv/nowhere", None))
                .await
                .unwrap_err(),
            ReviewError::InvalidRepository("/srv/nowhere".to_string())
        );
    }

    #[tokio::test]
    async fn when_submitting_as_another_user_then_permission_is_required() {
        let use_case = create_use_case(RecordingReviewStore::new(), FakeScm::default());
        let alice = test_user("alice");
        let root = User {
            is_superuser: true,
            ..test_user("root")
        };
        let as_bob = |repository: &str| NewReviewRequest {
            repository: Some(repository.to_string()),
            changenum: None,
            submit_as: Some("bob".to_string()),
        };

        assert_eq!(
            use_case.execute(Some(&alice), as_bob("1")).await.unwrap_err(),
            ReviewError::PermissionDenied
        );

        let created = use_case
            .execute(Some(&root), as_bob("1"))
            .await
            .expect("expected superuser to submit as bob");
        assert_eq!(created.submitter, "bob");

        let ghost = NewReviewRequest {
            submit_as: Some("ghost".to_string()),
            ..as_bob("1")
        };
        assert_eq!(
            use_case.execute(Some(&root), ghost).await.unwrap_err(),
            ReviewError::InvalidUser("ghost".to_string())
        );
    }

    #[tokio::test]
    async fn when_starring_then_profile_tracks_the_request() {
        let store = RecordingReviewStore::new().with_review_request(test_review_request(7));
        let use_case = StarReviewRequestUseCase {
            store: store.clone(),
        };
        let bob = test_user("bob");

        use_case
            .execute(Some(&bob), 7, true)
            .await
            .expect("expected star to succeed");
        assert!(store.stars_of("bob").contains(&7));

        use_case
            .execute(Some(&bob), 7, false)
            .await
            .expect("expected unstar to succeed");
        assert!(store.stars_of("bob").is_empty());

        assert!(matches!(
            use_case.execute(Some(&bob), 8, true).await,
            Err(ReviewError::ReviewRequestNotFound)
        ));
    }

    #[tokio::test]
    async fn when_star_changes_then_item_read_reports_it_for_that_caller_only() {
        let mut public = test_review_request(7);
        public.public = true;
        let store = RecordingReviewStore::new().with_review_request(public);
        let star = StarReviewRequestUseCase {
            store: store.clone(),
        };
        let get = GetReviewRequestUseCase {
            store: store.clone(),
            allow_anonymous: true,
        };
        let alice = test_user("alice");
        let bob = test_user("bob");

        let details = get.execute(Some(&alice), 7).await.expect("expected read");
        assert!(!details.starred);

        star.execute(Some(&alice), 7, true)
            .await
            .expect("expected star to succeed");
        assert_eq!(store.stars_of("alice"), BTreeSet::from([7]));
        let details = get.execute(Some(&alice), 7).await.expect("expected read");
        assert!(details.starred);
        assert_eq!(details.review_request.id, 7);
        assert!(!get.execute(Some(&bob), 7).await.expect("expected read").starred);
        assert!(!get.execute(None, 7).await.expect("expected read").starred);

        star.execute(Some(&alice), 7, false)
            .await
            .expect("expected unstar to succeed");
        assert!(store.stars_of("alice").is_empty());
        assert!(!get.execute(Some(&alice), 7).await.expect("expected read").starred);
    }

    #[tokio::test]
    async fn when_closing_with_unknown_type_then_returns_invalid_close_type() {
        let use_case = CloseReviewRequestUseCase {
            clock: FixedClock(1),
            store: RecordingReviewStore::new().with_review_request(test_review_request(7)),
            locks: EntityLocks::new(),
        };
        let alice = test_user("alice");

        assert_eq!(
            use_case
                .execute(Some(&alice), 7, Some("abandoned"))
                .await
                .unwrap_err(),
            ReviewError::InvalidCloseType(Some("abandoned".to_string()))
        );
        assert_eq!(
            use_case.execute(Some(&alice), 7, None).await.unwrap_err(),
            ReviewError::InvalidCloseType(None)
        );
    }

    #[tokio::test]
    async fn when_closed_and_reopened_then_status_round_trips() {
        let store = RecordingReviewStore::new().with_review_request(test_review_request(7));
        let alice = test_user("alice");

        let closed = CloseReviewRequestUseCase {
            clock: FixedClock(5),
            store: store.clone(),
            locks: EntityLocks::new(),
        }
        .execute(Some(&alice), 7, Some("submitted"))
        .await
        .expect("expected close to succeed");
        assert_eq!(closed.status, ReviewRequestStatus::Submitted);

        let reopened = ReopenReviewRequestUseCase {
            clock: FixedClock(6),
            store: store.clone(),
            locks: EntityLocks::new(),
        }
        .execute(Some(&alice), 7)
        .await
        .expect("expected reopen to succeed");
        assert_eq!(reopened.status, ReviewRequestStatus::Pending);
        assert_eq!(store.saved_review_request(7).map(|rr| rr.last_updated), Some(6));
    }

    #[tokio::test]
    async fn when_other_user_closes_then_returns_permission_denied() {
        let use_case = CloseReviewRequestUseCase {
            clock: FixedClock(1),
            store: RecordingReviewStore::new().with_review_request(test_review_request(7)),
            locks: EntityLocks::new(),
        };
        let bob = test_user("bob");

        assert_eq!(
            use_case
                .execute(Some(&bob), 7, Some("discarded"))
                .await
                .unwrap_err(),
            ReviewError::PermissionDenied
        );
    }

    #[tokio::test]
    async fn when_publishing_public_request_without_draft_then_nothing_to_publish() {
        let mut public = test_review_request(7);
        public.public = true;
        let use_case = PublishReviewRequestUseCase {
            clock: FixedClock(1),
            store: RecordingReviewStore::new().with_review_request(public),
            locks: EntityLocks::new(),
        };
        let alice = test_user("alice");

        assert_eq!(
            use_case.execute(Some(&alice), 7).await.unwrap_err(),
            ReviewError::NothingToPublish
        );
    }

    #[tokio::test]
    async fn when_publishing_with_draft_then_draft_is_merged_and_removed() {
        let request = test_review_request(7);
        let mut draft = ReviewRequestDraft::from_review_request(&request, 1);
        draft.summary = "Drafted".to_string();
        let store = RecordingReviewStore::new()
            .with_review_request(request)
            .with_draft(draft);
        let alice = test_user("alice");

        let published = PublishReviewRequestUseCase {
            clock: FixedClock(9),
            store: store.clone(),
            locks: EntityLocks::new(),
        }
        .execute(Some(&alice), 7)
        .await
        .expect("expected publish to succeed");

        assert_eq!(published.summary, "Drafted");
        assert!(published.public);
        assert!(store.saved_draft(7).is_none());
    }
}
