use crate::domain::entities::{ReviewRequest, ReviewRequestDraft, User};
use crate::domain::errors::ReviewError;
use crate::domain::ports::{Clock, ReviewStore};
use crate::use_cases::locks::EntityLocks;
use crate::use_cases::review_requests::{load_mutable, load_review_request};

async fn load_draft<R>(
    store: &R,
    review_request_id: u64,
) -> Result<ReviewRequestDraft, ReviewError>
where
    R: ReviewStore,
{
    store
        .draft(review_request_id)
        .await
        .map_err(|_| ReviewError::StorageFailure)?
        .ok_or(ReviewError::DraftNotFound)
}

// A draft must exist before the caller's permission on it is considered.
async fn load_owned_draft<R>(
    store: &R,
    caller: &User,
    review_request_id: u64,
) -> Result<(ReviewRequest, ReviewRequestDraft), ReviewError>
where
    R: ReviewStore,
{
    let review_request = load_review_request(store, review_request_id).await?;
    let draft = load_draft(store, review_request_id).await?;
    if !review_request.is_mutable_by(caller) {
        return Err(ReviewError::PermissionDenied);
    }
    Ok((review_request, draft))
}

pub struct GetDraftUseCase<R> {
    pub store: R,
}

impl<R> GetDraftUseCase<R>
where
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        review_request_id: u64,
    ) -> Result<ReviewRequestDraft, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;
        load_mutable(&self.store, caller, review_request_id).await?;
        load_draft(&self.store, review_request_id).await
    }
}

pub struct DiscardDraftUseCase<R> {
    pub store: R,
    pub locks: EntityLocks,
}

impl<R> DiscardDraftUseCase<R>
where
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        review_request_id: u64,
    ) -> Result<(), ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;
        let _guard = self.locks.lock(review_request_id).await;

        load_owned_draft(&self.store, caller, review_request_id).await?;
        self.store
            .delete_draft(review_request_id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?;

        tracing::info!(review_request_id, "draft discarded");
        Ok(())
    }
}

pub struct PublishDraftUseCase<C, R> {
    pub clock: C,
    pub store: R,
    pub locks: EntityLocks,
}

impl<C, R> PublishDraftUseCase<C, R>
where
    C: Clock,
    R: ReviewStore,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        review_request_id: u64,
    ) -> Result<ReviewRequest, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;
        let _guard = self.locks.lock(review_request_id).await;

        let (mut review_request, draft) =
            load_owned_draft(&self.store, caller, review_request_id).await?;
        draft.publish_into(&mut review_request, self.clock.now_epoch_seconds());

        self.store
            .save_review_request(review_request.clone())
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        self.store
            .delete_draft(review_request_id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?;

        tracing::info!(review_request_id, "draft published");
        Ok(review_request)
    }
}
