use crate::domain::entities::{ReviewRequestDraft, User};
use crate::domain::errors::ReviewError;
use crate::domain::fields::{DraftField, FieldValue};
use crate::domain::ports::{Clock, Directory, ReviewStore};
use crate::use_cases::draft_fields::{FieldError, apply_field};
use crate::use_cases::locks::EntityLocks;
use crate::use_cases::review_requests::load_mutable;

// Response returned by the draft field set use case.
#[derive(Debug)]
pub struct SetDraftFieldResponse {
    pub field: DraftField,
    pub value: FieldValue,
}

// Sets one field on a review request draft, creating the draft if needed.
pub struct SetDraftFieldUseCase<C, R, D> {
    pub clock: C,
    pub store: R,
    pub directory: D,
    pub locks: EntityLocks,
}

impl<C, R, D> SetDraftFieldUseCase<C, R, D>
where
    C: Clock,
    R: ReviewStore,
    D: Directory,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        review_request_id: u64,
        field_name: &str,
        value: Option<&str>,
    ) -> Result<SetDraftFieldResponse, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;
        let _guard = self.locks.lock(review_request_id).await;

        let review_request = load_mutable(&self.store, caller, review_request_id).await?;

        let field = DraftField::parse(field_name)
            .ok_or_else(|| ReviewError::UnknownField(field_name.to_string()))?;
        let value = value.ok_or(ReviewError::MissingAttribute("value"))?;

        let now = self.clock.now_epoch_seconds();
        let mut draft = self
            .store
            .draft(review_request_id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .unwrap_or_else(|| ReviewRequestDraft::from_review_request(&review_request, now));

        let value = apply_field(&self.directory, &review_request, &mut draft, field, value)
            .await
            .map_err(|err| match err {
                FieldError::Invalid(detail) => ReviewError::InvalidFieldValue {
                    field: field_name.to_string(),
                    detail,
                },
                FieldError::StorageFailure => ReviewError::StorageFailure,
            })?;

        draft.last_updated = now;
        self.store
            .save_draft(draft)
            .await
            .map_err(|_| ReviewError::StorageFailure)?;

        Ok(SetDraftFieldResponse { field, value })
    }
}
