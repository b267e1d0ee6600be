use std::collections::BTreeMap;

use crate::domain::entities::{ReviewRequestDraft, User};
use crate::domain::errors::ReviewError;
use crate::domain::fields::DraftField;
use crate::domain::ports::{Clock, Directory, ReviewStore};
use crate::use_cases::draft_fields::{FieldError, apply_field};
use crate::use_cases::locks::EntityLocks;
use crate::use_cases::review_requests::load_mutable;

// Form keys that carry request plumbing rather than draft fields.
const IGNORED_KEYS: [&str; 3] = ["action", "method", "callback"];

// Sets several draft fields at once; either every field applies or none do.
pub struct UpdateDraftUseCase<C, R, D> {
    pub clock: C,
    pub store: R,
    pub directory: D,
    pub locks: EntityLocks,
}

impl<C, R, D> UpdateDraftUseCase<C, R, D>
where
    C: Clock,
    R: ReviewStore,
    D: Directory,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        review_request_id: u64,
        fields: &BTreeMap<String, String>,
    ) -> Result<ReviewRequestDraft, ReviewError> {
        let caller = caller.ok_or(ReviewError::NotLoggedIn)?;
        let _guard = self.locks.lock(review_request_id).await;

        let review_request = load_mutable(&self.store, caller, review_request_id).await?;

        let now = self.clock.now_epoch_seconds();
        let mut draft = self
            .store
            .draft(review_request_id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .unwrap_or_else(|| ReviewRequestDraft::from_review_request(&review_request, now));

        let mut invalid = BTreeMap::new();
        for (name, value) in fields {
            if IGNORED_KEYS.contains(&name.as_str()) {
                continue;
            }

            let Some(field) = DraftField::parse(name) else {
                invalid.insert(name.clone(), vec!["Field is not supported".to_string()]);
                continue;
            };

            match apply_field(&self.directory, &review_request, &mut draft, field, value).await {
                Ok(_) => {}
                Err(FieldError::Invalid(detail)) => {
                    invalid.insert(name.clone(), detail);
                }
                Err(FieldError::StorageFailure) => return Err(ReviewError::StorageFailure),
            }
        }

        if !invalid.is_empty() {
            return Err(ReviewError::InvalidFields(invalid));
        }

        draft.last_updated = now;
        self.store
            .save_draft(draft.clone())
            .await
            .map_err(|_| ReviewError::StorageFailure)?;
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{
        FixedClock, RecordingReviewStore, StaticDirectory, test_review_request, test_user,
    };

    fn use_case(
        store: RecordingReviewStore,
    ) -> UpdateDraftUseCase<FixedClock, RecordingReviewStore, StaticDirectory> {
        UpdateDraftUseCase {
            clock: FixedClock(1_700_000_700),
            store,
            directory: StaticDirectory::standard(),
            locks: EntityLocks::new(),
        }
    }

    fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn when_all_fields_are_valid_then_they_are_saved_together() {
        let store = RecordingReviewStore::new().with_review_request(test_review_request(7));
        let alice = test_user("alice");

        let draft = use_case(store.clone())
            .execute(
                Some(&alice),
                7,
                &form(&[
                    ("action", "set"),
                    ("summary", "Batch summary"),
                    ("bugs_closed", "#9"),
                    ("target_groups", "Core Team"),
                ]),
            )
            .await
            .expect("expected update to succeed");

        assert_eq!(draft.summary, "Batch summary");
        assert_eq!(draft.bugs_closed, vec!["9".to_string()]);
        assert_eq!(draft.target_groups, vec!["core".to_string()]);
        assert_eq!(store.saved_draft(7), Some(draft));
    }

    #[tokio::test]
    async fn when_any_field_is_invalid_then_nothing_is_saved() {
        let store = RecordingReviewStore::new().with_review_request(test_review_request(7));
        let alice = test_user("alice");

        let result = use_case(store.clone())
            .execute(
                Some(&alice),
                7,
                &form(&[
                    ("summary", "Fine"),
                    ("colour", "blue"),
                    ("target_people", "bob, nobody"),
                ]),
            )
            .await;

        let mut expected = BTreeMap::new();
        expected.insert("colour".to_string(), vec!["Field is not supported".to_string()]);
        expected.insert("target_people".to_string(), vec!["nobody".to_string()]);
        assert_eq!(result.unwrap_err(), ReviewError::InvalidFields(expected));
        assert!(store.saved_draft(7).is_none());
    }

    #[tokio::test]
    async fn when_caller_is_anonymous_then_returns_not_logged_in() {
        let result = use_case(RecordingReviewStore::new())
            .execute(None, 7, &form(&[("summary", "x")]))
            .await;

        assert_eq!(result.unwrap_err(), ReviewError::NotLoggedIn);
    }
}
