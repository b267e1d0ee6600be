use crate::domain::entities::{ReviewRequest, ReviewRequestDraft};
use crate::domain::fields::{DraftField, FieldValue};
use crate::domain::ports::Directory;

// Why a single field could not be applied to a draft.
#[derive(Debug, PartialEq, Eq)]
pub enum FieldError {
    Invalid(Vec<String>),
    StorageFailure,
}

// Validate `value` for `field` and store it on the draft.
// Returns the stored representation; the draft is untouched on error.
pub async fn apply_field<D>(
    directory: &D,
    review_request: &ReviewRequest,
    draft: &mut ReviewRequestDraft,
    field: DraftField,
    value: &str,
) -> Result<FieldValue, FieldError>
where
    D: Directory,
{
    match field {
        DraftField::Summary => {
            if value.contains('\n') {
                return Err(FieldError::Invalid(vec![
                    "Summary cannot contain newlines".to_string(),
                ]));
            }
            draft.summary = value.to_string();
            Ok(FieldValue::Text(draft.summary.clone()))
        }
        DraftField::Description => {
            draft.description = value.to_string();
            Ok(FieldValue::Text(draft.description.clone()))
        }
        DraftField::TestingDone => {
            draft.testing_done = value.to_string();
            Ok(FieldValue::Text(draft.testing_done.clone()))
        }
        DraftField::Branch => {
            draft.branch = value.to_string();
            Ok(FieldValue::Text(draft.branch.clone()))
        }
        DraftField::ChangeDescription => {
            draft.changedescription = value.to_string();
            Ok(FieldValue::Text(draft.changedescription.clone()))
        }
        DraftField::BugsClosed => {
            draft.bugs_closed = sanitize_bug_ids(value);
            Ok(FieldValue::List(draft.bugs_closed.clone()))
        }
        DraftField::TargetGroups => {
            let mut names = Vec::new();
            let mut invalid = Vec::new();
            for entry in split_entries(value) {
                match directory.group(entry).await {
                    Ok(Some(group)) => push_unique(&mut names, group.name),
                    Ok(None) => invalid.push(entry.to_string()),
                    Err(_) => return Err(FieldError::StorageFailure),
                }
            }
            if !invalid.is_empty() {
                return Err(FieldError::Invalid(invalid));
            }
            draft.target_groups = names;
            Ok(FieldValue::List(draft.target_groups.clone()))
        }
        DraftField::TargetPeople => {
            let mut names = Vec::new();
            let mut invalid = Vec::new();
            for entry in split_entries(value) {
                match directory.user(entry).await {
                    Ok(Some(user)) => push_unique(&mut names, user.username),
                    Ok(None) => invalid.push(entry.to_string()),
                    Err(_) => return Err(FieldError::StorageFailure),
                }
            }
            if !invalid.is_empty() {
                return Err(FieldError::Invalid(invalid));
            }
            draft.target_people = names;
            Ok(FieldValue::List(draft.target_people.clone()))
        }
        DraftField::ScreenshotCaption(screenshot_id) => {
            if review_request.screenshot(screenshot_id).is_none() {
                return Err(FieldError::Invalid(vec![format!(
                    "Screenshot with ID {screenshot_id} does not exist"
                )]));
            }
            draft
                .screenshot_captions
                .insert(screenshot_id, value.to_string());
            Ok(FieldValue::Text(value.to_string()))
        }
    }
}

// Read a field back in the same representation `apply_field` returns.
pub fn read_field(draft: &ReviewRequestDraft, field: DraftField) -> Option<FieldValue> {
    let value = match field {
        DraftField::Summary => FieldValue::Text(draft.summary.clone()),
        DraftField::Description => FieldValue::Text(draft.description.clone()),
        DraftField::TestingDone => FieldValue::Text(draft.testing_done.clone()),
        DraftField::Branch => FieldValue::Text(draft.branch.clone()),
        DraftField::ChangeDescription => FieldValue::Text(draft.changedescription.clone()),
        DraftField::BugsClosed => FieldValue::List(draft.bugs_closed.clone()),
        DraftField::TargetGroups => FieldValue::List(draft.target_groups.clone()),
        DraftField::TargetPeople => FieldValue::List(draft.target_people.clone()),
        DraftField::ScreenshotCaption(id) => {
            FieldValue::Text(draft.screenshot_captions.get(&id)?.clone())
        }
    };

    Some(value)
}

// Comma separated entries with surrounding whitespace and empties dropped.
fn split_entries(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
}

// Bug ids are stored without a leading `#`, which many people habitually type.
pub fn sanitize_bug_ids(value: &str) -> Vec<String> {
    split_entries(value)
        .map(|bug| bug.strip_prefix('#').unwrap_or(bug).to_string())
        .filter(|bug| !bug.is_empty())
        .collect()
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !names.contains(&name) {
        names.push(name);
    }
}
