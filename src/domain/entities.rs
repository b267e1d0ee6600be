use std::collections::{BTreeMap, BTreeSet};

// Permission allowing a user to edit review requests they did not submit.
pub const PERM_EDIT_REVIEW_REQUEST: &str = "reviews.can_edit_reviewrequest";
// Permission allowing a user to file review requests on behalf of others.
pub const PERM_SUBMIT_AS_ANOTHER_USER: &str = "reviews.can_submit_as_another_user";

// Account known to the directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_superuser: bool,
    pub permissions: BTreeSet<String>,
}

impl User {
    pub fn has_perm(&self, permission: &str) -> bool {
        self.is_superuser || self.permissions.contains(permission)
    }
}

// Review group that can be targeted by review requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub display_name: String,
    pub users: Vec<String>,
}

impl Group {
    pub fn has_member(&self, username: &str) -> bool {
        self.users.iter().any(|user| user == username)
    }
}

// Source code repository that review requests are filed against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub mirror_path: String,
    pub tool: String,
    pub public: bool,
    pub visible: bool,
    pub users: Vec<String>,
    pub review_groups: Vec<String>,
}

impl Repository {
    // Matches either the primary path or the mirror path.
    pub fn matches_path(&self, path: &str) -> bool {
        self.path == path || (!self.mirror_path.is_empty() && self.mirror_path == path)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewRequestStatus {
    Pending,
    Submitted,
    Discarded,
}

impl ReviewRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewRequestStatus::Pending => "pending",
            ReviewRequestStatus::Submitted => "submitted",
            ReviewRequestStatus::Discarded => "discarded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ReviewRequestStatus::Pending),
            "submitted" => Some(ReviewRequestStatus::Submitted),
            "discarded" => Some(ReviewRequestStatus::Discarded),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Screenshot {
    pub id: u64,
    pub caption: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewRequest {
    pub id: u64,
    pub submitter: String,
    pub time_added: u64,
    pub last_updated: u64,
    pub status: ReviewRequestStatus,
    pub public: bool,
    pub changenum: Option<u64>,
    pub repository_id: u64,
    pub summary: String,
    pub description: String,
    pub testing_done: String,
    pub bugs_closed: Vec<String>,
    pub branch: String,
    pub target_groups: Vec<String>,
    pub target_people: Vec<String>,
    pub screenshots: Vec<Screenshot>,
}

impl ReviewRequest {
    // Submitters and users with the edit permission may change a request.
    pub fn is_mutable_by(&self, user: &User) -> bool {
        self.submitter == user.username || user.has_perm(PERM_EDIT_REVIEW_REQUEST)
    }

    pub fn is_accessible_by(&self, user: Option<&User>) -> bool {
        self.public || user.is_some_and(|user| self.is_mutable_by(user))
    }

    pub fn screenshot(&self, screenshot_id: u64) -> Option<&Screenshot> {
        self.screenshots
            .iter()
            .find(|screenshot| screenshot.id == screenshot_id)
    }
}

// Staged, unpublished modifications to a review request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewRequestDraft {
    pub review_request_id: u64,
    pub last_updated: u64,
    pub summary: String,
    pub description: String,
    pub testing_done: String,
    pub bugs_closed: Vec<String>,
    pub branch: String,
    pub target_groups: Vec<String>,
    pub target_people: Vec<String>,
    pub changedescription: String,
    pub screenshot_captions: BTreeMap<u64, String>,
}

impl ReviewRequestDraft {
    // Seed a new draft from the current state of its review request.
    pub fn from_review_request(review_request: &ReviewRequest, now: u64) -> Self {
        Self {
            review_request_id: review_request.id,
            last_updated: now,
            summary: review_request.summary.clone(),
            description: review_request.description.clone(),
            testing_done: review_request.testing_done.clone(),
            bugs_closed: review_request.bugs_closed.clone(),
            branch: review_request.branch.clone(),
            target_groups: review_request.target_groups.clone(),
            target_people: review_request.target_people.clone(),
            changedescription: String::new(),
            screenshot_captions: review_request
                .screenshots
                .iter()
                .map(|screenshot| (screenshot.id, screenshot.caption.clone()))
                .collect(),
        }
    }

    // Merge the draft into its review request, making the request public.
    pub fn publish_into(self, review_request: &mut ReviewRequest, now: u64) {
        review_request.summary = self.summary;
        review_request.description = self.description;
        review_request.testing_done = self.testing_done;
        review_request.bugs_closed = self.bugs_closed;
        review_request.branch = self.branch;
        review_request.target_groups = self.target_groups;
        review_request.target_people = self.target_people;

        for screenshot in &mut review_request.screenshots {
            if let Some(caption) = self.screenshot_captions.get(&screenshot.id) {
                screenshot.caption = caption.clone();
            }
        }

        review_request.public = true;
        review_request.last_updated = now;
    }
}

// Authenticated session issued at login.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub expires_at: u64,
}

// Server-side changeset looked up by change number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Changeset {
    pub number: u64,
    pub summary: String,
    pub description: String,
    pub testing_done: String,
    pub branch: String,
    pub bugs_closed: Vec<String>,
    pub files: Vec<String>,
}
