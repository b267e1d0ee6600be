use crate::domain::entities::{Group, User};
use crate::domain::errors::ReviewError;
use crate::domain::ports::Directory;
use crate::use_cases::review_requests::check_read_access;

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}

// Search over user accounts. `q` matches a username prefix; with
// `fullname` it also matches a first or last name prefix.
#[derive(Debug, Default)]
pub struct UserQuery {
    pub q: Option<String>,
    pub fullname: bool,
}

impl UserQuery {
    fn matches(&self, user: &User) -> bool {
        let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        starts_with_ignore_case(&user.username, q)
            || (self.fullname
                && (starts_with_ignore_case(&user.first_name, q)
                    || starts_with_ignore_case(&user.last_name, q)))
    }
}

// Search over review groups. `q` matches a name prefix; with
// `displayname` it also matches a display name prefix.
#[derive(Debug, Default)]
pub struct GroupQuery {
    pub q: Option<String>,
    pub displayname: bool,
}

impl GroupQuery {
    fn matches(&self, group: &Group) -> bool {
        let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) else {
            return true;
        };
        starts_with_ignore_case(&group.name, q)
            || (self.displayname && starts_with_ignore_case(&group.display_name, q))
    }
}

pub struct ListUsersUseCase<D> {
    pub directory: D,
    pub allow_anonymous: bool,
}

impl<D> ListUsersUseCase<D>
where
    D: Directory,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        query: &UserQuery,
    ) -> Result<Vec<User>, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let mut users: Vec<User> = self
            .directory
            .users()
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .into_iter()
            .filter(|user| query.matches(user))
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}

pub struct ListGroupsUseCase<D> {
    pub directory: D,
    pub allow_anonymous: bool,
}

impl<D> ListGroupsUseCase<D>
where
    D: Directory,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        query: &GroupQuery,
    ) -> Result<Vec<Group>, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let mut groups: Vec<Group> = self
            .directory
            .groups()
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .into_iter()
            .filter(|group| query.matches(group))
            .collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(groups)
    }
}

// Members of one review group, looked up by its exact name.
pub struct ListGroupUsersUseCase<D> {
    pub directory: D,
    pub allow_anonymous: bool,
}

impl<D> ListGroupUsersUseCase<D>
where
    D: Directory,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        group_name: &str,
    ) -> Result<Vec<User>, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let group = self
            .directory
            .groups()
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .into_iter()
            .find(|group| group.name == group_name)
            .ok_or(ReviewError::GroupNotFound)?;

        let mut members: Vec<User> = self
            .directory
            .users()
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .into_iter()
            .filter(|user| group.has_member(&user.username))
            .collect();
        members.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(members)
    }
}
