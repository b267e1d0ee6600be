use std::collections::BTreeMap;

use crate::domain::entities::{Group, Repository, User};
use crate::domain::errors::ReviewError;
use crate::domain::ports::{Directory, ScmClient};
use crate::use_cases::review_requests::check_read_access;

// Superusers see everything; others see public repositories and the
// private ones that name them directly or through a review group.
fn is_accessible(repository: &Repository, caller: Option<&User>, groups: &[Group]) -> bool {
    if repository.public && repository.visible {
        return true;
    }
    let Some(caller) = caller else {
        return false;
    };
    if caller.is_superuser || repository.users.contains(&caller.username) {
        return true;
    }
    groups.iter().any(|group| {
        repository.review_groups.contains(&group.name) && group.has_member(&caller.username)
    })
}

async fn accessible_groups<D>(
    directory: &D,
    caller: Option<&User>,
) -> Result<Vec<Group>, ReviewError>
where
    D: Directory,
{
    if caller.is_none() {
        return Ok(Vec::new());
    }
    directory
        .groups()
        .await
        .map_err(|_| ReviewError::StorageFailure)
}

pub struct ListRepositoriesUseCase<D> {
    pub directory: D,
    pub allow_anonymous: bool,
}

impl<D> ListRepositoriesUseCase<D>
where
    D: Directory,
{
    pub async fn execute(&self, caller: Option<&User>) -> Result<Vec<Repository>, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let groups = accessible_groups(&self.directory, caller).await?;
        let repositories = self
            .directory
            .repositories()
            .await
            .map_err(|_| ReviewError::StorageFailure)?;

        Ok(repositories
            .into_iter()
            .filter(|repository| is_accessible(repository, caller, &groups))
            .collect())
    }
}

pub struct RepositoryInfoUseCase<D, S> {
    pub directory: D,
    pub scm: S,
    pub allow_anonymous: bool,
}

impl<D, S> RepositoryInfoUseCase<D, S>
where
    D: Directory,
    S: ScmClient,
{
    pub async fn execute(
        &self,
        caller: Option<&User>,
        repository_id: u64,
    ) -> Result<BTreeMap<String, String>, ReviewError> {
        check_read_access(caller, self.allow_anonymous)?;

        let repository = self
            .directory
            .repository(repository_id)
            .await
            .map_err(|_| ReviewError::StorageFailure)?
            .ok_or(ReviewError::RepositoryNotFound)?;

        // Inaccessible repositories are indistinguishable from missing ones.
        let groups = accessible_groups(&self.directory, caller).await?;
        if !is_accessible(&repository, caller, &groups) {
            return Err(ReviewError::RepositoryNotFound);
        }

        Ok(self.scm.repository_info(&repository).await?)
    }
}
