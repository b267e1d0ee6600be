use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use crate::domain::entities::{Changeset, Repository};
use crate::domain::errors::ScmError;
use crate::domain::ports::ScmClient;

// How the connection to a repository's host is trusted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ScmTrust {
    #[default]
    Verified,
    UnverifiedHostKey {
        hostname: String,
        key: Vec<u8>,
    },
    BadHostKey {
        hostname: String,
        expected_key: Vec<u8>,
        key: Vec<u8>,
    },
    UnverifiedHostCert {
        hostname: String,
        fingerprint: String,
    },
    MissingUserKey,
    BadCredentials,
}

impl ScmTrust {
    fn check(&self) -> Result<(), ScmError> {
        match self {
            ScmTrust::Verified => Ok(()),
            ScmTrust::UnverifiedHostKey { hostname, key } => Err(ScmError::UnverifiedHostKey {
                hostname: hostname.clone(),
                key: key.clone(),
            }),
            ScmTrust::BadHostKey {
                hostname,
                expected_key,
                key,
            } => Err(ScmError::BadHostKey {
                hostname: hostname.clone(),
                expected_key: expected_key.clone(),
                key: key.clone(),
            }),
            ScmTrust::UnverifiedHostCert {
                hostname,
                fingerprint,
            } => Err(ScmError::UnverifiedHostCert {
                hostname: hostname.clone(),
                fingerprint: fingerprint.clone(),
            }),
            ScmTrust::MissingUserKey => Err(ScmError::MissingUserKey),
            ScmTrust::BadCredentials => Err(ScmError::AuthenticationFailed),
        }
    }
}

// What the host behind one repository answers.
#[derive(Clone, Debug, Default)]
pub struct ScmProfile {
    pub trust: ScmTrust,
    pub changesets: Vec<Changeset>,
    // None when the tool cannot report repository information.
    pub info: Option<BTreeMap<String, String>>,
}

// SCM adapter answering from per-repository profiles loaded at startup.
#[derive(Clone, Debug, Default)]
pub struct ConfiguredScm {
    profiles: HashMap<u64, ScmProfile>,
}

impl ConfiguredScm {
    pub fn new(profiles: HashMap<u64, ScmProfile>) -> Self {
        Self { profiles }
    }

    fn profile(&self, repository: &Repository) -> Result<&ScmProfile, ScmError> {
        let profile = self.profiles.get(&repository.id).ok_or_else(|| {
            ScmError::Unavailable(format!("no scm configured for {}", repository.name))
        })?;
        profile.trust.check()?;
        Ok(profile)
    }
}

#[async_trait]
impl ScmClient for ConfiguredScm {
    async fn changeset(
        &self,
        repository: &Repository,
        changenum: u64,
    ) -> Result<Option<Changeset>, ScmError> {
        let profile = self.profile(repository)?;
        Ok(profile
            .changesets
            .iter()
            .find(|changeset| changeset.number == changenum)
            .cloned())
    }

    async fn repository_info(
        &self,
        repository: &Repository,
    ) -> Result<BTreeMap<String, String>, ScmError> {
        self.profile(repository)?
            .info
            .clone()
            .ok_or(ScmError::NotImplemented)
    }
}
