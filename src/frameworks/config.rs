use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::{env, fmt, fs, io};
use url::Url;

use crate::domain::entities::{
    Changeset, Group, Repository, ReviewRequest, ReviewRequestStatus, Screenshot, User,
};
use crate::interface_adapters::scm::{ScmProfile, ScmTrust};
use crate::interface_adapters::state::{Administrator, DirectoryRecords, SiteSettings};

// Runtime settings: where to listen, what the site looks like and the seed data.

pub fn config_path() -> PathBuf {
    env::var("REVIEW_SERVER_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("review_server.toml"))
}

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: io::Error },
    Parse(toml::de::Error),
    InvalidHost(String),
    InvalidPort(String),
    MissingScmField {
        repository: u64,
        field: &'static str,
    },
    InvalidScmKey {
        repository: u64,
        source: base64::DecodeError,
    },
    InvalidStatus {
        review_request: u64,
        status: String,
    },
    UnknownRepository {
        review_request: u64,
        repository: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "invalid config: {err}"),
            ConfigError::InvalidHost(host) => write!(f, "invalid listen host {host:?}"),
            ConfigError::InvalidPort(port) => write!(f, "invalid listen port {port:?}"),
            ConfigError::MissingScmField { repository, field } => {
                write!(f, "repository {repository}: scm trust needs `{field}`")
            }
            ConfigError::InvalidScmKey { repository, source } => {
                write!(f, "repository {repository}: scm key is not base64: {source}")
            }
            ConfigError::InvalidStatus {
                review_request,
                status,
            } => write!(f, "review request {review_request}: unknown status {status:?}"),
            ConfigError::UnknownRepository {
                review_request,
                repository,
            } => write!(
                f,
                "review request {review_request}: unknown repository {repository}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::InvalidScmKey { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSection,
    pub site: SiteSection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub users: Vec<UserSection>,
    #[serde(default)]
    pub groups: Vec<GroupSection>,
    #[serde(default)]
    pub repositories: Vec<RepositorySection>,
    #[serde(default)]
    pub review_requests: Vec<ReviewRequestSection>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SiteSection {
    pub url: Url,
    #[serde(default)]
    pub administrators: Vec<AdministratorSection>,
    #[serde(default = "default_true")]
    pub allow_anonymous: bool,
}

#[derive(Debug, Deserialize)]
pub struct AdministratorSection {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub ttl_seconds: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self { ttl_seconds: 3600 }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserSection {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroupSection {
    pub name: String,
    // Falls back to the group name.
    pub display_name: Option<String>,
    #[serde(default)]
    pub users: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepositorySection {
    pub id: u64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub mirror_path: String,
    #[serde(default = "default_tool")]
    pub tool: String,
    #[serde(default = "default_true")]
    pub public: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub review_groups: Vec<String>,
    #[serde(default)]
    pub scm: ScmSection,
    #[serde(default)]
    pub changesets: Vec<ChangesetSection>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrustKind {
    #[default]
    Verified,
    UnverifiedHostKey,
    BadHostKey,
    UnverifiedHostCert,
    MissingUserKey,
    BadCredentials,
}

// Keys are base64 encoded in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScmSection {
    pub trust: TrustKind,
    pub hostname: Option<String>,
    pub key: Option<String>,
    pub expected_key: Option<String>,
    pub fingerprint: Option<String>,
    pub info: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
pub struct ChangesetSection {
    pub number: u64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub testing_done: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub bugs_closed: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequestSection {
    pub id: u64,
    pub submitter: String,
    pub repository: u64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_true")]
    pub public: bool,
    pub changenum: Option<u64>,
    #[serde(default)]
    pub time_added: u64,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub testing_done: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub bugs_closed: Vec<String>,
    #[serde(default)]
    pub target_groups: Vec<String>,
    #[serde(default)]
    pub target_people: Vec<String>,
    #[serde(default)]
    pub screenshots: Vec<ScreenshotSection>,
}

#[derive(Debug, Deserialize)]
pub struct ScreenshotSection {
    pub id: u64,
    #[serde(default)]
    pub caption: String,
}

fn default_true() -> bool {
    true
}

fn default_tool() -> String {
    "Subversion".to_string()
}

fn default_status() -> String {
    ReviewRequestStatus::Pending.as_str().to_string()
}

impl Settings {
    // Reads the config file and applies the environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path();
        let contents =
            fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
        Self::from_toml_str(&contents)?.with_env_overrides()
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = env::var("REVIEW_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("REVIEW_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }
        Ok(self)
    }

    pub fn listen_address(&self) -> Result<SocketAddr, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;
        Ok(SocketAddr::new(host, self.server.port))
    }

    pub fn site_settings(&self) -> SiteSettings {
        SiteSettings {
            url: self.site.url.clone(),
            administrators: self
                .site
                .administrators
                .iter()
                .map(|admin| Administrator {
                    name: admin.name.clone(),
                    email: admin.email.clone(),
                })
                .collect(),
            allow_anonymous: self.site.allow_anonymous,
            session_ttl_seconds: self.session.ttl_seconds,
        }
    }

    pub fn directory_records(&self) -> DirectoryRecords {
        let users = self
            .users
            .iter()
            .map(|section| {
                let user = User {
                    username: section.username.clone(),
                    first_name: section.first_name.clone(),
                    last_name: section.last_name.clone(),
                    email: section.email.clone(),
                    is_superuser: section.is_superuser,
                    permissions: section.permissions.iter().cloned().collect(),
                };
                (user, section.password.clone())
            })
            .collect();

        let groups = self
            .groups
            .iter()
            .map(|section| Group {
                name: section.name.clone(),
                display_name: section
                    .display_name
                    .clone()
                    .unwrap_or_else(|| section.name.clone()),
                users: section.users.clone(),
            })
            .collect();

        let repositories = self
            .repositories
            .iter()
            .map(|section| Repository {
                id: section.id,
                name: section.name.clone(),
                path: section.path.clone(),
                mirror_path: section.mirror_path.clone(),
                tool: section.tool.clone(),
                public: section.public,
                visible: section.visible,
                users: section.users.clone(),
                review_groups: section.review_groups.clone(),
            })
            .collect();

        DirectoryRecords {
            users,
            groups,
            repositories,
        }
    }

    pub fn scm_profiles(&self) -> Result<HashMap<u64, ScmProfile>, ConfigError> {
        self.repositories
            .iter()
            .map(|section| {
                let profile = ScmProfile {
                    trust: section.scm.trust(section.id)?,
                    changesets: section
                        .changesets
                        .iter()
                        .map(ChangesetSection::to_changeset)
                        .collect(),
                    info: section.scm.info.clone(),
                };
                Ok((section.id, profile))
            })
            .collect()
    }

    pub fn review_requests(&self) -> Result<Vec<ReviewRequest>, ConfigError> {
        self.review_requests
            .iter()
            .map(|section| {
                if !self
                    .repositories
                    .iter()
                    .any(|repository| repository.id == section.repository)
                {
                    return Err(ConfigError::UnknownRepository {
                        review_request: section.id,
                        repository: section.repository,
                    });
                }

                let status = ReviewRequestStatus::parse(&section.status).ok_or_else(|| {
                    ConfigError::InvalidStatus {
                        review_request: section.id,
                        status: section.status.clone(),
                    }
                })?;

                Ok(ReviewRequest {
                    id: section.id,
                    submitter: section.submitter.clone(),
                    time_added: section.time_added,
                    last_updated: section.time_added,
                    status,
                    public: section.public,
                    changenum: section.changenum,
                    repository_id: section.repository,
                    summary: section.summary.clone(),
                    description: section.description.clone(),
                    testing_done: section.testing_done.clone(),
                    bugs_closed: section.bugs_closed.clone(),
                    branch: section.branch.clone(),
                    target_groups: section.target_groups.clone(),
                    target_people: section.target_people.clone(),
                    screenshots: section
                        .screenshots
                        .iter()
                        .map(|screenshot| Screenshot {
                            id: screenshot.id,
                            caption: screenshot.caption.clone(),
                        })
                        .collect(),
                })
            })
            .collect()
    }
}

impl ScmSection {
    fn trust(&self, repository: u64) -> Result<ScmTrust, ConfigError> {
        let required = |value: &Option<String>, field: &'static str| {
            value
                .clone()
                .ok_or(ConfigError::MissingScmField { repository, field })
        };
        let decode = |value: &Option<String>, field: &'static str| {
            STANDARD
                .decode(required(value, field)?)
                .map_err(|source| ConfigError::InvalidScmKey { repository, source })
        };

        let trust = match self.trust {
            TrustKind::Verified => ScmTrust::Verified,
            TrustKind::UnverifiedHostKey => ScmTrust::UnverifiedHostKey {
                hostname: required(&self.hostname, "hostname")?,
                key: decode(&self.key, "key")?,
            },
            TrustKind::BadHostKey => ScmTrust::BadHostKey {
                hostname: required(&self.hostname, "hostname")?,
                expected_key: decode(&self.expected_key, "expected_key")?,
                key: decode(&self.key, "key")?,
            },
            TrustKind::UnverifiedHostCert => ScmTrust::UnverifiedHostCert {
                hostname: required(&self.hostname, "hostname")?,
                fingerprint: required(&self.fingerprint, "fingerprint")?,
            },
            TrustKind::MissingUserKey => ScmTrust::MissingUserKey,
            TrustKind::BadCredentials => ScmTrust::BadCredentials,
        };

        Ok(trust)
    }
}

impl ChangesetSection {
    fn to_changeset(&self) -> Changeset {
        Changeset {
            number: self.number,
            summary: self.summary.clone(),
            description: self.description.clone(),
            testing_done: self.testing_done.clone(),
            branch: self.branch.clone(),
            bugs_closed: self.bugs_closed.clone(),
            files: self.files.clone(),
        }
    }
}
