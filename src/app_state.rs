use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use jsonwebtoken::EncodingKey;
use reqwest::Client;

use crate::error::ConfigError;
use crate::github::client::{GithubClient, DEFAULT_API_URL, USER_AGENT};
use crate::payloads::WorkflowPayloads;

pub const DEFAULT_PRIVATE_KEY_PATH: &str = "private_key.pem";
pub const DEFAULT_WORKFLOW_IDS_PATH: &str = "workflow_ids.json";

/// What the run does after a failed exchange, repository listing or dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure.
    #[default]
    Abort,
    /// Skip the failing installation or repository and keep going.
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "continue" => Ok(Self::Continue),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Everything a run needs, built once at startup and never mutated.
pub struct AppState {
    pub github: GithubClient,
    pub encoding_key: EncodingKey,
    pub app_id: String,
    pub payloads: WorkflowPayloads,
    pub failure_policy: FailurePolicy,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("github", &self.github)
            .field("encoding_key", &"[REDACTED]")
            .field("app_id", &self.app_id)
            .field("payloads", &self.payloads.len())
            .field("failure_policy", &self.failure_policy)
            .finish()
    }
}

impl AppState {
    pub fn new(
        app_id: impl Into<String>,
        private_key_pem: &[u8],
        payloads: WorkflowPayloads,
        api_url: &str,
    ) -> Result<Self, ConfigError> {
        let encoding_key =
            EncodingKey::from_rsa_pem(private_key_pem).map_err(|source| ConfigError::InvalidKey {
                path: PathBuf::from("<inline>"),
                source,
            })?;
        Ok(Self {
            github: GithubClient::new(http_client()?, api_url),
            encoding_key,
            app_id: app_id.into(),
            payloads,
            failure_policy: FailurePolicy::default(),
        })
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

pub fn build_app_state() -> Result<AppState, ConfigError> {
    let app_id = env::var("APP_ID").map_err(|_| ConfigError::MissingEnv("APP_ID"))?;
    let app_id = app_id.trim().to_string();
    if app_id.is_empty() {
        return Err(ConfigError::EmptyEnv("APP_ID"));
    }

    let key_path = env_path("PRIVATE_KEY_PATH", DEFAULT_PRIVATE_KEY_PATH);
    let payloads_path = env_path("WORKFLOW_IDS_PATH", DEFAULT_WORKFLOW_IDS_PATH);
    let api_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let failure_policy = match env::var("ON_ERROR") {
        Ok(raw) => raw.parse()?,
        Err(_) => FailurePolicy::default(),
    };

    let encoding_key = load_key(&key_path)?;
    let payloads = WorkflowPayloads::load(&payloads_path)?;

    tracing::info!(
        app_id = %app_id,
        payloads = payloads.len(),
        payloads_path = %payloads_path.display(),
        api_url = %api_url,
        ?failure_policy,
        "configuration loaded"
    );

    Ok(AppState {
        github: GithubClient::new(http_client()?, api_url),
        encoding_key,
        app_id,
        payloads,
        failure_policy,
    })
}

fn env_path(var: &str, default: &str) -> PathBuf {
    env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn load_key(path: &Path) -> Result<EncodingKey, ConfigError> {
    let pem = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    EncodingKey::from_rsa_pem(&pem).map_err(|source| ConfigError::InvalidKey {
        path: path.to_path_buf(),
        source,
    })
}

fn http_client() -> Result<Client, ConfigError> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}
