use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnv(&'static str),

    #[error("{0} is empty")]
    EmptyEnv(&'static str),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid RSA private key in {path}: {source}")]
    InvalidKey {
        path: PathBuf,
        #[source]
        source: jsonwebtoken::errors::Error,
    },

    #[error("invalid payload map in {path}: {source}")]
    InvalidPayloads {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unknown failure policy '{0}' (expected 'abort' or 'continue')")]
    UnknownPolicy(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Errors from a single GitHub API call or from signing the app assertion.
#[derive(Debug, Error)]
pub enum GithubError {
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("invalid response from GitHub: {0}")]
    InvalidResponse(String),
}

impl GithubError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Mint,
    Enumerate,
    Exchange,
    ListRepositories,
    Dispatch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Mint => "mint app token",
            Stage::Enumerate => "list installations",
            Stage::Exchange => "exchange installation token",
            Stage::ListRepositories => "list repositories",
            Stage::Dispatch => "dispatch event",
        };
        f.write_str(name)
    }
}

/// A pipeline failure tagged with the stage and installation it happened in.
#[derive(Debug, Error)]
pub struct TriggerError {
    pub stage: Stage,
    pub installation: Option<u64>,
    #[source]
    pub source: GithubError,
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.installation {
            Some(id) => write!(f, "{} failed for installation {}: {}", self.stage, id, self.source),
            None => write!(f, "{} failed: {}", self.stage, self.source),
        }
    }
}

impl TriggerError {
    pub fn new(stage: Stage, installation: Option<u64>, source: GithubError) -> Self {
        Self {
            stage,
            installation,
            source,
        }
    }
}
