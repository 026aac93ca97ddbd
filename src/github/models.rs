use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub id: u64,
}

#[derive(Deserialize, Debug)]
pub struct AccessToken {
    pub token: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
}

impl Repository {
    /// Splits `owner/name` into its two path segments.
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        match self.full_name.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Some((owner, name)),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct RepositoryList {
    pub repositories: Vec<Repository>,
}

#[derive(Serialize, Debug)]
pub struct DispatchRequest<'a> {
    pub event_type: &'a str,
    pub client_payload: &'a Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}
