use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::GithubError;
use crate::github::models::{AccessToken, DispatchRequest, Installation, Repository, RepositoryList};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
/// Set once on the `reqwest::Client` built in `app_state`.
pub const USER_AGENT: &str = "workflow-trigger";
pub const DISPATCH_EVENT_TYPE: &str = "custom_event";

/// Thin wrapper over the four GitHub REST calls the trigger run makes.
///
/// Only the first page of each list endpoint is read.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    base_url: String,
}

impl GithubClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /app/installations`, authenticated with the app JWT.
    pub async fn list_installations(&self, jwt: &str) -> Result<Vec<Installation>, GithubError> {
        let url = format!("{}/app/installations", self.base_url);
        let res = send(self.http.get(&url), jwt).await?;
        parse_json(res).await
    }

    /// `POST /app/installations/{id}/access_tokens`, authenticated with the app JWT.
    pub async fn create_installation_token(
        &self,
        jwt: &str,
        installation_id: u64,
    ) -> Result<String, GithubError> {
        let url = format!(
            "{}/app/installations/{}/access_tokens",
            self.base_url, installation_id
        );
        let res = send(self.http.post(&url), jwt).await?;
        let token: AccessToken = parse_json(res).await?;
        Ok(token.token)
    }

    /// `GET /installation/repositories`, authenticated with an installation token.
    pub async fn list_repositories(&self, token: &str) -> Result<Vec<Repository>, GithubError> {
        let url = format!("{}/installation/repositories", self.base_url);
        let res = send(self.http.get(&url), token).await?;
        let list: RepositoryList = parse_json(res).await?;
        Ok(list.repositories)
    }

    /// `POST /repos/{owner}/{repo}/dispatches` with event type `custom_event`.
    pub async fn dispatch(
        &self,
        token: &str,
        repo: &Repository,
        client_payload: &Value,
    ) -> Result<(), GithubError> {
        let (owner, name) = repo.owner_and_name().ok_or_else(|| {
            GithubError::InvalidResponse(format!("malformed repository name '{}'", repo.full_name))
        })?;
        let url = format!("{}/repos/{}/{}/dispatches", self.base_url, owner, name);
        let body = DispatchRequest {
            event_type: DISPATCH_EVENT_TYPE,
            client_payload,
        };
        send(self.http.post(&url).json(&body), token).await?;
        Ok(())
    }
}

async fn send(req: RequestBuilder, bearer: &str) -> Result<Response, GithubError> {
    let res = req
        .bearer_auth(bearer)
        .header("Accept", "application/vnd.github+json")
        .header("X-GitHub-Api-Version", "2022-11-28")
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        let message = res.text().await.unwrap_or_default();
        return Err(GithubError::api(status.as_u16(), message));
    }
    Ok(res)
}

async fn parse_json<T: DeserializeOwned>(res: Response) -> Result<T, GithubError> {
    let text = res.text().await?;
    serde_json::from_str(&text).map_err(|e| GithubError::InvalidResponse(e.to_string()))
}
