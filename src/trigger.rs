//! The trigger run: mint an app JWT, enumerate installations, and for each
//! installation exchange a token and dispatch `custom_event` to every
//! repository that has a mapped payload.
//!
//! Calls are strictly sequential. What happens after a failed exchange,
//! listing or dispatch is decided by [`FailurePolicy`].

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::app_state::{AppState, FailurePolicy};
use crate::error::{GithubError, Stage, TriggerError};
use crate::github::jwt::{create_jwt_at, AppToken};
use crate::github::models::{Installation, Repository};

/// Remaining JWT validity below which it is re-minted before an exchange.
pub const JWT_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Default)]
pub struct RunReport {
    pub installations: usize,
    /// Repositories a dispatch was sent to, original casing.
    pub dispatched: Vec<String>,
    /// Repositories with no payload entry, original casing.
    pub skipped: Vec<String>,
    /// Failures tolerated under [`FailurePolicy::Continue`].
    pub failures: Vec<TriggerError>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub async fn run(state: &AppState) -> Result<RunReport, TriggerError> {
    run_with_clock(state, || Utc::now().timestamp()).await
}

/// Same as [`run`], reading unix seconds from `now` for minting and for the
/// refresh check before each installation.
#[instrument(skip_all, fields(app_id = %state.app_id))]
pub async fn run_with_clock<F>(state: &AppState, now: F) -> Result<RunReport, TriggerError>
where
    F: Fn() -> i64,
{
    let mut jwt = mint(state, now())?;

    let installations = state
        .github
        .list_installations(&jwt.token)
        .await
        .map_err(|e| TriggerError::new(Stage::Enumerate, None, e))?;
    info!(count = installations.len(), "found installations");

    let mut report = RunReport {
        installations: installations.len(),
        ..RunReport::default()
    };

    for installation in &installations {
        let checked_at = now();
        if jwt.expires_within(checked_at, JWT_REFRESH_MARGIN_SECS) {
            info!(installation = installation.id, "app JWT close to expiry, re-minting");
            jwt = mint(state, now())?;
        }

        if let Err(e) = process_installation(state, &jwt, installation, &mut report).await {
            tolerate(state.failure_policy, e, &mut report)?;
        }
    }

    info!(
        installations = report.installations,
        dispatched = report.dispatched.len(),
        skipped = report.skipped.len(),
        failed = report.failures.len(),
        "run finished"
    );
    Ok(report)
}

fn mint(state: &AppState, issued_at: i64) -> Result<AppToken, TriggerError> {
    create_jwt_at(&state.app_id, &state.encoding_key, issued_at)
        .map_err(|e| TriggerError::new(Stage::Mint, None, e))
}

#[instrument(skip_all, fields(installation = installation.id))]
async fn process_installation(
    state: &AppState,
    jwt: &AppToken,
    installation: &Installation,
    report: &mut RunReport,
) -> Result<(), TriggerError> {
    let id = Some(installation.id);

    let token = state
        .github
        .create_installation_token(&jwt.token, installation.id)
        .await
        .map_err(|e| TriggerError::new(Stage::Exchange, id, e))?;

    let repositories = state
        .github
        .list_repositories(&token)
        .await
        .map_err(|e| TriggerError::new(Stage::ListRepositories, id, e))?;

    for repo in &repositories {
        if let Err(e) = dispatch_or_skip(state, &token, repo, report).await {
            let e = TriggerError::new(Stage::Dispatch, id, e);
            tolerate(state.failure_policy, e, report)?;
        }
    }

    Ok(())
}

async fn dispatch_or_skip(
    state: &AppState,
    token: &str,
    repo: &Repository,
    report: &mut RunReport,
) -> Result<(), GithubError> {
    let Some(payload) = state.payloads.envelope_for(&repo.full_name) else {
        info!(
            repo = %repo.full_name,
            "No data found for {} in {}, skipping",
            repo.full_name.to_lowercase(),
            state.payloads.source_name()
        );
        report.skipped.push(repo.full_name.clone());
        return Ok(());
    };

    info!(repo = %repo.full_name, "Triggering workflow for {}", repo.full_name);
    state.github.dispatch(token, repo, &payload).await?;
    report.dispatched.push(repo.full_name.clone());
    Ok(())
}

/// Applies the failure policy: `Abort` returns the error, `Continue` records it.
fn tolerate(
    policy: FailurePolicy,
    err: TriggerError,
    report: &mut RunReport,
) -> Result<(), TriggerError> {
    match policy {
        FailurePolicy::Abort => Err(err),
        FailurePolicy::Continue => {
            warn!(error = %err, "continuing after failure");
            report.failures.push(err);
            Ok(())
        }
    }
}
