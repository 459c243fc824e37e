//! Entitlement pre-flight check.
//!
//! Before any secret is fetched, dredge asks the licensing endpoint
//! whether the current repository may use this step. Only an explicit
//! 403 stops the run; timeouts, transport failures, and other statuses
//! are logged and ignored so a licensing outage never blocks a
//! pipeline.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Default licensing endpoint; override with the `entitlement_url`
/// input (tests point it at a local server).
pub const DEFAULT_ENDPOINT: &str = "https://licensing.usemantle.com/v1/entitlement";

/// The check must not materially delay the pipeline.
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of the pre-flight call.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Explicitly allowed.
    Allowed,
    /// Explicitly forbidden; the run must abort.
    Denied,
    /// Anything else: treat as soft failure and proceed.
    Unknown(String),
}

/// Classify the HTTP outcome of the check.
///
/// `None` means the request never produced a status (timeout, DNS
/// failure, connection refused).
pub fn classify(status: Option<u16>) -> Verdict {
    match status {
        Some(403) => Verdict::Denied,
        Some(s) if (200..300).contains(&s) => Verdict::Allowed,
        Some(s) => Verdict::Unknown(format!("HTTP {}", s)),
        None => Verdict::Unknown("request did not complete".to_string()),
    }
}

/// Run the pre-flight check for `repository`.
///
/// Returns `Err(EntitlementDenied)` only on an explicit 403; every
/// other outcome resolves to `Ok(())`.
pub async fn check(http: &reqwest::Client, endpoint: &str, repository: &str) -> Result<()> {
    let status = http
        .get(endpoint)
        .query(&[("repository", repository)])
        .timeout(CHECK_TIMEOUT)
        .send()
        .await
        .map(|r| r.status().as_u16())
        .ok();

    match classify(status) {
        Verdict::Allowed => {
            debug!(%repository, "entitlement confirmed");
            Ok(())
        }
        Verdict::Denied => Err(Error::EntitlementDenied {
            repository: repository.to_string(),
        }),
        Verdict::Unknown(reason) => {
            info!(%repository, %reason, "entitlement check inconclusive, proceeding");
            Ok(())
        }
    }
}

/// Run the check when the runner knows its repository; skip quietly
/// otherwise.
pub async fn check_if_identified(
    http: &reqwest::Client,
    endpoint: &str,
    repository: Option<String>,
) -> Result<()> {
    match repository {
        Some(repo) => check(http, endpoint, &repo).await,
        None => {
            warn!("runner did not expose a repository, skipping entitlement check");
            Ok(())
        }
    }
}
