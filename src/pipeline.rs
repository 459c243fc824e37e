//! Fetch, mask, publish.
//!
//! For each parsed reference, in input order: fetch the secret's
//! bytes from the store, decode them, register every sufficiently long
//! line with the runner's log masking, then set the step output and
//! (optionally) export an environment variable. Strictly sequential —
//! concurrent fetches could let a value hit the log before its mask is
//! registered.

use tracing::debug;
use zeroize::Zeroizing;

use crate::config::Config;
use crate::error::{AccessError, Result};
use crate::reference::{split_lines, SecretReference};
use crate::runner::Runner;
use crate::store::SecretStore;

/// Process every reference to completion.
///
/// A failed fetch aborts immediately: outputs published by earlier
/// iterations stay set, later references are never fetched.
pub async fn publish_all<S, R>(
    config: &Config,
    refs: &[SecretReference],
    store: &S,
    runner: &mut R,
) -> Result<()>
where
    S: SecretStore,
    R: Runner,
{
    for r in refs {
        let bytes = Zeroizing::new(store.access(&r.locator).await?);

        let value = Zeroizing::new(config.encoding.decode(&bytes).ok_or_else(|| {
            AccessError::Decode {
                locator: r.locator.clone(),
                encoding: config.encoding.name().to_string(),
            }
        })?);

        // Masks must be registered before the value is written anywhere
        // an observer could capture it.
        for line in mask_lines(&value, config.min_mask_length) {
            runner.mask(line)?;
        }

        runner.set_output(&r.output, &value)?;
        if config.export_to_environment {
            runner.export_env(&r.output, &value)?;
        }

        debug!(locator = %r.locator, output = %r.output, "published secret");
    }

    Ok(())
}

/// Lines of `value` that must be registered for masking.
///
/// The value is split on all three line-break conventions (the same
/// splitter the reference grammar uses) so a secret with embedded
/// newlines cannot leak line by line. Lines shorter than `min_len`
/// characters are skipped to keep redaction from mangling unrelated
/// log output.
pub fn mask_lines(value: &str, min_len: usize) -> Vec<&str> {
    split_lines(value)
        .into_iter()
        .filter(|line| !line.is_empty() && line.chars().count() >= min_len)
        .collect()
}
