//! Dredge - fetch cloud secrets into a CI pipeline step.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dredge::config::Config;
use dredge::entitlement;
use dredge::error::{ConfigError, Error, Result};
use dredge::output;
use dredge::pipeline;
use dredge::reference;
use dredge::runner::{GithubRunner, Runner};
use dredge::store::{self, SecretManagerClient};

/// Fetch secrets from Google Secret Manager into masked step outputs.
#[derive(Parser)]
#[command(
    name = "dredge",
    about = "Fetch secrets from Google Secret Manager into masked step outputs",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber with env-filter support
    let filter = EnvFilter::try_from_env("DREDGE_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("dredge=debug")
        } else {
            EnvFilter::new("dredge=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).without_time())
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            output::error(&format!("failed to create runtime: {}", e));
            std::process::exit(1);
        }
    };

    let mut runner = GithubRunner::from_env();
    if let Err(e) = runtime.block_on(run(&mut runner)) {
        let suggestion = match &e {
            Error::Config(ConfigError::MissingInput(_)) => {
                Some("declare the input in your workflow step's `with:` block")
            }
            Error::EntitlementDenied { .. } => Some("mail: support@usemantle.com"),
            Error::Access(_) => {
                Some("check the service account's secretmanager.versions.access permission")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}

async fn run(runner: &mut GithubRunner) -> Result<()> {
    let config = Config::from_runner(runner)?;
    let refs = reference::parse(&config.secrets)?;

    let http = reqwest::Client::new();

    let endpoint = runner
        .input("entitlement_url")
        .unwrap_or_else(|| entitlement::DEFAULT_ENDPOINT.to_string());
    entitlement::check_if_identified(&http, &endpoint, runner.repository()).await?;

    let token = store::resolve_access_token()?;
    let client = SecretManagerClient::new(http, &config.universe, token);

    pipeline::publish_all(&config, &refs, &client, runner).await?;

    output::success(&format!(
        "published {} secret{}",
        refs.len(),
        if refs.len() == 1 { "" } else { "s" }
    ));
    Ok(())
}
