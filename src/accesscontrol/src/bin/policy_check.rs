//! # policy-check
//!
//! Evaluates a JSON policy document against a set of granted permissions.
//!
//! ```text
//! policy-check --policy policy.json --grants grants.json --org-id 3 --param :reportId=1
//! ```
//!
//! Prints `allow` or `deny`. Exit status: 0 allow, 1 deny, 2 error.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `ACCESSCONTROL_POLICY_PATH` - Policy document (overridden by `--policy`)
//! - `ACCESSCONTROL_MAX_DEPTH` - Maximum policy nesting depth, 1 to 128 (default: 64)
//! - `ACCESSCONTROL_STRICT_SCOPES` - Reject misplaced wildcards (default: false)
//! - `ACCESSCONTROL_GRANTS_PATH` - Granted permissions file (overridden by `--grants`)
//! - `RUST_LOG` - Log level (default: info)

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use permgate_accesscontrol::{GrantedPermissions, LoaderConfig, PolicyHandle, ScopeParams};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Evaluate an access control policy document
#[derive(Debug, Parser)]
#[command(name = "policy-check", version)]
struct Args {
    /// Policy document (JSON)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Granted permissions (JSON object: action -> list of scopes)
    #[arg(long, env = "ACCESSCONTROL_GRANTS_PATH")]
    grants: PathBuf,

    /// Organization id injected into `OrgID` placeholders
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    org_id: i64,

    /// URL parameter injected into parameter placeholders, as KEY=VALUE
    #[arg(long = "param", value_parser = parse_param)]
    params: Vec<(String, String)>,

    /// Maximum policy nesting depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Reject scopes whose wildcard is not the final segment
    #[arg(long)]
    strict_scopes: bool,
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))
}

async fn run(args: Args) -> Result<bool> {
    let mut config = LoaderConfig::from_env()?;
    if let Some(path) = args.policy {
        config.policy_path = Some(path);
    }
    if let Some(max_depth) = args.max_depth {
        config.max_depth = max_depth;
    }
    config.strict_scopes |= args.strict_scopes;
    config.validate()?;

    debug!(?config, "Loader configuration");

    let handle = PolicyHandle::from_config(&config).await?;
    info!(policy = %handle.current(), "Evaluating policy");

    let grants = tokio::fs::read(&args.grants)
        .await
        .with_context(|| format!("reading grants from {}", args.grants.display()))?;
    let granted: GrantedPermissions = serde_json::from_slice(&grants)
        .with_context(|| format!("parsing grants from {}", args.grants.display()))?;

    let params = args
        .params
        .into_iter()
        .fold(ScopeParams::new(args.org_id), |params, (key, value)| {
            params.with_url_param(key, value)
        });

    Ok(handle.check(&granted, &params)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Args::parse()).await {
        Ok(true) => {
            println!("allow");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("deny");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("policy check failed: {:#}", e);
            ExitCode::from(2)
        }
    }
}
