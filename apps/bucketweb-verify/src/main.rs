//! Bucketweb Verify - acceptance runner for S3 bucket website configurations.
//!
//! Runs every lifecycle scenario concurrently, each against a freshly named
//! bucket, and exits non-zero if any scenario fails.
//!
//! # Usage
//!
//! ```text
//! S3_ENDPOINT_URL=http://localhost:4566 bucketweb-verify
//! bucketweb-verify --memory basic redirect
//! ```
//!
//! Positional arguments restrict the run to the named scenarios.
//! `--memory` uses the in-process backend instead of S3.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `S3_ENDPOINT_URL` | *(unset)* | S3-compatible endpoint; AWS when unset |
//! | `DEFAULT_REGION` | `us-east-1` | Region for requests and website endpoints |
//! | `AWS_ACCESS_KEY_ID` | *(unset)* | Static access key |
//! | `AWS_SECRET_ACCESS_KEY` | *(unset)* | Static secret key |
//! | `S3_FORCE_PATH_STYLE` | `true` | Path-style addressing |
//! | `BUCKET_PREFIX` | `tf-acc-test` | Prefix for generated bucket names |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `LOG_FORMAT` | `text` | `json` for structured output |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::sync::Arc;

use anyhow::{Context, Result};
use bucketweb_core::fixtures::acceptance_scenarios;
use bucketweb_core::{
    MemoryWebsiteApi, Scenario, ScenarioReport, SdkWebsiteApi, VerifierConfig, run_scenarios,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

#[derive(Debug, Default)]
struct Args {
    memory: bool,
    only: Vec<String>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Args {
    let mut parsed = Args::default();
    for arg in args {
        if arg == "--memory" {
            parsed.memory = true;
        } else {
            parsed.only.push(arg);
        }
    }
    parsed
}

fn select(scenarios: Vec<Scenario>, only: &[String]) -> Result<Vec<Scenario>> {
    if only.is_empty() {
        return Ok(scenarios);
    }
    if let Some(unknown) = only.iter().find(|n| !scenarios.iter().any(|s| &s.name == *n)) {
        anyhow::bail!("unknown scenario: {unknown}");
    }
    Ok(scenarios
        .into_iter()
        .filter(|s| only.contains(&s.name))
        .collect())
}

fn summarize(reports: &[ScenarioReport]) -> Result<()> {
    let mut failed = 0;
    for report in reports {
        match &report.result {
            Ok(()) => info!(scenario = %report.name, stage = %report.stage, "PASS"),
            Err(err) => {
                failed += 1;
                error!(scenario = %report.name, stage = %report.stage, error = %err, "FAIL");
            }
        }
    }
    info!(total = reports.len(), failed, "run complete");
    if failed > 0 {
        anyhow::bail!("{failed} of {} scenarios failed", reports.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = VerifierConfig::from_env();
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    init_tracing(&config.log_level, json)?;

    let args = parse_args(std::env::args().skip(1));
    let scenarios = select(acceptance_scenarios(|| config.unique_bucket_name()), &args.only)?;

    info!(
        endpoint = config.endpoint_url.as_deref().unwrap_or("aws"),
        region = %config.region,
        memory = args.memory,
        scenarios = scenarios.len(),
        version = VERSION,
        "starting bucketweb verify",
    );

    let domain = config.website_domain();
    let reports = if args.memory {
        run_scenarios(Arc::new(MemoryWebsiteApi::new()), &domain, &scenarios).await
    } else {
        let api = SdkWebsiteApi::from_config(&config).await;
        run_scenarios(Arc::new(api), &domain, &scenarios).await
    };

    summarize(&reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(scenarios: &[Scenario]) -> Vec<&str> {
        scenarios.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_should_parse_memory_flag_and_filters() {
        let args = parse_args(["--memory".to_owned(), "basic".to_owned()]);
        assert!(args.memory);
        assert_eq!(args.only, ["basic"]);
    }

    #[test]
    fn test_should_select_named_scenarios() {
        let all = acceptance_scenarios(|| "b".to_owned());
        let selected = select(all, &["redirect".to_owned(), "basic".to_owned()]).unwrap();
        assert_eq!(names(&selected), ["basic", "redirect"]);
    }

    #[test]
    fn test_should_reject_unknown_scenario() {
        let all = acceptance_scenarios(|| "b".to_owned());
        assert!(select(all, &["nope".to_owned()]).is_err());
    }

    #[tokio::test]
    async fn test_should_pass_all_scenarios_in_memory() {
        let config = VerifierConfig::default();
        let scenarios = acceptance_scenarios(|| config.unique_bucket_name());
        let reports = run_scenarios(
            Arc::new(MemoryWebsiteApi::new()),
            &config.website_domain(),
            &scenarios,
        )
        .await;
        assert!(summarize(&reports).is_ok());
    }
}
