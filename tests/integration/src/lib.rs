//! Integration tests for the bucket website lifecycle verifier.
//!
//! These tests require an S3-compatible server at `localhost:4566` (or
//! `S3_ENDPOINT_URL`). They are marked `#[ignore]` so they don't run during
//! normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p bucketweb-integration -- --ignored
//! ```

use std::sync::{Arc, Once};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use bucketweb_core::{Scenario, ScenarioReport, SdkWebsiteApi, VerifierConfig, WebsiteEngine};

static INIT: Once = Once::new();

/// Region used by every client built here.
pub const REGION: &str = "us-east-1";

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
fn endpoint_url() -> String {
    std::env::var("S3_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4566".to_owned())
}

/// Create a configured S3 client pointing at the local server.
#[must_use]
pub fn s3_client() -> aws_sdk_s3::Client {
    init_tracing();

    let creds = Credentials::new("test", "test", None, None, "integration-test");

    let config = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(REGION))
        .credentials_provider(creds)
        .endpoint_url(endpoint_url())
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(config)
}

/// Website API backed by [`s3_client`].
#[must_use]
pub fn website_api() -> Arc<SdkWebsiteApi> {
    Arc::new(SdkWebsiteApi::new(s3_client(), REGION))
}

/// Generate a unique bucket name for a test.
#[must_use]
pub fn test_bucket_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("tf-acc-test-{prefix}-{id}")
}

/// Run one scenario against the local server with a fresh engine.
pub async fn run_scenario(scenario: &Scenario) -> ScenarioReport {
    let api = website_api();
    let domain = VerifierConfig::builder().region(REGION).build().website_domain();
    let mut engine = WebsiteEngine::new(Arc::clone(&api), domain);
    scenario.run(&mut engine, &*api).await
}

/// Best-effort removal of a bucket left behind by a failed test.
pub async fn cleanup_bucket(client: &aws_sdk_s3::Client, bucket: &str) {
    let _ = client.delete_bucket_website().bucket(bucket).send().await;
    let _ = client.delete_bucket().bucket(bucket).send().await;
}

mod test_api;
mod test_website;
