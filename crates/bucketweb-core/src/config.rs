//! Verifier configuration.
//!
//! Provides [`VerifierConfig`], which describes how to reach the S3 service
//! under test and how scenario buckets are named. Values are loaded from
//! environment variables.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Configuration for the verifier and its SDK backend.
///
/// # Examples
///
/// ```
/// use bucketweb_core::VerifierConfig;
///
/// let config = VerifierConfig::default();
/// assert_eq!(config.region, "us-east-1");
/// assert!(config.endpoint_url.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    /// Custom S3 endpoint. When unset, the default AWS endpoint resolution
    /// and credential chain are used.
    #[builder(default, setter(strip_option, into))]
    pub endpoint_url: Option<String>,

    /// AWS region for requests and website endpoints.
    #[builder(default = String::from("us-east-1"), setter(into))]
    pub region: String,

    /// Static access key, used together with `secret_key`.
    #[builder(default, setter(strip_option, into))]
    pub access_key: Option<String>,

    /// Static secret key, used together with `access_key`.
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing)]
    pub secret_key: Option<String>,

    /// Use path-style addressing (required by most S3-compatible servers).
    #[builder(default = true)]
    pub force_path_style: bool,

    /// Prefix for generated scenario bucket names.
    #[builder(default = String::from("tf-acc-test"), setter(into))]
    pub bucket_prefix: String,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"), setter(into))]
    pub log_level: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `S3_ENDPOINT_URL` | *(unset)* |
    /// | `DEFAULT_REGION` / `AWS_REGION` | `us-east-1` |
    /// | `AWS_ACCESS_KEY_ID` | *(unset)* |
    /// | `AWS_SECRET_ACCESS_KEY` | *(unset)* |
    /// | `S3_FORCE_PATH_STYLE` | `true` |
    /// | `BUCKET_PREFIX` | `tf-acc-test` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("S3_ENDPOINT_URL").filter(|v| !v.is_empty()) {
            config.endpoint_url = Some(v);
        }
        if let Some(v) = lookup("DEFAULT_REGION").or_else(|| lookup("AWS_REGION")) {
            config.region = v;
        }
        if let Some(v) = lookup("AWS_ACCESS_KEY_ID") {
            config.access_key = Some(v);
        }
        if let Some(v) = lookup("AWS_SECRET_ACCESS_KEY") {
            config.secret_key = Some(v);
        }
        if let Some(v) = lookup("S3_FORCE_PATH_STYLE") {
            config.force_path_style = parse_bool(&v);
        }
        if let Some(v) = lookup("BUCKET_PREFIX") {
            config.bucket_prefix = v;
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Website domain for buckets in the configured region.
    #[must_use]
    pub fn website_domain(&self) -> String {
        format!("s3-website-{}.amazonaws.com", self.region)
    }

    /// Generate a unique bucket name with the configured prefix.
    #[must_use]
    pub fn unique_bucket_name(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.bucket_prefix, &id[..12])
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
