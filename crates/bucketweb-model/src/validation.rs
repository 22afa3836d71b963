//! Validation of bucket names and website configurations.
//!
//! The rules are the subset of S3's `PutBucketWebsite` and bucket naming
//! checks that can be decided locally, so a malformed configuration is
//! rejected before any remote call is made.

use std::net::Ipv4Addr;

use crate::error::{ModelError, ModelResult};
use crate::types::{Redirect, RoutingRule, WebsiteConfiguration};

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

/// Maximum number of routing rules S3 accepts on one bucket.
pub const MAX_ROUTING_RULES: usize = 50;

/// Reserved bucket name prefixes.
const RESERVED_PREFIXES: [&str; 2] = ["xn--", "sthree-"];

/// Reserved bucket name suffixes.
const RESERVED_SUFFIXES: [&str; 2] = ["-s3alias", "--ol-s3"];

fn invalid_bucket(name: &str, reason: impl Into<String>) -> ModelError {
    ModelError::InvalidBucketName {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Validate an S3 bucket name.
///
/// Rules:
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots
/// - Not formatted as an IPv4 address
/// - No reserved prefix (`xn--`, `sthree-`) or suffix (`-s3alias`, `--ol-s3`)
///
/// # Examples
///
/// ```
/// use bucketweb_model::validate_bucket_name;
///
/// assert!(validate_bucket_name("tf-acc-test-1234").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> ModelResult<()> {
    let len = name.len();
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid_bucket(
            name,
            format!("must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"),
        ));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid_bucket(
            name,
            "must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = name.as_bytes();
    if !alnum(bytes[0]) || !alnum(bytes[len - 1]) {
        return Err(invalid_bucket(name, "must start and end with a letter or number"));
    }

    if name.contains("..") {
        return Err(invalid_bucket(name, "must not contain consecutive dots"));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid_bucket(name, "must not be formatted as an IP address"));
    }

    if let Some(prefix) = RESERVED_PREFIXES.iter().find(|p| name.starts_with(*p)) {
        return Err(invalid_bucket(name, format!("must not start with '{prefix}'")));
    }

    if let Some(suffix) = RESERVED_SUFFIXES.iter().find(|s| name.ends_with(*s)) {
        return Err(invalid_bucket(name, format!("must not end with '{suffix}'")));
    }

    Ok(())
}

fn require_non_empty(field: &str, value: &str) -> ModelResult<()> {
    if value.is_empty() {
        return Err(ModelError::InvalidField {
            field: field.to_owned(),
            reason: "must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn require_status_class(field: String, value: &str, classes: &[u8]) -> ModelResult<()> {
    let ok = value.len() == 3
        && value.bytes().all(|b| b.is_ascii_digit())
        && classes.contains(&value.as_bytes()[0]);
    if ok {
        Ok(())
    } else {
        let classes: Vec<String> = classes.iter().map(|c| format!("{}xx", *c as char)).collect();
        Err(ModelError::InvalidField {
            field,
            reason: format!("{value:?} is not a {} status code", classes.join("/")),
        })
    }
}

fn validate_redirect(index: usize, redirect: &Redirect) -> ModelResult<()> {
    if redirect.replace_key_with.is_some() && redirect.replace_key_prefix_with.is_some() {
        return Err(ModelError::ConflictingKeyReplacement { index });
    }
    if let Some(code) = &redirect.http_redirect_code {
        require_status_class(
            format!("routing_rule.{index}.redirect.0.http_redirect_code"),
            code,
            b"3",
        )?;
    }
    if let Some(host) = &redirect.host_name {
        require_non_empty(&format!("routing_rule.{index}.redirect.0.host_name"), host)?;
    }
    Ok(())
}

fn validate_routing_rule(index: usize, rule: &RoutingRule) -> ModelResult<()> {
    if let Some(condition) = &rule.condition {
        match (
            &condition.key_prefix_equals,
            &condition.http_error_code_returned_equals,
        ) {
            (Some(_), Some(_)) => return Err(ModelError::AmbiguousCondition { index }),
            (None, Some(code)) => require_status_class(
                format!("routing_rule.{index}.condition.0.http_error_code_returned_equals"),
                code,
                b"45",
            )?,
            _ => {}
        }
    }
    validate_redirect(index, &rule.redirect)
}

/// Validate a website configuration before it is submitted.
///
/// # Examples
///
/// ```
/// use bucketweb_model::{WebsiteConfiguration, validate_website_configuration};
///
/// let config = WebsiteConfiguration::with_index("index.html");
/// assert!(validate_website_configuration(&config).is_ok());
/// assert!(validate_website_configuration(&WebsiteConfiguration::default()).is_err());
/// ```
pub fn validate_website_configuration(config: &WebsiteConfiguration) -> ModelResult<()> {
    if let Some(target) = &config.redirect_all_requests_to {
        if config.index_document.is_some() {
            return Err(ModelError::RedirectAllConflict("index_document"));
        }
        if config.error_document.is_some() {
            return Err(ModelError::RedirectAllConflict("error_document"));
        }
        if !config.routing_rules.is_empty() {
            return Err(ModelError::RedirectAllConflict("routing_rule"));
        }
        return require_non_empty("redirect_all_requests_to.0.host_name", &target.host_name);
    }

    let Some(index) = &config.index_document else {
        return Err(ModelError::MissingIndexDocument);
    };
    require_non_empty("index_document.0.suffix", &index.suffix)?;
    if index.suffix.contains('/') {
        return Err(ModelError::InvalidField {
            field: "index_document.0.suffix".to_owned(),
            reason: "must not contain a slash".to_owned(),
        });
    }

    if let Some(error) = &config.error_document {
        require_non_empty("error_document.0.key", &error.key)?;
    }

    if config.routing_rules.len() > MAX_ROUTING_RULES {
        return Err(ModelError::TooManyRoutingRules {
            count: config.routing_rules.len(),
            max: MAX_ROUTING_RULES,
        });
    }

    config
        .routing_rules
        .iter()
        .enumerate()
        .try_for_each(|(i, rule)| validate_routing_rule(i, rule))
}
