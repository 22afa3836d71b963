//! Website configuration types.
//!
//! These mirror the `WebsiteConfiguration` shape of the S3 API, with one
//! deliberate difference: a [`RoutingRule`] always carries a [`Redirect`],
//! so a rule without a redirect cannot be constructed.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Redirect protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Plain HTTP.
    #[serde(rename = "http")]
    Http,
    /// HTTP over TLS.
    #[serde(rename = "https")]
    Https,
}

impl Protocol {
    /// Returns the string value of this enum variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(ModelError::UnknownProtocol(other.to_owned())),
        }
    }
}

/// Document served for requests to a directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Suffix appended to directory requests, e.g. `index.html`.
    pub suffix: String,
}

impl IndexDocument {
    /// Create an index document with the given suffix.
    #[must_use]
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

/// Object returned when a 4XX error occurs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErrorDocument {
    /// Object key of the error document.
    pub key: String,
}

impl ErrorDocument {
    /// Create an error document for the given object key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Redirect every request to another host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectAllRequestsTo {
    /// Target host name.
    pub host_name: String,
    /// Protocol to use for the redirect; defaults to the original request's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
}

impl RedirectAllRequestsTo {
    /// Redirect all requests to `host_name`, keeping the request protocol.
    #[must_use]
    pub fn new(host_name: impl Into<String>) -> Self {
        Self {
            host_name: host_name.into(),
            protocol: None,
        }
    }

    /// Set the redirect protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }
}

/// Condition that must match for a routing rule's redirect to apply.
///
/// At most one matcher may be set; see
/// [`validate_website_configuration`](crate::validate_website_configuration).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Condition {
    /// HTTP error code that triggers the redirect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_error_code_returned_equals: Option<String>,
    /// Object key prefix that triggers the redirect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix_equals: Option<String>,
}

impl Condition {
    /// Match requests whose key starts with `prefix`.
    #[must_use]
    pub fn key_prefix(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix_equals: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Match requests that returned the given HTTP error code.
    #[must_use]
    pub fn http_error_code(code: impl Into<String>) -> Self {
        Self {
            http_error_code_returned_equals: Some(code.into()),
            ..Self::default()
        }
    }
}

/// Where and how a matched request is redirected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Redirect {
    /// Host name to use in the redirect request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// HTTP redirect code (3XX).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_redirect_code: Option<String>,
    /// Protocol to use in the redirect request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    /// Replacement for the matched key prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_key_prefix_with: Option<String>,
    /// Replacement for the whole key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_key_with: Option<String>,
}

impl Redirect {
    /// Redirect by replacing the matched key prefix.
    #[must_use]
    pub fn replace_key_prefix_with(prefix: impl Into<String>) -> Self {
        Self {
            replace_key_prefix_with: Some(prefix.into()),
            ..Self::default()
        }
    }

    /// Redirect by replacing the whole key.
    #[must_use]
    pub fn replace_key_with(key: impl Into<String>) -> Self {
        Self {
            replace_key_with: Some(key.into()),
            ..Self::default()
        }
    }

    /// Set the redirect protocol.
    #[must_use]
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set the redirect host name.
    #[must_use]
    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.host_name = Some(host_name.into());
        self
    }
}

/// A conditional redirect evaluated by the S3 website endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Optional match condition. Without one, the redirect applies to every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// The redirect to perform.
    pub redirect: Redirect,
}

impl RoutingRule {
    /// A rule that always redirects.
    #[must_use]
    pub fn unconditional(redirect: Redirect) -> Self {
        Self {
            condition: None,
            redirect,
        }
    }

    /// A rule that redirects when `condition` matches.
    #[must_use]
    pub fn when(condition: Condition, redirect: Redirect) -> Self {
        Self {
            condition: Some(condition),
            redirect,
        }
    }
}

/// Static website settings attached to a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfiguration {
    /// Index document served for directory requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_document: Option<IndexDocument>,
    /// Document served on 4XX errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_document: Option<ErrorDocument>,
    /// Redirect all requests to another host. Excludes every other field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_all_requests_to: Option<RedirectAllRequestsTo>,
    /// Routing rules. Order carries no meaning.
    #[serde(default, rename = "routing_rule", skip_serializing_if = "Vec::is_empty")]
    pub routing_rules: Vec<RoutingRule>,
}

impl WebsiteConfiguration {
    /// A configuration serving `suffix` as the index document.
    #[must_use]
    pub fn with_index(suffix: impl Into<String>) -> Self {
        Self {
            index_document: Some(IndexDocument::new(suffix)),
            ..Self::default()
        }
    }

    /// A configuration redirecting every request.
    #[must_use]
    pub fn redirect_all(target: RedirectAllRequestsTo) -> Self {
        Self {
            redirect_all_requests_to: Some(target),
            ..Self::default()
        }
    }

    /// Set the error document key.
    #[must_use]
    pub fn error_document(mut self, key: impl Into<String>) -> Self {
        self.error_document = Some(ErrorDocument::new(key));
        self
    }

    /// Append a routing rule.
    #[must_use]
    pub fn routing_rule(mut self, rule: RoutingRule) -> Self {
        self.routing_rules.push(rule);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_known_protocols() {
        assert_eq!("http".parse::<Protocol>().unwrap(), Protocol::Http);
        assert_eq!("https".parse::<Protocol>().unwrap(), Protocol::Https);
        assert_eq!(Protocol::Https.to_string(), "https");
    }

    #[test]
    fn test_should_reject_unknown_protocol() {
        let err = "ftp".parse::<Protocol>().unwrap_err();
        assert!(matches!(err, ModelError::UnknownProtocol(ref p) if p == "ftp"));
    }

    #[test]
    fn test_should_deserialize_from_json() {
        let json = r#"{
            "index_document": {"suffix": "index.html"},
            "error_document": {"key": "error.html"},
            "routing_rule": [{
                "condition": {"http_error_code_returned_equals": "404"},
                "redirect": {"replace_key_prefix_with": "report-404"}
            }]
        }"#;

        let config: WebsiteConfiguration = serde_json::from_str(json).unwrap();
        let expected = WebsiteConfiguration::with_index("index.html")
            .error_document("error.html")
            .routing_rule(RoutingRule::when(
                Condition::http_error_code("404"),
                Redirect::replace_key_prefix_with("report-404"),
            ));
        assert_eq!(config, expected);
    }

    #[test]
    fn test_should_require_redirect_in_routing_rule_json() {
        let json = r#"{"routing_rule": [{"condition": {"key_prefix_equals": "docs/"}}]}"#;
        assert!(serde_json::from_str::<WebsiteConfiguration>(json).is_err());
    }

    #[test]
    fn test_should_skip_absent_fields_when_serializing() {
        let config = WebsiteConfiguration::redirect_all(
            RedirectAllRequestsTo::new("example.com").with_protocol(Protocol::Https),
        );
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(
            json,
            r#"{"redirect_all_requests_to":{"host_name":"example.com","protocol":"https"}}"#
        );
    }
}
