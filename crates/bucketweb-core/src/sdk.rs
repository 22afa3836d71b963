//! [`WebsiteApi`] backed by the AWS SDK for Rust.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{BuildError, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::types as s3;
use bucketweb_model::{
    Condition, ErrorDocument, IndexDocument, Protocol, Redirect, RedirectAllRequestsTo,
    RoutingRule, WebsiteConfiguration,
};
use tracing::{debug, warn};

use crate::api::{RemoteError, WebsiteApi};
use crate::config::VerifierConfig;

const DEFAULT_REGION: &str = "us-east-1";

/// S3 client wrapper implementing [`WebsiteApi`].
#[derive(Debug, Clone)]
pub struct SdkWebsiteApi {
    client: Client,
    region: String,
}

impl SdkWebsiteApi {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Build a client from verifier configuration.
    ///
    /// With an endpoint, the client targets an S3-compatible server directly
    /// using static credentials. Without one, the default AWS provider chain
    /// is used.
    pub async fn from_config(config: &VerifierConfig) -> Self {
        let credentials = static_credentials(config);

        let s3_config = match &config.endpoint_url {
            Some(endpoint) => aws_sdk_s3::config::Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .credentials_provider(credentials.unwrap_or_else(|| {
                    Credentials::new("test", "test", None, None, "bucketweb")
                }))
                .endpoint_url(endpoint)
                .force_path_style(config.force_path_style)
                .build(),
            None => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                let mut builder = aws_sdk_s3::config::Builder::from(&shared)
                    .force_path_style(config.force_path_style);
                if let Some(credentials) = credentials {
                    builder = builder.credentials_provider(credentials);
                }
                builder.build()
            }
        };

        Self::new(Client::from_conf(s3_config), config.region.clone())
    }
}

/// Static credentials when both keys are set.
///
/// A lone access or secret key is ignored with a warning.
fn static_credentials(config: &VerifierConfig) -> Option<Credentials> {
    match (&config.access_key, &config.secret_key) {
        (Some(access), Some(secret)) => Some(Credentials::new(
            access.clone(),
            secret.clone(),
            None,
            None,
            "bucketweb",
        )),
        (None, None) => None,
        (access, _) => {
            let missing = if access.is_some() {
                "AWS_SECRET_ACCESS_KEY"
            } else {
                "AWS_ACCESS_KEY_ID"
            };
            warn!(missing, "ignoring partially configured static credentials");
            None
        }
    }
}

fn classify<E: std::fmt::Display + ProvideErrorMetadata>(err: &SdkError<E>) -> RemoteError {
    match err.as_service_error() {
        Some(service) => RemoteError::from_code(
            service.code().unwrap_or("Unknown"),
            service.message().unwrap_or_default(),
        ),
        None => RemoteError::Transport(err.to_string()),
    }
}

fn codec(err: &BuildError) -> RemoteError {
    RemoteError::Codec(err.to_string())
}

fn protocol_to_sdk(protocol: Protocol) -> s3::Protocol {
    match protocol {
        Protocol::Http => s3::Protocol::Http,
        Protocol::Https => s3::Protocol::Https,
    }
}

fn protocol_from_sdk(protocol: Option<&s3::Protocol>) -> Result<Option<Protocol>, RemoteError> {
    protocol
        .map(|p| {
            p.as_str()
                .parse::<Protocol>()
                .map_err(|e| RemoteError::Codec(e.to_string()))
        })
        .transpose()
}

fn rule_to_sdk(rule: &RoutingRule) -> s3::RoutingRule {
    let condition = rule.condition.as_ref().map(|c| {
        s3::Condition::builder()
            .set_http_error_code_returned_equals(c.http_error_code_returned_equals.clone())
            .set_key_prefix_equals(c.key_prefix_equals.clone())
            .build()
    });
    let r = &rule.redirect;
    let redirect = s3::Redirect::builder()
        .set_host_name(r.host_name.clone())
        .set_http_redirect_code(r.http_redirect_code.clone())
        .set_protocol(r.protocol.map(protocol_to_sdk))
        .set_replace_key_prefix_with(r.replace_key_prefix_with.clone())
        .set_replace_key_with(r.replace_key_with.clone())
        .build();

    s3::RoutingRule::builder()
        .set_condition(condition)
        .redirect(redirect)
        .build()
}

fn website_to_sdk(config: &WebsiteConfiguration) -> Result<s3::WebsiteConfiguration, BuildError> {
    let mut builder = s3::WebsiteConfiguration::builder();
    if let Some(index) = &config.index_document {
        builder = builder.index_document(s3::IndexDocument::builder().suffix(&index.suffix).build()?);
    }
    if let Some(error) = &config.error_document {
        builder = builder.error_document(s3::ErrorDocument::builder().key(&error.key).build()?);
    }
    if let Some(target) = &config.redirect_all_requests_to {
        builder = builder.redirect_all_requests_to(
            s3::RedirectAllRequestsTo::builder()
                .host_name(&target.host_name)
                .set_protocol(target.protocol.map(protocol_to_sdk))
                .build()?,
        );
    }
    for rule in &config.routing_rules {
        builder = builder.routing_rules(rule_to_sdk(rule));
    }
    Ok(builder.build())
}

fn rule_from_sdk(rule: &s3::RoutingRule) -> Result<RoutingRule, RemoteError> {
    let redirect = rule
        .redirect()
        .ok_or_else(|| RemoteError::Codec("routing rule without redirect".to_owned()))?;
    let condition = rule.condition().map(|c| Condition {
        http_error_code_returned_equals: c.http_error_code_returned_equals().map(str::to_owned),
        key_prefix_equals: c.key_prefix_equals().map(str::to_owned),
    });
    Ok(RoutingRule {
        condition,
        redirect: Redirect {
            host_name: redirect.host_name().map(str::to_owned),
            http_redirect_code: redirect.http_redirect_code().map(str::to_owned),
            protocol: protocol_from_sdk(redirect.protocol())?,
            replace_key_prefix_with: redirect.replace_key_prefix_with().map(str::to_owned),
            replace_key_with: redirect.replace_key_with().map(str::to_owned),
        },
    })
}

fn website_from_sdk(
    output: &aws_sdk_s3::operation::get_bucket_website::GetBucketWebsiteOutput,
) -> Result<Option<WebsiteConfiguration>, RemoteError> {
    let redirect_all_requests_to = match output.redirect_all_requests_to() {
        Some(target) => Some(RedirectAllRequestsTo {
            host_name: target.host_name().to_owned(),
            protocol: protocol_from_sdk(target.protocol())?,
        }),
        None => None,
    };
    let config = WebsiteConfiguration {
        index_document: output
            .index_document()
            .map(|d| IndexDocument::new(d.suffix())),
        error_document: output.error_document().map(|d| ErrorDocument::new(d.key())),
        redirect_all_requests_to,
        routing_rules: output
            .routing_rules()
            .iter()
            .map(rule_from_sdk)
            .collect::<Result<_, _>>()?,
    };

    if config == WebsiteConfiguration::default() {
        return Ok(None);
    }
    Ok(Some(config))
}

#[async_trait]
impl WebsiteApi for SdkWebsiteApi {
    async fn create_bucket(&self, bucket: &str) -> Result<(), RemoteError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                s3::CreateBucketConfiguration::builder()
                    .location_constraint(s3::BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }
        request.send().await.map_err(|e| classify(&e))?;
        debug!(bucket = %bucket, "create_bucket completed");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), RemoteError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        debug!(bucket = %bucket, "delete_bucket completed");
        Ok(())
    }

    async fn get_bucket_website(
        &self,
        bucket: &str,
    ) -> Result<Option<WebsiteConfiguration>, RemoteError> {
        let output = self
            .client
            .get_bucket_website()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        website_from_sdk(&output)
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        config: &WebsiteConfiguration,
    ) -> Result<(), RemoteError> {
        let website = website_to_sdk(config).map_err(|e| codec(&e))?;
        self.client
            .put_bucket_website()
            .bucket(bucket)
            .website_configuration(website)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        debug!(bucket = %bucket, rules = config.routing_rules.len(), "put_bucket_website completed");
        Ok(())
    }

    async fn delete_bucket_website(&self, bucket: &str) -> Result<(), RemoteError> {
        self.client
            .delete_bucket_website()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify(&e))?;
        debug!(bucket = %bucket, "delete_bucket_website completed");
        Ok(())
    }
}
