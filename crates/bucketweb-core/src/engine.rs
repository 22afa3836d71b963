//! Provisioning engine.
//!
//! The engine turns a declared [`Configuration`] into remote state through a
//! [`WebsiteApi`] and records what it created in a [`TrackedState`]. It is a
//! straight-line applier: declared resources are created or replaced in
//! order and undeclared ones are removed. There is no plan graph and no diff.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use bucketweb_model::{
    Attributes, Flatten, WebsiteConfiguration, validate_bucket_name, validate_website_configuration,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::WebsiteApi;
use crate::compare::compare_sets;
use crate::error::{VerifyError, VerifyResult};
use crate::state::{ResourceAddress, ResourceKind, TrackedResource, TrackedState};

/// How a website block names its bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketRef {
    /// A literal bucket name.
    Name(String),
    /// The `id` of an `aws_s3_bucket` block declared in the same configuration.
    Resource {
        /// Local name of the bucket block.
        resource: String,
    },
}

impl BucketRef {
    /// Reference a bucket block by its local name.
    #[must_use]
    pub fn resource(name: impl Into<String>) -> Self {
        Self::Resource {
            resource: name.into(),
        }
    }
}

/// An `aws_s3_bucket` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketBlock {
    /// Local name.
    pub name: String,
    /// Bucket name.
    pub bucket: String,
    /// Canned ACL, recorded as an attribute only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acl: Option<String>,
}

/// An `aws_s3_bucket_website_configuration` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteBlock {
    /// Local name.
    pub name: String,
    /// Bucket the configuration attaches to.
    pub bucket: BucketRef,
    /// Desired website settings.
    #[serde(flatten)]
    pub website: WebsiteConfiguration,
}

/// A declared configuration: the desired state of one scenario step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Bucket blocks.
    #[serde(default)]
    pub buckets: Vec<BucketBlock>,
    /// Website configuration blocks.
    #[serde(default)]
    pub websites: Vec<WebsiteBlock>,
}

impl Configuration {
    /// Parse a configuration from JSON text.
    ///
    /// ```
    /// use bucketweb_core::Configuration;
    ///
    /// let config = Configuration::from_json(r#"{
    ///     "buckets": [{"name": "test", "bucket": "my-site"}],
    ///     "websites": [{
    ///         "name": "test",
    ///         "bucket": {"resource": "test"},
    ///         "index_document": {"suffix": "index.html"}
    ///     }]
    /// }"#).unwrap();
    /// assert_eq!(config.websites.len(), 1);
    /// ```
    pub fn from_json(text: &str) -> VerifyResult<Self> {
        let config = serde_json::from_str(text).context("invalid configuration JSON")?;
        Ok(config)
    }

    fn validate(&self) -> VerifyResult<()> {
        for bucket in &self.buckets {
            validate_bucket_name(&bucket.bucket)?;
        }
        for website in &self.websites {
            validate_website_configuration(&website.website)?;
        }
        Ok(())
    }
}

/// Flattened attributes recorded for a website configuration resource.
#[must_use]
pub fn website_attributes(
    bucket: &str,
    config: &WebsiteConfiguration,
    website_domain: &str,
) -> Attributes {
    let mut attrs = config.flatten();
    attrs.insert("id", bucket);
    attrs.insert("bucket", bucket);
    attrs.insert("website_domain", website_domain);
    attrs.insert("website_endpoint", format!("{bucket}.{website_domain}"));
    attrs
}

fn bucket_attributes(block: &BucketBlock) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("id", block.bucket.as_str());
    attrs.insert("bucket", block.bucket.as_str());
    if let Some(acl) = &block.acl {
        attrs.insert("acl", acl.as_str());
    }
    attrs
}

/// The external engine the verifier drives.
#[async_trait]
pub trait ProvisioningEngine: Send {
    /// Converge remote state onto `config`.
    async fn apply(&mut self, config: &Configuration) -> VerifyResult<()>;

    /// Re-read remote state, returning resources that drifted.
    ///
    /// Resources that no longer exist remotely are dropped from state.
    async fn refresh(&mut self) -> VerifyResult<Vec<ResourceAddress>>;

    /// Destroy everything tracked, returning the pre-destroy state.
    async fn destroy(&mut self) -> VerifyResult<TrackedState>;

    /// Read a resource by remote identifier, as an import would.
    async fn import(&self, address: &ResourceAddress, id: &str) -> VerifyResult<TrackedResource>;

    /// Current tracked state.
    fn state(&self) -> &TrackedState;
}

/// [`ProvisioningEngine`] for buckets and their website configurations.
pub struct WebsiteEngine<A: ?Sized> {
    api: Arc<A>,
    website_domain: String,
    state: TrackedState,
    desired: BTreeMap<ResourceAddress, WebsiteConfiguration>,
}

impl<A: ?Sized> std::fmt::Debug for WebsiteEngine<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebsiteEngine")
            .field("website_domain", &self.website_domain)
            .field("tracked", &self.state.len())
            .finish_non_exhaustive()
    }
}

impl<A: WebsiteApi + ?Sized> WebsiteEngine<A> {
    /// Create an engine with empty state.
    #[must_use]
    pub fn new(api: Arc<A>, website_domain: impl Into<String>) -> Self {
        Self {
            api,
            website_domain: website_domain.into(),
            state: TrackedState::new(),
            desired: BTreeMap::new(),
        }
    }

    fn resolve_bucket(&self, bucket: &BucketRef) -> VerifyResult<String> {
        match bucket {
            BucketRef::Name(name) => Ok(name.clone()),
            BucketRef::Resource { resource } => {
                let address = ResourceAddress::bucket(resource.as_str());
                self.state
                    .get(&address)
                    .map(|r| r.id.clone())
                    .ok_or_else(|| VerifyError::UnresolvedReference(address.to_string()))
            }
        }
    }

    /// Run a removal call, treating "already gone" as success.
    async fn remove_remote(&self, address: &ResourceAddress, id: &str) -> VerifyResult<()> {
        let result = match address.kind {
            ResourceKind::Bucket => self.api.delete_bucket(id).await,
            ResourceKind::BucketWebsiteConfiguration => self.api.delete_bucket_website(id).await,
        };
        match result {
            Ok(()) => {
                debug!(%address, id, "removed");
                Ok(())
            }
            Err(err) if err.absence().is_some() => {
                debug!(%address, id, reason = %err, "already absent");
                Ok(())
            }
            Err(source) => Err(VerifyError::Apply {
                address: address.clone(),
                source,
            }),
        }
    }

    async fn read_website(&self, address: &ResourceAddress, id: &str) -> VerifyResult<TrackedResource> {
        match self.api.get_bucket_website(id).await {
            Ok(Some(config)) => Ok(TrackedResource {
                address: address.clone(),
                id: id.to_owned(),
                attributes: website_attributes(id, &config, &self.website_domain),
            }),
            Ok(None) => Err(VerifyError::MissingRemoteState(id.to_owned())),
            Err(source) => Err(VerifyError::RemoteQuery {
                bucket: id.to_owned(),
                source,
            }),
        }
    }

    async fn prune(&mut self, config: &Configuration) -> VerifyResult<()> {
        let websites: BTreeSet<ResourceAddress> = config
            .websites
            .iter()
            .map(|w| ResourceAddress::website(w.name.as_str()))
            .collect();
        let buckets: BTreeMap<ResourceAddress, &str> = config
            .buckets
            .iter()
            .map(|b| (ResourceAddress::bucket(b.name.as_str()), b.bucket.as_str()))
            .collect();

        let stale: Vec<(ResourceAddress, String)> = self
            .state
            .of_kind(ResourceKind::BucketWebsiteConfiguration)
            .filter(|r| !websites.contains(&r.address))
            .chain(
                self.state
                    .of_kind(ResourceKind::Bucket)
                    .filter(|r| buckets.get(&r.address) != Some(&r.id.as_str())),
            )
            .map(|r| (r.address.clone(), r.id.clone()))
            .collect();

        for (address, id) in stale {
            self.remove_remote(&address, &id).await?;
            self.state.remove(&address);
            self.desired.remove(&address);
        }
        Ok(())
    }
}

#[async_trait]
impl<A: WebsiteApi + ?Sized + 'static> ProvisioningEngine for WebsiteEngine<A> {
    async fn apply(&mut self, config: &Configuration) -> VerifyResult<()> {
        config.validate()?;
        self.prune(config).await?;

        for block in &config.buckets {
            let address = ResourceAddress::bucket(block.name.as_str());
            if self.state.get(&address).is_none() {
                self.api
                    .create_bucket(&block.bucket)
                    .await
                    .map_err(|source| VerifyError::Apply {
                        address: address.clone(),
                        source,
                    })?;
                debug!(%address, bucket = %block.bucket, "bucket created");
            }
            self.state.insert(TrackedResource {
                address,
                id: block.bucket.clone(),
                attributes: bucket_attributes(block),
            });
        }

        for block in &config.websites {
            let address = ResourceAddress::website(block.name.as_str());
            let bucket = self.resolve_bucket(&block.bucket)?;

            let moved_from = self
                .state
                .get(&address)
                .map(|previous| previous.id.clone())
                .filter(|previous| *previous != bucket);
            if let Some(old) = moved_from {
                self.remove_remote(&address, &old).await?;
            }

            self.api
                .put_bucket_website(&bucket, &block.website)
                .await
                .map_err(|source| VerifyError::Apply {
                    address: address.clone(),
                    source,
                })?;

            let tracked = self.read_website(&address, &bucket).await?;
            debug!(%address, bucket = %bucket, attributes = tracked.attributes.len(), "website configuration applied");
            self.state.insert(tracked);
            self.desired.insert(address, block.website.clone());
        }

        info!(resources = self.state.len(), "apply complete");
        Ok(())
    }

    async fn refresh(&mut self) -> VerifyResult<Vec<ResourceAddress>> {
        let tracked: Vec<(ResourceAddress, String)> = self
            .state
            .of_kind(ResourceKind::BucketWebsiteConfiguration)
            .map(|r| (r.address.clone(), r.id.clone()))
            .collect();

        let mut drifted = Vec::new();
        for (address, id) in tracked {
            let refreshed = match self.read_website(&address, &id).await {
                Ok(refreshed) => refreshed,
                Err(VerifyError::RemoteQuery { source, .. }) if source.absence().is_some() => {
                    info!(%address, reason = %source, "resource disappeared, removing from state");
                    self.state.remove(&address);
                    drifted.push(address);
                    continue;
                }
                Err(err) => return Err(err),
            };

            if let Some(desired) = self.desired.get(&address) {
                let expected = website_attributes(&id, desired, &self.website_domain);
                let label = address.to_string();
                if let Err(err) = compare_sets(&label, &refreshed.attributes, &expected, "routing_rule") {
                    info!(%address, %err, "resource drifted");
                    drifted.push(address);
                }
            }
            self.state.insert(refreshed);
        }
        Ok(drifted)
    }

    async fn destroy(&mut self) -> VerifyResult<TrackedState> {
        let snapshot = self.state.clone();

        // Website configurations go first so their buckets are still addressable.
        let order = snapshot
            .of_kind(ResourceKind::BucketWebsiteConfiguration)
            .chain(snapshot.of_kind(ResourceKind::Bucket));

        let mut first_error = None;
        for resource in order {
            match self.remove_remote(&resource.address, &resource.id).await {
                Ok(()) => {
                    self.state.remove(&resource.address);
                    self.desired.remove(&resource.address);
                }
                Err(err) => {
                    warn!(address = %resource.address, %err, "destroy failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        info!(resources = snapshot.len(), "destroy complete");
        match first_error {
            Some(err) => Err(err),
            None => Ok(snapshot),
        }
    }

    async fn import(&self, address: &ResourceAddress, id: &str) -> VerifyResult<TrackedResource> {
        match address.kind {
            ResourceKind::BucketWebsiteConfiguration => self.read_website(address, id).await,
            ResourceKind::Bucket => Err(anyhow::anyhow!("import of {address} is not supported").into()),
        }
    }

    fn state(&self) -> &TrackedState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use bucketweb_model::{AbsenceReason, Condition, Redirect, RoutingRule};

    use super::*;
    use crate::memory::MemoryWebsiteApi;

    const DOMAIN: &str = "s3-website-us-east-1.amazonaws.com";

    fn config(bucket: &str, website: WebsiteConfiguration) -> Configuration {
        Configuration {
            buckets: vec![BucketBlock {
                name: "test".to_owned(),
                bucket: bucket.to_owned(),
                acl: Some("public-read".to_owned()),
            }],
            websites: vec![WebsiteBlock {
                name: "test".to_owned(),
                bucket: BucketRef::resource("test"),
                website,
            }],
        }
    }

    fn engine() -> (Arc<MemoryWebsiteApi>, WebsiteEngine<MemoryWebsiteApi>) {
        let api = Arc::new(MemoryWebsiteApi::new());
        let engine = WebsiteEngine::new(Arc::clone(&api), DOMAIN);
        (api, engine)
    }

    #[tokio::test]
    async fn test_should_create_bucket_and_record_website_attributes() {
        let (api, mut engine) = engine();
        engine
            .apply(&config("site-one", WebsiteConfiguration::with_index("index.html")))
            .await
            .unwrap();

        assert!(api.bucket_exists("site-one"));
        let website = engine.state().get(&ResourceAddress::website("test")).unwrap();
        assert_eq!(website.id, "site-one");
        assert_eq!(website.attributes.get("bucket"), Some("site-one"));
        assert_eq!(website.attributes.get("index_document.0.suffix"), Some("index.html"));
        assert_eq!(
            website.attributes.get("website_endpoint"),
            Some("site-one.s3-website-us-east-1.amazonaws.com")
        );
        let bucket = engine.state().get(&ResourceAddress::bucket("test")).unwrap();
        assert_eq!(bucket.attributes.get("acl"), Some("public-read"));
    }

    #[tokio::test]
    async fn test_should_reject_invalid_configuration_before_remote_calls() {
        let (api, mut engine) = engine();
        let err = engine
            .apply(&config("site-two", WebsiteConfiguration::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, VerifyError::Model(_)));
        assert_eq!(api.bucket_count(), 0);
    }

    #[tokio::test]
    async fn test_should_fail_on_unresolved_bucket_reference() {
        let (_api, mut engine) = engine();
        let mut cfg = config("site-three", WebsiteConfiguration::with_index("index.html"));
        cfg.websites[0].bucket = BucketRef::resource("missing");

        let err = engine.apply(&cfg).await.unwrap_err();
        assert!(
            matches!(err, VerifyError::UnresolvedReference(ref r) if r == "aws_s3_bucket.missing")
        );
    }

    #[tokio::test]
    async fn test_should_replace_website_in_place_on_update() {
        let (api, mut engine) = engine();
        engine
            .apply(&config("site-four", WebsiteConfiguration::with_index("index.html")))
            .await
            .unwrap();
        let updated = WebsiteConfiguration::with_index("index.html").error_document("error.html");
        engine.apply(&config("site-four", updated.clone())).await.unwrap();

        assert_eq!(api.get_bucket_website("site-four").await.unwrap(), Some(updated));
        let attrs = &engine.state().get(&ResourceAddress::website("test")).unwrap().attributes;
        assert_eq!(attrs.get("error_document.0.key"), Some("error.html"));
    }

    #[tokio::test]
    async fn test_should_remove_undeclared_website() {
        let (api, mut engine) = engine();
        let mut cfg = config("site-five", WebsiteConfiguration::with_index("index.html"));
        engine.apply(&cfg).await.unwrap();

        cfg.websites.clear();
        engine.apply(&cfg).await.unwrap();

        assert!(engine.state().get(&ResourceAddress::website("test")).is_none());
        assert_eq!(
            api.get_bucket_website("site-five").await.unwrap_err().absence(),
            Some(AbsenceReason::WebsiteConfigurationNotFound)
        );
    }

    #[tokio::test]
    async fn test_should_report_no_drift_for_reordered_rules() {
        let api = Arc::new(MemoryWebsiteApi::new().with_reversed_routing_rules());
        let mut engine = WebsiteEngine::new(Arc::clone(&api), DOMAIN);
        let website = WebsiteConfiguration::with_index("index.html")
            .routing_rule(RoutingRule::when(
                Condition::key_prefix("images/"),
                Redirect::replace_key_with("errorpage.html"),
            ))
            .routing_rule(RoutingRule::when(
                Condition::key_prefix("docs/"),
                Redirect::replace_key_with("errorpage.html"),
            ));
        engine.apply(&config("site-six", website)).await.unwrap();

        assert!(engine.refresh().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_detect_out_of_band_deletion_on_refresh() {
        let (api, mut engine) = engine();
        engine
            .apply(&config("site-seven", WebsiteConfiguration::with_index("index.html")))
            .await
            .unwrap();
        api.delete_bucket_website("site-seven").await.unwrap();

        let drifted = engine.refresh().await.unwrap();
        assert_eq!(drifted, vec![ResourceAddress::website("test")]);
        assert!(engine.state().get(&ResourceAddress::website("test")).is_none());
    }

    #[tokio::test]
    async fn test_should_detect_changed_remote_configuration() {
        let (api, mut engine) = engine();
        engine
            .apply(&config("site-eight", WebsiteConfiguration::with_index("index.html")))
            .await
            .unwrap();
        api.put_bucket_website("site-eight", &WebsiteConfiguration::with_index("home.html"))
            .await
            .unwrap();

        let drifted = engine.refresh().await.unwrap();
        assert_eq!(drifted, vec![ResourceAddress::website("test")]);
    }

    #[tokio::test]
    async fn test_should_destroy_everything_and_return_snapshot() {
        let (api, mut engine) = engine();
        engine
            .apply(&config("site-nine", WebsiteConfiguration::with_index("index.html")))
            .await
            .unwrap();

        let snapshot = engine.destroy().await.unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(engine.state().is_empty());
        assert!(!api.bucket_exists("site-nine"));
    }

    #[tokio::test]
    async fn test_should_import_website_by_bucket_name() {
        let (_api, mut engine) = engine();
        engine
            .apply(&config("site-ten", WebsiteConfiguration::with_index("index.html")))
            .await
            .unwrap();

        let address = ResourceAddress::website("test");
        let imported = engine.import(&address, "site-ten").await.unwrap();
        assert_eq!(
            imported.attributes,
            engine.state().get(&address).unwrap().attributes
        );
        assert!(engine.import(&ResourceAddress::bucket("test"), "site-ten").await.is_err());
    }

    #[test]
    fn test_should_parse_literal_and_reference_buckets() {
        let cfg = Configuration::from_json(
            r#"{"websites": [
                {"name": "a", "bucket": "literal-bucket", "index_document": {"suffix": "i.html"}},
                {"name": "b", "bucket": {"resource": "test"}, "redirect_all_requests_to": {"host_name": "example.com"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(cfg.websites[0].bucket, BucketRef::Name("literal-bucket".to_owned()));
        assert_eq!(cfg.websites[1].bucket, BucketRef::resource("test"));
        assert!(cfg.websites[1].website.redirect_all_requests_to.is_some());
    }

    #[test]
    fn test_should_wrap_invalid_json_as_internal_error() {
        let err = Configuration::from_json("{not json").unwrap_err();
        assert!(matches!(err, VerifyError::Internal(_)));
    }
}
