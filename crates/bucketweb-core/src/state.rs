//! Tracked resource state.
//!
//! [`TrackedState`] is what the provisioning engine believes exists after an
//! apply. Each scenario owns its own state exclusively, so it is a plain
//! ordered map with no interior locking.

use std::collections::BTreeMap;
use std::fmt;

use bucketweb_model::Attributes;
use serde::{Deserialize, Serialize};

/// Kind of resource managed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// `aws_s3_bucket`
    #[serde(rename = "aws_s3_bucket")]
    Bucket,
    /// `aws_s3_bucket_website_configuration`
    #[serde(rename = "aws_s3_bucket_website_configuration")]
    BucketWebsiteConfiguration,
}

impl ResourceKind {
    /// The resource type name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Bucket => "aws_s3_bucket",
            Self::BucketWebsiteConfiguration => "aws_s3_bucket_website_configuration",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// `type.name` address of a declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceAddress {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Local name within the configuration.
    pub name: String,
}

impl ResourceAddress {
    /// Create an address.
    #[must_use]
    pub fn new(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Address of an `aws_s3_bucket`.
    #[must_use]
    pub fn bucket(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::Bucket, name)
    }

    /// Address of an `aws_s3_bucket_website_configuration`.
    #[must_use]
    pub fn website(name: impl Into<String>) -> Self {
        Self::new(ResourceKind::BucketWebsiteConfiguration, name)
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

/// A resource recorded after apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedResource {
    /// Where the resource is declared.
    pub address: ResourceAddress,
    /// Remote identifier; the bucket name for both kinds.
    pub id: String,
    /// Flattened attributes as last read back from the remote API.
    pub attributes: Attributes,
}

/// Resources the engine currently tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedState {
    resources: BTreeMap<ResourceAddress, TrackedResource>,
}

impl TrackedState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a tracked resource.
    #[must_use]
    pub fn get(&self, address: &ResourceAddress) -> Option<&TrackedResource> {
        self.resources.get(address)
    }

    /// Record a resource, replacing any previous entry at the same address.
    pub fn insert(&mut self, resource: TrackedResource) -> Option<TrackedResource> {
        self.resources.insert(resource.address.clone(), resource)
    }

    /// Stop tracking a resource.
    pub fn remove(&mut self, address: &ResourceAddress) -> Option<TrackedResource> {
        self.resources.remove(address)
    }

    /// All tracked resources of `kind`, in address order.
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &TrackedResource> {
        self.resources.values().filter(move |r| r.address.kind == kind)
    }

    /// Number of tracked resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
