//! In-process [`WebsiteApi`] backend.
//!
//! Buckets live in a `DashMap`; each bucket's website configuration sits
//! behind its own `RwLock`. Faults can be injected per bucket to exercise
//! the verifier's error paths without a network.

use async_trait::async_trait;
use bucketweb_model::{AbsenceReason, ErrorCode, WebsiteConfiguration};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::api::{RemoteError, WebsiteApi};

/// Injected behavior for `get_bucket_website` on one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail with this error.
    Error(RemoteError),
    /// Succeed without returning a configuration.
    EmptyResponse,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    website: RwLock<Option<WebsiteConfiguration>>,
}

/// In-memory S3 website backend.
#[derive(Debug, Default)]
pub struct MemoryWebsiteApi {
    buckets: DashMap<String, MemoryBucket>,
    faults: DashMap<String, Fault>,
    website_reads: DashMap<String, usize>,
    reverse_routing_rules: bool,
}

impl MemoryWebsiteApi {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return routing rules in reverse declaration order, like a remote
    /// service that does not preserve ordering.
    #[must_use]
    pub fn with_reversed_routing_rules(mut self) -> Self {
        self.reverse_routing_rules = true;
        self
    }

    /// Inject a fault for `get_bucket_website` on `bucket` until cleared.
    pub fn inject_fault(&self, bucket: &str, fault: Fault) {
        self.faults.insert(bucket.to_owned(), fault);
    }

    /// Remove an injected fault.
    pub fn clear_fault(&self, bucket: &str) {
        self.faults.remove(bucket);
    }

    /// How many times `get_bucket_website` was called for `bucket`.
    #[must_use]
    pub fn website_reads(&self, bucket: &str) -> usize {
        self.website_reads.get(bucket).map_or(0, |n| *n)
    }

    /// Whether `bucket` exists.
    #[must_use]
    pub fn bucket_exists(&self, bucket: &str) -> bool {
        self.buckets.contains_key(bucket)
    }

    /// Number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn no_such_bucket() -> RemoteError {
        RemoteError::Absent(AbsenceReason::BucketNotFound)
    }
}

#[async_trait]
impl WebsiteApi for MemoryWebsiteApi {
    async fn create_bucket(&self, bucket: &str) -> Result<(), RemoteError> {
        if self.buckets.contains_key(bucket) {
            return Err(RemoteError::Service {
                code: ErrorCode::parse("BucketAlreadyOwnedByYou"),
                message: format!("bucket {bucket} already exists"),
            });
        }
        self.buckets.insert(bucket.to_owned(), MemoryBucket::default());
        debug!(bucket = %bucket, "create_bucket completed");
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), RemoteError> {
        self.buckets
            .remove(bucket)
            .ok_or_else(Self::no_such_bucket)?;
        debug!(bucket = %bucket, "delete_bucket completed");
        Ok(())
    }

    async fn get_bucket_website(
        &self,
        bucket: &str,
    ) -> Result<Option<WebsiteConfiguration>, RemoteError> {
        *self.website_reads.entry(bucket.to_owned()).or_default() += 1;
        if let Some(fault) = self.faults.get(bucket) {
            return match fault.value() {
                Fault::Error(err) => Err(err.clone()),
                Fault::EmptyResponse => Ok(None),
            };
        }

        let entry = self.buckets.get(bucket).ok_or_else(Self::no_such_bucket)?;
        let website = entry.website.read();
        let Some(config) = website.as_ref() else {
            return Err(RemoteError::Absent(
                AbsenceReason::WebsiteConfigurationNotFound,
            ));
        };

        let mut config = config.clone();
        if self.reverse_routing_rules {
            config.routing_rules.reverse();
        }
        Ok(Some(config))
    }

    async fn put_bucket_website(
        &self,
        bucket: &str,
        config: &WebsiteConfiguration,
    ) -> Result<(), RemoteError> {
        let entry = self.buckets.get(bucket).ok_or_else(Self::no_such_bucket)?;
        *entry.website.write() = Some(config.clone());
        debug!(bucket = %bucket, "put_bucket_website completed");
        Ok(())
    }

    async fn delete_bucket_website(&self, bucket: &str) -> Result<(), RemoteError> {
        let entry = self.buckets.get(bucket).ok_or_else(Self::no_such_bucket)?;
        *entry.website.write() = None;
        debug!(bucket = %bucket, "delete_bucket_website completed");
        Ok(())
    }
}
