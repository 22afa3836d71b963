//! Existence, attribute, and destruction checks.
//!
//! [`Verifier`] answers questions about tracked resources by querying the
//! remote API directly. It never mutates tracked state.

use bucketweb_model::WebsiteConfiguration;
use tracing::{debug, warn};

use crate::api::WebsiteApi;
use crate::compare::{AttrCheck, compare_attributes};
use crate::error::{VerifyError, VerifyResult};
use crate::state::{ResourceAddress, ResourceKind, TrackedResource, TrackedState};

/// Checks tracked resources against a [`WebsiteApi`].
#[derive(Debug)]
pub struct Verifier<'a, A: ?Sized> {
    api: &'a A,
}

fn lookup<'s>(state: &'s TrackedState, address: &ResourceAddress) -> VerifyResult<&'s TrackedResource> {
    let resource = state
        .get(address)
        .ok_or_else(|| VerifyError::NotFound(address.clone()))?;
    if resource.id.is_empty() {
        return Err(VerifyError::EmptyIdentifier(address.clone()));
    }
    Ok(resource)
}

impl<'a, A: WebsiteApi + ?Sized> Verifier<'a, A> {
    /// Create a verifier over `api`.
    #[must_use]
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Confirm that the website configuration at `address` exists remotely.
    ///
    /// Returns the observed configuration on success.
    pub async fn verify_exists(
        &self,
        state: &TrackedState,
        address: &ResourceAddress,
    ) -> VerifyResult<WebsiteConfiguration> {
        let resource = lookup(state, address)?;
        match self.api.get_bucket_website(&resource.id).await {
            Ok(Some(config)) => {
                debug!(%address, bucket = %resource.id, "resource exists");
                Ok(config)
            }
            Ok(None) => Err(VerifyError::MissingRemoteState(resource.id.clone())),
            Err(source) => Err(VerifyError::RemoteQuery {
                bucket: resource.id.clone(),
                source,
            }),
        }
    }

    /// Confirm that no website configuration in `state` still exists.
    ///
    /// Resources of other kinds are skipped. Both absence codes count as
    /// success. Every resource is checked; the first failure is returned.
    pub async fn verify_destroyed(&self, state: &TrackedState) -> VerifyResult<()> {
        let mut first_failure = None;

        for resource in state.of_kind(ResourceKind::BucketWebsiteConfiguration) {
            let failure = match self.api.get_bucket_website(&resource.id).await {
                Err(err) if err.absence().is_some() => {
                    debug!(address = %resource.address, reason = %err, "resource is absent");
                    continue;
                }
                Ok(None) => continue,
                Ok(Some(_)) => VerifyError::StillExists(resource.id.clone()),
                Err(source) => VerifyError::RemoteQuery {
                    bucket: resource.id.clone(),
                    source,
                },
            };
            warn!(address = %resource.address, error = %failure, "destroy check failed");
            first_failure.get_or_insert(failure);
        }

        first_failure.map_or(Ok(()), Err)
    }

    /// Delete the remote website configuration behind the engine's back.
    pub async fn check_disappears(
        &self,
        state: &TrackedState,
        address: &ResourceAddress,
    ) -> VerifyResult<()> {
        let resource = lookup(state, address)?;
        self.api
            .delete_bucket_website(&resource.id)
            .await
            .map_err(|source| VerifyError::Apply {
                address: address.clone(),
                source,
            })?;
        debug!(%address, bucket = %resource.id, "deleted out of band");
        Ok(())
    }

    /// Evaluate attribute checks against the tracked attributes at `address`.
    pub fn check_attributes(
        &self,
        state: &TrackedState,
        address: &ResourceAddress,
        checks: &[AttrCheck],
    ) -> VerifyResult<()> {
        let resource = state
            .get(address)
            .ok_or_else(|| VerifyError::NotFound(address.clone()))?;
        compare_attributes(&address.to_string(), &resource.attributes, checks)
    }

    /// `path` on `address` must equal `other_path` on `other`.
    pub fn check_attribute_pair(
        &self,
        state: &TrackedState,
        address: &ResourceAddress,
        path: &str,
        other: &ResourceAddress,
        other_path: &str,
    ) -> VerifyResult<()> {
        let value = state
            .get(other)
            .ok_or_else(|| VerifyError::NotFound(other.clone()))?
            .attributes
            .get(other_path)
            .ok_or_else(|| VerifyError::AttributeMismatch {
                address: other.to_string(),
                path: other_path.to_owned(),
                expected: "<set>".to_owned(),
                actual: None,
            })?;
        self.check_attributes(state, address, &[AttrCheck::equals(path, value)])
    }
}
