//! Verification error types.
//!
//! Every variant is a scenario failure. Nothing here is retried; the only
//! errors that are ever swallowed are the two absence codes accepted by
//! [`Verifier::verify_destroyed`](crate::Verifier::verify_destroyed).

use bucketweb_model::ModelError;

use crate::api::RemoteError;
use crate::state::ResourceAddress;

/// Error produced while applying or verifying a resource.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The resource is not present in tracked state.
    #[error("Not found: {0}")]
    NotFound(ResourceAddress),

    /// The resource is tracked but has an empty identifier.
    #[error("Resource ({0}) ID not set")]
    EmptyIdentifier(ResourceAddress),

    /// Querying the remote API failed.
    #[error("error getting S3 bucket website configuration ({bucket}): {source}")]
    RemoteQuery {
        /// Bucket that was queried.
        bucket: String,
        /// Underlying API error.
        #[source]
        source: RemoteError,
    },

    /// The query succeeded but carried no configuration.
    #[error("S3 bucket website configuration ({0}) not found")]
    MissingRemoteState(String),

    /// A destroyed resource is still live remotely.
    #[error("S3 bucket website configuration ({0}) still exists")]
    StillExists(String),

    /// An observed attribute did not match the expectation.
    #[error("{address}: attribute '{path}' expected {expected:?}, got {}", show_actual(.actual))]
    AttributeMismatch {
        /// Resource whose attributes were compared.
        address: String,
        /// Flattened attribute path, or `group.*` for set checks.
        path: String,
        /// Expected value.
        expected: String,
        /// Observed value, if any.
        actual: Option<String>,
    },

    /// The declared configuration is invalid.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A configuration refers to a resource it does not declare.
    #[error("reference to undeclared resource: {0}")]
    UnresolvedReference(String),

    /// A mutating call made by the provisioning engine failed.
    #[error("error applying {address}: {source}")]
    Apply {
        /// Resource being applied or destroyed.
        address: ResourceAddress,
        /// Underlying API error.
        #[source]
        source: RemoteError,
    },

    /// Remote state drifted from tracked state when no drift was expected.
    #[error("unexpected drift after apply: {}", join(.0))]
    UnexpectedDrift(Vec<ResourceAddress>),

    /// A step expected a non-empty plan, but nothing drifted.
    #[error("expected a non-empty plan after apply, but no resource drifted")]
    MissingDrift,

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn show_actual(actual: &Option<String>) -> String {
    actual
        .as_deref()
        .map_or_else(|| "<unset>".to_owned(), |a| format!("{a:?}"))
}

fn join(addresses: &[ResourceAddress]) -> String {
    addresses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience result type for verifier operations.
pub type VerifyResult<T> = Result<T, VerifyError>;
