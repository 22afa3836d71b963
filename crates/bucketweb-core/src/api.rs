//! Remote query API.
//!
//! [`WebsiteApi`] is the seam between the verifier and S3. The verifier only
//! ever calls [`WebsiteApi::get_bucket_website`]; the mutating calls are used
//! by the provisioning engine and by out-of-band deletion checks.

use async_trait::async_trait;
use bucketweb_model::{AbsenceReason, ErrorCode, WebsiteConfiguration};

/// Error returned by a [`WebsiteApi`] call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The bucket or its website configuration does not exist.
    #[error("{0}")]
    Absent(AbsenceReason),

    /// Any other service error.
    #[error("{code}: {message}")]
    Service {
        /// Service error code.
        code: ErrorCode,
        /// Human-readable message from the service.
        message: String,
    },

    /// The request never produced a service response.
    #[error("transport error: {0}")]
    Transport(String),

    /// A request or response could not be translated to or from the wire types.
    #[error("invalid website configuration on the wire: {0}")]
    Codec(String),
}

impl RemoteError {
    /// Build an error from a raw service code, classifying absence codes.
    #[must_use]
    pub fn from_code(code: &str, message: impl Into<String>) -> Self {
        let code = ErrorCode::parse(code);
        match code.website_absence() {
            Some(reason) => Self::Absent(reason),
            None => Self::Service {
                code,
                message: message.into(),
            },
        }
    }

    /// The absence this error signals, if any.
    #[must_use]
    pub fn absence(&self) -> Option<AbsenceReason> {
        match self {
            Self::Absent(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Bucket website operations of an S3-compatible service.
#[async_trait]
pub trait WebsiteApi: Send + Sync {
    /// Create an empty bucket.
    async fn create_bucket(&self, bucket: &str) -> Result<(), RemoteError>;

    /// Delete an empty bucket.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), RemoteError>;

    /// Fetch the website configuration attached to `bucket`.
    ///
    /// `Ok(None)` means the call succeeded without returning a configuration.
    async fn get_bucket_website(
        &self,
        bucket: &str,
    ) -> Result<Option<WebsiteConfiguration>, RemoteError>;

    /// Attach or replace the website configuration of `bucket`.
    async fn put_bucket_website(
        &self,
        bucket: &str,
        config: &WebsiteConfiguration,
    ) -> Result<(), RemoteError>;

    /// Remove the website configuration of `bucket`.
    async fn delete_bucket_website(&self, bucket: &str) -> Result<(), RemoteError>;
}
