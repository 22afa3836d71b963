//! S3 error codes and absence classification.
//!
//! The raw code constants cover the error codes the AWS SDK does not export
//! as constants. Callers should parse a raw code into an [`ErrorCode`] once,
//! at the SDK boundary, and then reason about [`AbsenceReason`] values rather
//! than matching on strings.

use std::fmt;

/// Bucket does not exist.
pub const NO_SUCH_BUCKET: &str = "NoSuchBucket";
/// Generic missing-configuration code.
pub const NO_SUCH_CONFIGURATION: &str = "NoSuchConfiguration";
/// Bucket has no CORS configuration.
pub const NO_SUCH_CORS_CONFIGURATION: &str = "NoSuchCORSConfiguration";
/// Bucket has no lifecycle configuration.
pub const NO_SUCH_LIFECYCLE_CONFIGURATION: &str = "NoSuchLifecycleConfiguration";
/// Bucket has no public access block configuration.
pub const NO_SUCH_PUBLIC_ACCESS_BLOCK_CONFIGURATION: &str = "NoSuchPublicAccessBlockConfiguration";
/// Bucket has no website configuration.
pub const NO_SUCH_WEBSITE_CONFIGURATION: &str = "NoSuchWebsiteConfiguration";
/// Bucket has no object lock configuration.
pub const OBJECT_LOCK_CONFIGURATION_NOT_FOUND: &str = "ObjectLockConfigurationNotFoundError";
/// A conflicting conditional operation is in progress.
pub const OPERATION_ABORTED: &str = "OperationAborted";
/// Bucket has no default encryption configuration.
pub const SERVER_SIDE_ENCRYPTION_CONFIGURATION_NOT_FOUND: &str =
    "ServerSideEncryptionConfigurationNotFoundError";

/// Typed S3 error code.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `NoSuchBucket`
    NoSuchBucket,
    /// `NoSuchConfiguration`
    NoSuchConfiguration,
    /// `NoSuchCORSConfiguration`
    NoSuchCorsConfiguration,
    /// `NoSuchLifecycleConfiguration`
    NoSuchLifecycleConfiguration,
    /// `NoSuchPublicAccessBlockConfiguration`
    NoSuchPublicAccessBlockConfiguration,
    /// `NoSuchWebsiteConfiguration`
    NoSuchWebsiteConfiguration,
    /// `ObjectLockConfigurationNotFoundError`
    ObjectLockConfigurationNotFound,
    /// `OperationAborted`
    OperationAborted,
    /// `ServerSideEncryptionConfigurationNotFoundError`
    ServerSideEncryptionConfigurationNotFound,
    /// Any code without a dedicated variant.
    Other(String),
}

impl ErrorCode {
    /// Parse a raw service error code.
    #[must_use]
    pub fn parse(code: &str) -> Self {
        match code {
            NO_SUCH_BUCKET => Self::NoSuchBucket,
            NO_SUCH_CONFIGURATION => Self::NoSuchConfiguration,
            NO_SUCH_CORS_CONFIGURATION => Self::NoSuchCorsConfiguration,
            NO_SUCH_LIFECYCLE_CONFIGURATION => Self::NoSuchLifecycleConfiguration,
            NO_SUCH_PUBLIC_ACCESS_BLOCK_CONFIGURATION => Self::NoSuchPublicAccessBlockConfiguration,
            NO_SUCH_WEBSITE_CONFIGURATION => Self::NoSuchWebsiteConfiguration,
            OBJECT_LOCK_CONFIGURATION_NOT_FOUND => Self::ObjectLockConfigurationNotFound,
            OPERATION_ABORTED => Self::OperationAborted,
            SERVER_SIDE_ENCRYPTION_CONFIGURATION_NOT_FOUND => {
                Self::ServerSideEncryptionConfigurationNotFound
            }
            other => Self::Other(other.to_owned()),
        }
    }

    /// The wire representation of this code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSuchBucket => NO_SUCH_BUCKET,
            Self::NoSuchConfiguration => NO_SUCH_CONFIGURATION,
            Self::NoSuchCorsConfiguration => NO_SUCH_CORS_CONFIGURATION,
            Self::NoSuchLifecycleConfiguration => NO_SUCH_LIFECYCLE_CONFIGURATION,
            Self::NoSuchPublicAccessBlockConfiguration => NO_SUCH_PUBLIC_ACCESS_BLOCK_CONFIGURATION,
            Self::NoSuchWebsiteConfiguration => NO_SUCH_WEBSITE_CONFIGURATION,
            Self::ObjectLockConfigurationNotFound => OBJECT_LOCK_CONFIGURATION_NOT_FOUND,
            Self::OperationAborted => OPERATION_ABORTED,
            Self::ServerSideEncryptionConfigurationNotFound => {
                SERVER_SIDE_ENCRYPTION_CONFIGURATION_NOT_FOUND
            }
            Self::Other(code) => code,
        }
    }

    /// The absence this code signals for a `GetBucketWebsite` call, if any.
    #[must_use]
    pub fn website_absence(&self) -> Option<AbsenceReason> {
        match self {
            Self::NoSuchBucket => Some(AbsenceReason::BucketNotFound),
            Self::NoSuchWebsiteConfiguration => Some(AbsenceReason::WebsiteConfigurationNotFound),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a website configuration is absent remotely.
///
/// The API reports absence differently depending on whether the whole
/// bucket is gone or only its website sub-configuration; both count as a
/// completed deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbsenceReason {
    /// The owning bucket does not exist.
    BucketNotFound,
    /// The bucket exists but has no website configuration.
    WebsiteConfigurationNotFound,
}

impl AbsenceReason {
    /// The error code the remote API uses for this absence.
    #[must_use]
    pub fn code(self) -> ErrorCode {
        match self {
            Self::BucketNotFound => ErrorCode::NoSuchBucket,
            Self::WebsiteConfigurationNotFound => ErrorCode::NoSuchWebsiteConfiguration,
        }
    }
}

impl fmt::Display for AbsenceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_known_codes() {
        for code in [
            NO_SUCH_BUCKET,
            NO_SUCH_CONFIGURATION,
            NO_SUCH_CORS_CONFIGURATION,
            NO_SUCH_LIFECYCLE_CONFIGURATION,
            NO_SUCH_PUBLIC_ACCESS_BLOCK_CONFIGURATION,
            NO_SUCH_WEBSITE_CONFIGURATION,
            OBJECT_LOCK_CONFIGURATION_NOT_FOUND,
            OPERATION_ABORTED,
            SERVER_SIDE_ENCRYPTION_CONFIGURATION_NOT_FOUND,
        ] {
            let parsed = ErrorCode::parse(code);
            assert!(!matches!(parsed, ErrorCode::Other(_)), "{code} should be known");
            assert_eq!(parsed.as_str(), code);
        }
    }

    #[test]
    fn test_should_keep_unknown_codes() {
        let code = ErrorCode::parse("AccessDenied");
        assert_eq!(code, ErrorCode::Other("AccessDenied".to_owned()));
        assert_eq!(code.to_string(), "AccessDenied");
        assert_eq!(code.website_absence(), None);
    }

    #[test]
    fn test_should_classify_exactly_two_website_absences() {
        assert_eq!(
            ErrorCode::parse("NoSuchBucket").website_absence(),
            Some(AbsenceReason::BucketNotFound)
        );
        assert_eq!(
            ErrorCode::parse("NoSuchWebsiteConfiguration").website_absence(),
            Some(AbsenceReason::WebsiteConfigurationNotFound)
        );
        assert_eq!(ErrorCode::NoSuchConfiguration.website_absence(), None);
        assert_eq!(ErrorCode::NoSuchCorsConfiguration.website_absence(), None);
    }

    #[test]
    fn test_should_round_trip_absence_codes() {
        for reason in [
            AbsenceReason::BucketNotFound,
            AbsenceReason::WebsiteConfigurationNotFound,
        ] {
            assert_eq!(reason.code().website_absence(), Some(reason));
        }
    }
}
