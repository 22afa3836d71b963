//! Error types for the website configuration model.

/// Validation and parsing errors for website configurations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Bucket name violates S3 naming rules.
    #[error("invalid bucket name {name:?}: {reason}")]
    InvalidBucketName {
        /// The offending bucket name.
        name: String,
        /// Which rule was violated.
        reason: String,
    },

    /// Protocol string is neither `http` nor `https`.
    #[error("unknown redirect protocol: {0}")]
    UnknownProtocol(String),

    /// Neither an index document nor a redirect-all target was declared.
    #[error("website configuration requires index_document or redirect_all_requests_to")]
    MissingIndexDocument,

    /// `redirect_all_requests_to` was combined with another field.
    #[error("redirect_all_requests_to conflicts with {0}")]
    RedirectAllConflict(&'static str),

    /// A field that must carry a value was empty or malformed.
    #[error("invalid value for {field}: {reason}")]
    InvalidField {
        /// Flattened attribute path of the field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A routing rule condition set both of its matchers.
    #[error("routing_rule.{index}.condition sets both key_prefix_equals and http_error_code_returned_equals")]
    AmbiguousCondition {
        /// Position of the routing rule.
        index: usize,
    },

    /// A redirect set both key replacement forms.
    #[error("routing_rule.{index}.redirect sets both replace_key_with and replace_key_prefix_with")]
    ConflictingKeyReplacement {
        /// Position of the routing rule.
        index: usize,
    },

    /// More routing rules than S3 accepts.
    #[error("too many routing rules: {count} (maximum {max})")]
    TooManyRoutingRules {
        /// Declared rule count.
        count: usize,
        /// Allowed maximum.
        max: usize,
    },
}

/// Convenience result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
