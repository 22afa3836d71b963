//! Typed model for S3 bucket website configuration.
//!
//! This crate holds the desired-configuration types for the
//! `aws_s3_bucket_website_configuration` resource, the validation rules the
//! remote API enforces on them, the flattening of a configuration into
//! dotted/indexed attribute paths (`routing_rule.0.redirect.0.protocol`), and
//! the S3 error codes used to classify remote absence.

pub mod attributes;
pub mod codes;
pub mod error;
pub mod types;
pub mod validation;

pub use attributes::{Attributes, Flatten, set_elements};
pub use codes::{AbsenceReason, ErrorCode};
pub use error::{ModelError, ModelResult};
pub use types::{
    Condition, ErrorDocument, IndexDocument, Protocol, Redirect, RedirectAllRequestsTo,
    RoutingRule, WebsiteConfiguration,
};
pub use validation::{validate_bucket_name, validate_website_configuration};
