//! Lifecycle verifier for the `aws_s3_bucket_website_configuration` resource.
//!
//! A [`Scenario`] drives a [`ProvisioningEngine`] through declared
//! configurations. After each apply it checks that the website configuration
//! exists remotely and that its flattened attributes match expectations,
//! with routing rules compared as an unordered set. Every scenario ends by
//! destroying what it created and confirming that nothing survived.
//!
//! Two [`WebsiteApi`] backends are provided: [`MemoryWebsiteApi`] for
//! in-process runs and [`SdkWebsiteApi`] for a real or S3-compatible
//! endpoint.

pub mod api;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod memory;
pub mod scenario;
pub mod sdk;
pub mod state;
pub mod verifier;

pub use api::{RemoteError, WebsiteApi};
pub use compare::{AttrCheck, compare_attributes, compare_sets};
pub use config::VerifierConfig;
pub use engine::{
    BucketBlock, BucketRef, Configuration, ProvisioningEngine, WebsiteBlock, WebsiteEngine,
    website_attributes,
};
pub use error::{VerifyError, VerifyResult};
pub use memory::{Fault, MemoryWebsiteApi};
pub use scenario::{Check, Scenario, ScenarioReport, Stage, Step, run_scenarios};
pub use sdk::SdkWebsiteApi;
pub use state::{ResourceAddress, ResourceKind, TrackedResource, TrackedState};
pub use verifier::Verifier;
