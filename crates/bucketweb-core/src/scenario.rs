//! Scenario runner.
//!
//! A [`Scenario`] is an ordered list of steps driven against a
//! [`ProvisioningEngine`]. Each apply step is followed by its checks and a
//! drift check. Whatever happens, the runner destroys everything the engine
//! tracks and verifies that nothing survived.

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::api::WebsiteApi;
use crate::compare::{AttrCheck, compare_sets};
use crate::engine::{Configuration, ProvisioningEngine, WebsiteEngine};
use crate::error::{VerifyError, VerifyResult};
use crate::state::ResourceAddress;
use crate::verifier::Verifier;

/// Check run after an apply step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// The website configuration exists remotely.
    Exists(ResourceAddress),
    /// Tracked attributes satisfy every check.
    Attrs {
        /// Resource to inspect.
        address: ResourceAddress,
        /// Expectations.
        checks: Vec<AttrCheck>,
    },
    /// An attribute equals an attribute of another resource.
    AttrPair {
        /// Resource to inspect.
        address: ResourceAddress,
        /// Attribute on `address`.
        path: String,
        /// Resource holding the expected value.
        other: ResourceAddress,
        /// Attribute on `other`.
        other_path: String,
    },
    /// Delete the remote configuration out of band.
    Disappears(ResourceAddress),
}

impl Check {
    /// Attribute checks on one resource.
    #[must_use]
    pub fn attrs(address: ResourceAddress, checks: impl IntoIterator<Item = AttrCheck>) -> Self {
        Self::Attrs {
            address,
            checks: checks.into_iter().collect(),
        }
    }

    /// Attribute pair check.
    #[must_use]
    pub fn pair(
        address: ResourceAddress,
        path: impl Into<String>,
        other: ResourceAddress,
        other_path: impl Into<String>,
    ) -> Self {
        Self::AttrPair {
            address,
            path: path.into(),
            other,
            other_path: other_path.into(),
        }
    }
}

/// One scenario step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Apply a configuration, run checks, then look for drift.
    Apply {
        /// Desired state.
        config: Configuration,
        /// Checks, run in order.
        checks: Vec<Check>,
        /// Whether the post-apply refresh must report drift.
        expect_drift: bool,
    },
    /// Re-read a resource by identifier and compare it with tracked state.
    ImportVerify {
        /// Resource to import.
        address: ResourceAddress,
        /// Repeated group compared without regard to order.
        unordered_set: String,
    },
}

impl Step {
    /// Apply step that expects no drift.
    #[must_use]
    pub fn apply(config: Configuration, checks: impl IntoIterator<Item = Check>) -> Self {
        Self::Apply {
            config,
            checks: checks.into_iter().collect(),
            expect_drift: false,
        }
    }

    /// Import-verify step for a website configuration.
    #[must_use]
    pub fn import_verify(address: ResourceAddress) -> Self {
        Self::ImportVerify {
            address,
            unordered_set: "routing_rule".to_owned(),
        }
    }

    /// Require drift after this apply step.
    #[must_use]
    pub fn expecting_drift(mut self) -> Self {
        if let Self::Apply { expect_drift, .. } = &mut self {
            *expect_drift = true;
        }
        self
    }
}

/// Lifecycle stage of a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing applied yet.
    Declared,
    /// An apply step succeeded.
    Applied,
    /// The checks of the latest apply step passed.
    Verified,
    /// Teardown ran.
    Destroyed,
    /// Teardown was verified.
    VerifiedAbsent,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Declared => "declared",
            Self::Applied => "applied",
            Self::Verified => "verified",
            Self::Destroyed => "destroyed",
            Self::VerifiedAbsent => "verified-absent",
        };
        f.write_str(s)
    }
}

/// Named sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// Scenario name, used in logs and reports.
    pub name: String,
    /// Steps, run in order.
    pub steps: Vec<Step>,
}

/// Outcome of one scenario.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Last stage reached.
    pub stage: Stage,
    /// First failure, if any.
    pub result: VerifyResult<()>,
}

impl ScenarioReport {
    /// Whether the scenario passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

impl Scenario {
    /// Create a scenario.
    #[must_use]
    pub fn new(name: impl Into<String>, steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            name: name.into(),
            steps: steps.into_iter().collect(),
        }
    }

    /// Run every step, then tear down and verify destruction.
    ///
    /// Teardown always runs, even after a failed step. A step failure takes
    /// precedence over a teardown failure in the report.
    pub async fn run<E, A>(&self, engine: &mut E, api: &A) -> ScenarioReport
    where
        E: ProvisioningEngine + ?Sized,
        A: WebsiteApi + ?Sized,
    {
        let mut stage = Stage::Declared;
        let outcome = self.run_steps(engine, api, &mut stage).await;
        if let Err(err) = &outcome {
            warn!(scenario = %self.name, %stage, error = %err, "step failed");
        }

        let teardown = match engine.destroy().await {
            Ok(snapshot) => {
                stage = Stage::Destroyed;
                Verifier::new(api).verify_destroyed(&snapshot).await
            }
            Err(err) => Err(err),
        };
        if teardown.is_ok() {
            stage = Stage::VerifiedAbsent;
        }

        let result = outcome.and(teardown);
        info!(scenario = %self.name, %stage, passed = result.is_ok(), "scenario finished");
        ScenarioReport {
            name: self.name.clone(),
            stage,
            result,
        }
    }

    async fn run_steps<E, A>(&self, engine: &mut E, api: &A, stage: &mut Stage) -> VerifyResult<()>
    where
        E: ProvisioningEngine + ?Sized,
        A: WebsiteApi + ?Sized,
    {
        let verifier = Verifier::new(api);

        for (index, step) in self.steps.iter().enumerate() {
            debug!(scenario = %self.name, step = index + 1, "running step");
            match step {
                Step::Apply {
                    config,
                    checks,
                    expect_drift,
                } => {
                    engine.apply(config).await?;
                    *stage = Stage::Applied;

                    for check in checks {
                        run_check(&verifier, engine, check).await?;
                    }

                    let drifted = engine.refresh().await?;
                    match (*expect_drift, drifted.is_empty()) {
                        (true, true) => return Err(VerifyError::MissingDrift),
                        (false, false) => return Err(VerifyError::UnexpectedDrift(drifted)),
                        _ => {}
                    }
                    *stage = Stage::Verified;
                }
                Step::ImportVerify {
                    address,
                    unordered_set,
                } => verify_import(engine, address, unordered_set).await?,
            }
        }
        Ok(())
    }
}

async fn run_check<E, A>(verifier: &Verifier<'_, A>, engine: &E, check: &Check) -> VerifyResult<()>
where
    E: ProvisioningEngine + ?Sized,
    A: WebsiteApi + ?Sized,
{
    let state = engine.state();
    match check {
        Check::Exists(address) => verifier.verify_exists(state, address).await.map(drop),
        Check::Attrs { address, checks } => verifier.check_attributes(state, address, checks),
        Check::AttrPair {
            address,
            path,
            other,
            other_path,
        } => verifier.check_attribute_pair(state, address, path, other, other_path),
        Check::Disappears(address) => verifier.check_disappears(state, address).await,
    }
}

/// Import `address` by its tracked identifier and compare with tracked state.
async fn verify_import<E>(engine: &E, address: &ResourceAddress, unordered_set: &str) -> VerifyResult<()>
where
    E: ProvisioningEngine + ?Sized,
{
    let tracked = engine
        .state()
        .get(address)
        .ok_or_else(|| VerifyError::NotFound(address.clone()))?;
    let imported = engine.import(address, &tracked.id).await?;
    compare_sets(
        &address.to_string(),
        &imported.attributes,
        &tracked.attributes,
        unordered_set,
    )?;
    debug!(%address, "import matches tracked state");
    Ok(())
}

/// Run each scenario on its own tokio task with its own [`WebsiteEngine`]
/// over a shared API.
///
/// Reports come back in input order. A scenario whose task panics is
/// reported as an internal failure at [`Stage::Declared`].
pub async fn run_scenarios<A>(
    api: Arc<A>,
    website_domain: &str,
    scenarios: &[Scenario],
) -> Vec<ScenarioReport>
where
    A: WebsiteApi + ?Sized + 'static,
{
    let (names, handles): (Vec<_>, Vec<_>) = scenarios
        .iter()
        .cloned()
        .map(|scenario| {
            let api = Arc::clone(&api);
            let domain = website_domain.to_owned();
            let span = info_span!("scenario", name = %scenario.name);
            let name = scenario.name.clone();
            let handle = tokio::spawn(
                async move {
                    let mut engine = WebsiteEngine::new(Arc::clone(&api), domain);
                    scenario.run(&mut engine, &*api).await
                }
                .instrument(span),
            );
            (name, handle)
        })
        .unzip();

    join_all(handles)
        .await
        .into_iter()
        .zip(names)
        .map(|(joined, name)| {
            joined.unwrap_or_else(|err| ScenarioReport {
                result: Err(VerifyError::Internal(anyhow::anyhow!(
                    "scenario task {name} failed: {err}"
                ))),
                name,
                stage: Stage::Declared,
            })
        })
        .collect()
}
