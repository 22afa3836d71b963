//! Acceptance fixtures.
//!
//! Every fixture declares one `aws_s3_bucket.test` with a `public-read` ACL
//! and one `aws_s3_bucket_website_configuration.test` attached to it by
//! reference. The scenarios cover the full lifecycle of the website
//! configuration resource.

use bucketweb_model::{
    Condition, Protocol, Redirect, RedirectAllRequestsTo, RoutingRule, WebsiteConfiguration,
};

use crate::compare::AttrCheck;
use crate::engine::{BucketBlock, BucketRef, Configuration, WebsiteBlock};
use crate::scenario::{Check, Scenario, Step};
use crate::state::ResourceAddress;

const LOCAL_NAME: &str = "test";

/// `aws_s3_bucket_website_configuration.test`
#[must_use]
pub fn website_address() -> ResourceAddress {
    ResourceAddress::website(LOCAL_NAME)
}

/// `aws_s3_bucket.test`
#[must_use]
pub fn bucket_address() -> ResourceAddress {
    ResourceAddress::bucket(LOCAL_NAME)
}

fn with_website(bucket: &str, website: WebsiteConfiguration) -> Configuration {
    Configuration {
        buckets: vec![BucketBlock {
            name: LOCAL_NAME.to_owned(),
            bucket: bucket.to_owned(),
            acl: Some("public-read".to_owned()),
        }],
        websites: vec![WebsiteBlock {
            name: LOCAL_NAME.to_owned(),
            bucket: BucketRef::resource(LOCAL_NAME),
            website,
        }],
    }
}

fn documents() -> WebsiteConfiguration {
    WebsiteConfiguration::with_index("index.html").error_document("error.html")
}

/// Index document only.
#[must_use]
pub fn basic(bucket: &str) -> Configuration {
    with_website(bucket, WebsiteConfiguration::with_index("index.html"))
}

/// Index and error documents.
#[must_use]
pub fn update(bucket: &str) -> Configuration {
    with_website(bucket, documents())
}

/// Redirect every request to `example.com`.
#[must_use]
pub fn redirect(bucket: &str) -> Configuration {
    with_website(
        bucket,
        WebsiteConfiguration::redirect_all(RedirectAllRequestsTo::new("example.com")),
    )
}

/// `docs/` is rewritten to `documents/`.
#[must_use]
pub fn routing_optional_redirection(bucket: &str) -> Configuration {
    with_website(
        bucket,
        documents().routing_rule(RoutingRule::when(
            Condition::key_prefix("docs/"),
            Redirect::replace_key_prefix_with("documents/"),
        )),
    )
}

/// 404 responses are rewritten to the `report-404` prefix.
#[must_use]
pub fn routing_redirect_errors(bucket: &str) -> Configuration {
    with_website(
        bucket,
        documents().routing_rule(RoutingRule::when(
            Condition::http_error_code("404"),
            Redirect::replace_key_prefix_with("report-404"),
        )),
    )
}

/// `images/` is sent to `errorpage.html`.
#[must_use]
pub fn routing_redirect_to_page(bucket: &str) -> Configuration {
    with_website(
        bucket,
        documents().routing_rule(RoutingRule::when(
            Condition::key_prefix("images/"),
            Redirect::replace_key_with("errorpage.html"),
        )),
    )
}

/// One unconditional rule redirecting to `errorpage.html` over HTTPS.
#[must_use]
pub fn routing_redirect_only(bucket: &str) -> Configuration {
    with_website(
        bucket,
        documents().routing_rule(RoutingRule::unconditional(
            Redirect::replace_key_with("errorpage.html").with_protocol(Protocol::Https),
        )),
    )
}

/// `images/` and `docs/` both go to `errorpage.html`.
#[must_use]
pub fn routing_multiple_rules(bucket: &str) -> Configuration {
    with_website(
        bucket,
        documents()
            .routing_rule(RoutingRule::when(
                Condition::key_prefix("images/"),
                Redirect::replace_key_with("errorpage.html"),
            ))
            .routing_rule(RoutingRule::when(
                Condition::key_prefix("docs/"),
                Redirect::replace_key_with("errorpage.html"),
            )),
    )
}

fn exists() -> Check {
    Check::Exists(website_address())
}

fn bucket_pair() -> Check {
    Check::pair(website_address(), "bucket", bucket_address(), "id")
}

fn attrs(checks: impl IntoIterator<Item = AttrCheck>) -> Check {
    Check::attrs(website_address(), checks)
}

fn keyed_rule<'a>(condition: (&'a str, &'a str), redirect: (&'a str, &'a str)) -> AttrCheck {
    AttrCheck::set_elem(
        "routing_rule",
        [("condition.#", "1"), condition, ("redirect.#", "1"), redirect],
    )
}

fn import() -> Step {
    Step::import_verify(website_address())
}

/// Create, check, import.
#[must_use]
pub fn basic_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "basic",
        [
            Step::apply(
                basic(bucket),
                [
                    exists(),
                    bucket_pair(),
                    attrs([
                        AttrCheck::equals("index_document.#", "1"),
                        AttrCheck::equals("index_document.0.suffix", "index.html"),
                    ]),
                ],
            ),
            import(),
        ],
    )
}

/// Delete out of band and expect drift.
#[must_use]
pub fn disappears_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "disappears",
        [Step::apply(basic(bucket), [exists(), Check::Disappears(website_address())])
            .expecting_drift()],
    )
}

/// Add an error document in place.
#[must_use]
pub fn update_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "update",
        [
            Step::apply(basic(bucket), [exists()]),
            Step::apply(
                update(bucket),
                [
                    exists(),
                    bucket_pair(),
                    attrs([
                        AttrCheck::equals("index_document.#", "1"),
                        AttrCheck::equals("index_document.0.suffix", "index.html"),
                        AttrCheck::equals("error_document.#", "1"),
                        AttrCheck::equals("error_document.0.key", "error.html"),
                    ]),
                ],
            ),
            import(),
        ],
    )
}

/// Redirect all requests.
#[must_use]
pub fn redirect_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "redirect",
        [
            Step::apply(
                redirect(bucket),
                [
                    exists(),
                    bucket_pair(),
                    attrs([
                        AttrCheck::equals("redirect_all_requests_to.#", "1"),
                        AttrCheck::equals("redirect_all_requests_to.0.host_name", "example.com"),
                        AttrCheck::absent("index_document.#"),
                        AttrCheck::absent("routing_rule.#"),
                    ]),
                ],
            ),
            import(),
        ],
    )
}

/// Swap a single conditional rule through three variants.
#[must_use]
pub fn condition_and_redirect_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "routing_rules_condition_and_redirect",
        [
            Step::apply(
                routing_optional_redirection(bucket),
                [
                    exists(),
                    attrs([
                        AttrCheck::equals("routing_rule.#", "1"),
                        keyed_rule(
                            ("condition.0.key_prefix_equals", "docs/"),
                            ("redirect.0.replace_key_prefix_with", "documents/"),
                        ),
                    ]),
                ],
            ),
            import(),
            Step::apply(
                routing_redirect_errors(bucket),
                [
                    exists(),
                    attrs([
                        AttrCheck::equals("routing_rule.#", "1"),
                        keyed_rule(
                            ("condition.0.http_error_code_returned_equals", "404"),
                            ("redirect.0.replace_key_prefix_with", "report-404"),
                        ),
                    ]),
                ],
            ),
            import(),
            Step::apply(
                routing_redirect_to_page(bucket),
                [
                    exists(),
                    attrs([
                        AttrCheck::equals("routing_rule.#", "1"),
                        keyed_rule(
                            ("condition.0.key_prefix_equals", "images/"),
                            ("redirect.0.replace_key_with", "errorpage.html"),
                        ),
                    ]),
                ],
            ),
            import(),
        ],
    )
}

/// Two rules matched as a set, then shrink back to the basic fixture.
#[must_use]
pub fn multiple_rules_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "routing_rules_multiple_rules",
        [
            Step::apply(
                routing_multiple_rules(bucket),
                [
                    exists(),
                    attrs([
                        AttrCheck::equals("routing_rule.#", "2"),
                        keyed_rule(
                            ("condition.0.key_prefix_equals", "docs/"),
                            ("redirect.0.replace_key_with", "errorpage.html"),
                        ),
                        keyed_rule(
                            ("condition.0.key_prefix_equals", "images/"),
                            ("redirect.0.replace_key_with", "errorpage.html"),
                        ),
                    ]),
                ],
            ),
            import(),
            Step::apply(
                basic(bucket),
                [
                    exists(),
                    attrs([
                        AttrCheck::absent("routing_rule.#"),
                        AttrCheck::absent("error_document.#"),
                    ]),
                ],
            ),
        ],
    )
}

/// One unconditional HTTPS rule.
#[must_use]
pub fn redirect_only_scenario(bucket: &str) -> Scenario {
    Scenario::new(
        "routing_rules_redirect_only",
        [
            Step::apply(
                routing_redirect_only(bucket),
                [
                    exists(),
                    attrs([
                        AttrCheck::equals("routing_rule.#", "1"),
                        AttrCheck::set_elem(
                            "routing_rule",
                            [
                                ("redirect.#", "1"),
                                ("redirect.0.protocol", "https"),
                                ("redirect.0.replace_key_with", "errorpage.html"),
                            ],
                        ),
                    ]),
                ],
            ),
            import(),
        ],
    )
}

/// The full acceptance suite, one fresh bucket name per scenario.
#[must_use]
pub fn acceptance_scenarios(mut bucket_name: impl FnMut() -> String) -> Vec<Scenario> {
    let builders: [fn(&str) -> Scenario; 7] = [
        basic_scenario,
        disappears_scenario,
        update_scenario,
        redirect_scenario,
        condition_and_redirect_scenario,
        multiple_rules_scenario,
        redirect_only_scenario,
    ];
    builders.iter().map(|build| build(&bucket_name())).collect()
}

#[cfg(test)]
mod tests {
    use bucketweb_model::validate_website_configuration;

    use super::*;

    #[test]
    fn test_should_declare_valid_fixtures() {
        let fixtures = [
            basic("b"),
            update("b"),
            redirect("b"),
            routing_optional_redirection("b"),
            routing_redirect_errors("b"),
            routing_redirect_to_page("b"),
            routing_redirect_only("b"),
            routing_multiple_rules("b"),
        ];
        for config in &fixtures {
            assert_eq!(config.buckets[0].acl.as_deref(), Some("public-read"));
            assert!(validate_website_configuration(&config.websites[0].website).is_ok());
        }
    }

    #[test]
    fn test_should_build_seven_scenarios_with_distinct_buckets() {
        let mut n = 0;
        let scenarios = acceptance_scenarios(|| {
            n += 1;
            format!("bucket-{n}")
        });
        assert_eq!(scenarios.len(), 7);
        let Step::Apply { config, .. } = &scenarios[6].steps[0] else {
            panic!("first step should apply");
        };
        assert_eq!(config.buckets[0].bucket, "bucket-7");
    }

    #[test]
    fn test_should_expect_drift_only_for_disappears() {
        let scenario = disappears_scenario("b");
        assert!(matches!(
            scenario.steps[0],
            Step::Apply { expect_drift: true, .. }
        ));
        assert!(matches!(
            basic_scenario("b").steps[0],
            Step::Apply { expect_drift: false, .. }
        ));
    }
}
