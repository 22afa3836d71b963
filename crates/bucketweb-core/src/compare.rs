//! Attribute comparison.
//!
//! Two comparison modes are supported: scalar equality on a single
//! flattened path, and unordered set membership over a repeated nested
//! group. The second exists because the remote API makes no promise about
//! the order in which it returns routing rules.

use bucketweb_model::{Attributes, set_elements};

use crate::error::{VerifyError, VerifyResult};

/// One expectation on a resource's flattened attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrCheck {
    /// `path` must equal `value`.
    Equals {
        /// Flattened attribute path.
        path: String,
        /// Expected value.
        value: String,
    },
    /// `path` must be unset, or be a zero count.
    Absent {
        /// Flattened attribute path.
        path: String,
    },
    /// Some element of the repeated group `set` must contain every field.
    SetElemNested {
        /// Group name, e.g. `routing_rule`.
        set: String,
        /// Expected fields, keyed relative to the element.
        fields: Attributes,
    },
}

impl AttrCheck {
    /// Scalar equality check.
    #[must_use]
    pub fn equals(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Absence check.
    #[must_use]
    pub fn absent(path: impl Into<String>) -> Self {
        Self::Absent { path: path.into() }
    }

    /// Unordered set-membership check.
    ///
    /// ```
    /// use bucketweb_core::AttrCheck;
    ///
    /// let check = AttrCheck::set_elem("routing_rule", [
    ///     ("condition.#", "1"),
    ///     ("condition.0.key_prefix_equals", "docs/"),
    /// ]);
    /// assert!(matches!(check, AttrCheck::SetElemNested { .. }));
    /// ```
    #[must_use]
    pub fn set_elem<'a>(
        set: impl Into<String>,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        Self::SetElemNested {
            set: set.into(),
            fields: fields.into_iter().collect(),
        }
    }
}

fn render(attrs: &Attributes) -> String {
    let pairs: Vec<String> = attrs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{{{}}}", pairs.join(", "))
}

fn render_all(elements: &[Attributes]) -> Option<String> {
    if elements.is_empty() {
        return None;
    }
    let rendered: Vec<String> = elements.iter().map(render).collect();
    Some(format!("[{}]", rendered.join(", ")))
}

fn mismatch(address: &str, path: &str, expected: String, actual: Option<String>) -> VerifyError {
    VerifyError::AttributeMismatch {
        address: address.to_owned(),
        path: path.to_owned(),
        expected,
        actual,
    }
}

fn contains_all(element: &Attributes, fields: &Attributes) -> bool {
    fields.iter().all(|(k, v)| element.get(k) == Some(v))
}

fn check_one(address: &str, observed: &Attributes, check: &AttrCheck) -> VerifyResult<()> {
    match check {
        AttrCheck::Equals { path, value } => match observed.get(path) {
            Some(actual) if actual == value => Ok(()),
            actual => Err(mismatch(address, path, value.clone(), actual.map(str::to_owned))),
        },
        AttrCheck::Absent { path } => match observed.get(path) {
            None => Ok(()),
            Some("0") if path.ends_with(".#") => Ok(()),
            Some(actual) => Err(mismatch(
                address,
                path,
                "<unset>".to_owned(),
                Some(actual.to_owned()),
            )),
        },
        AttrCheck::SetElemNested { set, fields } => {
            let elements = set_elements(observed, set);
            if elements.iter().any(|e| contains_all(e, fields)) {
                Ok(())
            } else {
                Err(mismatch(
                    address,
                    &format!("{set}.*"),
                    render(fields),
                    render_all(&elements),
                ))
            }
        }
    }
}

/// Compare observed attributes against every check, failing on the first mismatch.
pub fn compare_attributes(
    address: &str,
    observed: &Attributes,
    expected: &[AttrCheck],
) -> VerifyResult<()> {
    expected
        .iter()
        .try_for_each(|check| check_one(address, observed, check))
}

/// Compare two full attribute maps, treating the group `set` as a multiset.
///
/// Paths outside the group must match exactly. Group elements are matched
/// regardless of their index.
pub fn compare_sets(
    address: &str,
    observed: &Attributes,
    expected: &Attributes,
    set: &str,
) -> VerifyResult<()> {
    let observed_rest = observed.without_group(set);
    let expected_rest = expected.without_group(set);

    for (path, value) in expected_rest.iter() {
        if observed_rest.get(path) != Some(value) {
            return Err(mismatch(
                address,
                path,
                value.to_owned(),
                observed_rest.get(path).map(str::to_owned),
            ));
        }
    }
    if let Some((path, value)) = observed_rest.iter().find(|(k, _)| !expected_rest.contains(k)) {
        return Err(mismatch(address, path, "<unset>".to_owned(), Some(value.to_owned())));
    }

    let mut remaining = set_elements(observed, set);
    for element in set_elements(expected, set) {
        match remaining.iter().position(|candidate| *candidate == element) {
            Some(i) => {
                remaining.swap_remove(i);
            }
            None => {
                return Err(mismatch(
                    address,
                    &format!("{set}.*"),
                    render(&element),
                    render_all(&remaining),
                ));
            }
        }
    }
    if let Some(extra) = remaining.first() {
        return Err(mismatch(
            address,
            &format!("{set}.*"),
            "<unset>".to_owned(),
            Some(render(extra)),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bucketweb_model::{Condition, Flatten, Redirect, RoutingRule, WebsiteConfiguration};

    use super::*;

    const ADDR: &str = "aws_s3_bucket_website_configuration.test";

    fn rule(prefix: &str, page: &str) -> RoutingRule {
        RoutingRule::when(Condition::key_prefix(prefix), Redirect::replace_key_with(page))
    }

    fn two_rules(first: &str, second: &str) -> Attributes {
        WebsiteConfiguration::with_index("index.html")
            .error_document("error.html")
            .routing_rule(rule(first, "errorpage.html"))
            .routing_rule(rule(second, "errorpage.html"))
            .flatten()
    }

    fn docs_and_images_checks() -> Vec<AttrCheck> {
        vec![
            AttrCheck::equals("routing_rule.#", "2"),
            AttrCheck::set_elem(
                "routing_rule",
                [
                    ("condition.#", "1"),
                    ("condition.0.key_prefix_equals", "docs/"),
                    ("redirect.#", "1"),
                    ("redirect.0.replace_key_with", "errorpage.html"),
                ],
            ),
            AttrCheck::set_elem(
                "routing_rule",
                [
                    ("condition.#", "1"),
                    ("condition.0.key_prefix_equals", "images/"),
                    ("redirect.#", "1"),
                    ("redirect.0.replace_key_with", "errorpage.html"),
                ],
            ),
        ]
    }

    #[test]
    fn test_should_match_scalar_attributes() {
        let observed = WebsiteConfiguration::with_index("index.html").flatten();
        let checks = [
            AttrCheck::equals("index_document.#", "1"),
            AttrCheck::equals("index_document.0.suffix", "index.html"),
            AttrCheck::absent("redirect_all_requests_to.#"),
            AttrCheck::absent("error_document.0.key"),
        ];
        assert!(compare_attributes(ADDR, &observed, &checks).is_ok());
    }

    #[test]
    fn test_should_name_path_on_scalar_mismatch() {
        let observed = WebsiteConfiguration::with_index("default.htm").flatten();
        let err = compare_attributes(
            ADDR,
            &observed,
            &[AttrCheck::equals("index_document.0.suffix", "index.html")],
        )
        .unwrap_err();

        match err {
            VerifyError::AttributeMismatch {
                path,
                expected,
                actual,
                ..
            } => {
                assert_eq!(path, "index_document.0.suffix");
                assert_eq!(expected, "index.html");
                assert_eq!(actual.as_deref(), Some("default.htm"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_should_match_set_elements_in_any_order() {
        let checks = docs_and_images_checks();
        assert!(compare_attributes(ADDR, &two_rules("images/", "docs/"), &checks).is_ok());
        assert!(compare_attributes(ADDR, &two_rules("docs/", "images/"), &checks).is_ok());
    }

    #[test]
    fn test_should_fail_when_no_set_element_matches() {
        let err = compare_attributes(
            ADDR,
            &two_rules("docs/", "videos/"),
            &docs_and_images_checks(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            VerifyError::AttributeMismatch { ref path, actual: Some(_), .. } if path == "routing_rule.*"
        ));
    }

    #[test]
    fn test_should_require_all_fields_of_one_element() {
        // docs/ exists and report-404 exists, but not in the same rule.
        let observed = WebsiteConfiguration::with_index("index.html")
            .routing_rule(rule("docs/", "errorpage.html"))
            .routing_rule(RoutingRule::when(
                Condition::http_error_code("404"),
                Redirect::replace_key_prefix_with("report-404"),
            ))
            .flatten();
        let check = AttrCheck::set_elem(
            "routing_rule",
            [
                ("condition.0.key_prefix_equals", "docs/"),
                ("redirect.0.replace_key_prefix_with", "report-404"),
            ],
        );
        assert!(compare_attributes(ADDR, &observed, &[check]).is_err());
    }

    #[test]
    fn test_should_report_unset_when_group_is_empty() {
        let observed = WebsiteConfiguration::with_index("index.html").flatten();
        let err = compare_attributes(
            ADDR,
            &observed,
            &[AttrCheck::set_elem("routing_rule", [("redirect.#", "1")])],
        )
        .unwrap_err();
        assert!(matches!(err, VerifyError::AttributeMismatch { actual: None, .. }));
    }

    #[test]
    fn test_should_compare_sets_ignoring_order() {
        let a = two_rules("docs/", "images/");
        let b = two_rules("images/", "docs/");
        assert!(compare_sets(ADDR, &a, &b, "routing_rule").is_ok());
        assert!(compare_sets(ADDR, &a, &a, "routing_rule").is_ok());
    }

    #[test]
    fn test_should_detect_set_difference() {
        let a = two_rules("docs/", "images/");
        let b = two_rules("docs/", "videos/");
        assert!(compare_sets(ADDR, &a, &b, "routing_rule").is_err());
    }

    #[test]
    fn test_should_detect_scalar_difference_outside_set() {
        let a = two_rules("docs/", "images/");
        let mut b = a.clone();
        b.insert("error_document.0.key", "oops.html");
        let err = compare_sets(ADDR, &a, &b, "routing_rule").unwrap_err();
        assert!(matches!(
            err,
            VerifyError::AttributeMismatch { ref path, .. } if path == "error_document.0.key"
        ));
    }

    #[test]
    fn test_should_detect_extra_observed_attribute() {
        let expected = WebsiteConfiguration::with_index("index.html").flatten();
        let mut observed = expected.clone();
        observed.insert("expected_bucket_owner", "123456789012");
        assert!(compare_sets(ADDR, &observed, &expected, "routing_rule").is_err());
    }
}
