//! Flattened attribute paths.
//!
//! A website configuration is flattened into `path -> value` pairs using the
//! dotted/indexed convention of declarative resource state: every nested
//! block is a list, so a single index document becomes
//! `index_document.# = 1` plus `index_document.0.suffix = index.html`.
//! Unset optional leaves are omitted; absent blocks still record `.# = 0`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{
    Condition, ErrorDocument, IndexDocument, Redirect, RedirectAllRequestsTo, RoutingRule,
    WebsiteConfiguration,
};

/// Ordered map of flattened attribute paths to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, String>);

impl Attributes {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the value at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    /// Set `path` to `value`, returning the previous value.
    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(path.into(), value.into())
    }

    /// Whether `path` has a value.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains_key(path)
    }

    /// Number of attribute paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(path, value)` pairs in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Copy of this map without the elements of the repeated group `set`.
    ///
    /// The group's `set.#` count is kept.
    #[must_use]
    pub fn without_group(&self, set: &str) -> Self {
        self.0
            .iter()
            .filter(|(k, _)| element_index(k, set).is_none())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl FromIterator<(String, String)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }
}

/// If `path` is `set.N.rest`, returns `(N, rest)`.
fn element_index<'p>(path: &'p str, set: &str) -> Option<(usize, &'p str)> {
    let tail = path.strip_prefix(set)?.strip_prefix('.')?;
    let (index, rest) = tail.split_once('.')?;
    Some((index.parse().ok()?, rest))
}

/// Split the repeated group `set` into its elements.
///
/// Each element's keys are relative to the element, so
/// `routing_rule.1.redirect.0.protocol` appears as `redirect.0.protocol` in
/// the second element. Elements are returned in index order.
#[must_use]
pub fn set_elements(attrs: &Attributes, set: &str) -> Vec<Attributes> {
    let mut elements: BTreeMap<usize, Attributes> = BTreeMap::new();
    for (path, value) in attrs.iter() {
        if let Some((index, rest)) = element_index(path, set) {
            elements.entry(index).or_default().insert(rest, value);
        }
    }
    elements.into_values().collect()
}

/// Conversion of a typed value into flattened attribute paths.
pub trait Flatten {
    /// Write this value's attributes under `prefix` (empty, or ending in `.`).
    fn flatten_into(&self, prefix: &str, out: &mut Attributes);

    /// Flatten into a fresh map with no prefix.
    fn flatten(&self) -> Attributes {
        let mut out = Attributes::new();
        self.flatten_into("", &mut out);
        out
    }
}

fn leaf(out: &mut Attributes, prefix: &str, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.insert(format!("{prefix}{name}"), value);
    }
}

fn block<T: Flatten>(out: &mut Attributes, prefix: &str, name: &str, value: Option<&T>) {
    list(out, prefix, name, value.into_iter());
}

fn list<'a, T: Flatten + 'a>(
    out: &mut Attributes,
    prefix: &str,
    name: &str,
    items: impl Iterator<Item = &'a T>,
) {
    let mut count = 0usize;
    for (i, item) in items.enumerate() {
        item.flatten_into(&format!("{prefix}{name}.{i}."), out);
        count += 1;
    }
    out.insert(format!("{prefix}{name}.#"), count.to_string());
}

impl Flatten for IndexDocument {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        leaf(out, prefix, "suffix", Some(self.suffix.as_str()));
    }
}

impl Flatten for ErrorDocument {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        leaf(out, prefix, "key", Some(self.key.as_str()));
    }
}

impl Flatten for RedirectAllRequestsTo {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        leaf(out, prefix, "host_name", Some(self.host_name.as_str()));
        leaf(out, prefix, "protocol", self.protocol.map(|p| p.as_str()));
    }
}

impl Flatten for Condition {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        leaf(
            out,
            prefix,
            "http_error_code_returned_equals",
            self.http_error_code_returned_equals.as_deref(),
        );
        leaf(out, prefix, "key_prefix_equals", self.key_prefix_equals.as_deref());
    }
}

impl Flatten for Redirect {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        leaf(out, prefix, "host_name", self.host_name.as_deref());
        leaf(out, prefix, "http_redirect_code", self.http_redirect_code.as_deref());
        leaf(out, prefix, "protocol", self.protocol.map(|p| p.as_str()));
        leaf(
            out,
            prefix,
            "replace_key_prefix_with",
            self.replace_key_prefix_with.as_deref(),
        );
        leaf(out, prefix, "replace_key_with", self.replace_key_with.as_deref());
    }
}

impl Flatten for RoutingRule {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        block(out, prefix, "condition", self.condition.as_ref());
        block(out, prefix, "redirect", Some(&self.redirect));
    }
}

impl Flatten for WebsiteConfiguration {
    fn flatten_into(&self, prefix: &str, out: &mut Attributes) {
        block(out, prefix, "index_document", self.index_document.as_ref());
        block(out, prefix, "error_document", self.error_document.as_ref());
        block(
            out,
            prefix,
            "redirect_all_requests_to",
            self.redirect_all_requests_to.as_ref(),
        );
        list(out, prefix, "routing_rule", self.routing_rules.iter());
    }
}
