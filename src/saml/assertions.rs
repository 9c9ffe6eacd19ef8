//! Normalized assertion attributes extracted from a validated SAML response.
//!
//! The toolkit hands back a loosely structured document
//! (`serde_json::Value`). Normalization flattens the per-assertion wrapper
//! and converts every attribute value sequence into a set, so downstream
//! subset comparisons are order-independent.

use crate::authz::Condition;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A single normalized attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// One or more string values, deduplicated and unordered.
    Values(BTreeSet<String>),
    /// A nested attribute map (e.g. structured claims).
    Nested(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Build a value set from anything iterable over strings.
    pub fn values<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Values(items.into_iter().map(Into::into).collect())
    }

    /// Build a nested attribute map.
    #[must_use]
    pub fn nested(map: BTreeMap<String, AttributeValue>) -> Self {
        Self::Nested(map)
    }
}

/// The set of attributes asserted by the IdP for one authenticated user.
///
/// Produced once per successful response validation and read-only afterwards.
/// The `override_condition` slot is reserved for the development override
/// layer; normalization never populates it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssertionSet {
    pub attributes: BTreeMap<String, AttributeValue>,
    #[serde(skip)]
    pub override_condition: Option<Condition>,
}

impl AssertionSet {
    #[must_use]
    pub fn new(attributes: BTreeMap<String, AttributeValue>) -> Self {
        Self {
            attributes,
            override_condition: None,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Normalize the toolkit's nested assertion structure.
///
/// A response may carry several assertions; their attribute maps merge with
/// later assertions winning on key conflicts. An assertion object wrapped as
/// `{"attrs": {...}, ...}` contributes only its `attrs` map.
#[must_use]
pub fn normalize(raw: &serde_json::Value) -> AssertionSet {
    let mut attributes = BTreeMap::new();
    collect(raw, &mut attributes);
    AssertionSet::new(attributes)
}

fn collect(raw: &serde_json::Value, into: &mut BTreeMap<String, AttributeValue>) {
    match raw {
        serde_json::Value::Array(items) => {
            for item in items {
                collect(item, into);
            }
        }
        serde_json::Value::Object(map) => {
            let attrs = match map.get("attrs") {
                Some(serde_json::Value::Object(inner)) => inner,
                _ => map,
            };
            for (name, value) in attrs {
                into.insert(name.clone(), normalize_value(value));
            }
        }
        _ => {}
    }
}

pub(crate) fn normalize_value(value: &serde_json::Value) -> AttributeValue {
    match value {
        serde_json::Value::Object(map) => AttributeValue::Nested(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            AttributeValue::Values(items.iter().map(scalar_to_string).collect())
        }
        other => AttributeValue::Values(BTreeSet::from([scalar_to_string(other)])),
    }
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sequences_become_sets() {
        let a = normalize(&json!({"groups": ["admins", "users"]}));
        let b = normalize(&json!({"groups": ["users", "admins"]}));
        assert_eq!(a.get("groups"), b.get("groups"));
        assert_eq!(
            a.get("groups"),
            Some(&AttributeValue::values(["admins", "users"]))
        );
    }

    #[test]
    fn test_scalar_becomes_singleton_set() {
        let set = normalize(&json!({"lastName": "Jackson"}));
        assert_eq!(
            set.get("lastName"),
            Some(&AttributeValue::values(["Jackson"]))
        );
    }

    #[test]
    fn test_assertion_wrapper_flattened() {
        let set = normalize(&json!([
            {"attrs": {"email": "glen@example.com"}},
            {"attrs": {"groups": ["staff"]}},
        ]));
        assert_eq!(
            set.get("email"),
            Some(&AttributeValue::values(["glen@example.com"]))
        );
        assert_eq!(set.get("groups"), Some(&AttributeValue::values(["staff"])));
    }

    #[test]
    fn test_later_assertions_win_on_conflict() {
        let set = normalize(&json!([
            {"attrs": {"role": "viewer"}},
            {"attrs": {"role": "editor"}},
        ]));
        assert_eq!(set.get("role"), Some(&AttributeValue::values(["editor"])));
    }

    #[test]
    fn test_nested_maps_preserved() {
        let set = normalize(&json!({"address": {"city": "Portland", "zips": ["97201"]}}));
        match set.get("address") {
            Some(AttributeValue::Nested(map)) => {
                assert_eq!(map.get("city"), Some(&AttributeValue::values(["Portland"])));
            }
            other => panic!("expected nested map, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_scalars_stringified() {
        let set = normalize(&json!({"level": 3}));
        assert_eq!(set.get("level"), Some(&AttributeValue::values(["3"])));
    }

    #[test]
    fn test_normalization_never_sets_override() {
        let set = normalize(&json!({"condition": "all"}));
        assert!(set.override_condition.is_none());
        // The raw attribute is still visible as data, not policy.
        assert_eq!(set.get("condition"), Some(&AttributeValue::values(["all"])));
    }
}
