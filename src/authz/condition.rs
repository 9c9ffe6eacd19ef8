//! Access conditions and their compiled predicate form.
//!
//! A [`Condition`] is an immutable policy expression attached to a route at
//! configuration time. Compilation resolves the variant once into a plain
//! predicate over assertion sets, so the per-request path never inspects the
//! condition shape.

use crate::error::ConfigError;
use crate::saml::assertions::{AssertionSet, AttributeValue};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A compiled access predicate over an (optional) assertion set.
pub type PredicateFn = Arc<dyn Fn(Option<&AssertionSet>) -> bool + Send + Sync>;

/// Policy expression determining whether an assertion set satisfies an
/// access requirement.
#[derive(Clone)]
pub enum Condition {
    /// Satisfied by any non-null assertion set.
    Authenticated,
    /// Always satisfied.
    All,
    /// Never satisfied.
    None,
    /// Satisfied when every listed attribute is present with an equal value
    /// set; nested maps are checked recursively as submaps.
    SubsetMatch(BTreeMap<String, AttributeValue>),
    /// Arbitrary predicate; receives the assertion set (possibly absent).
    Predicate(PredicateFn),
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => write!(f, "Authenticated"),
            Self::All => write!(f, "All"),
            Self::None => write!(f, "None"),
            Self::SubsetMatch(map) => f.debug_tuple("SubsetMatch").field(map).finish(),
            Self::Predicate(_) => write!(f, "Predicate(..)"),
        }
    }
}

impl Condition {
    /// Wrap a closure as a predicate condition.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(Option<&AssertionSet>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Arc::new(f))
    }

    /// Parse a condition from its configuration representation.
    ///
    /// Accepts the keywords `"all"`, `"none"` and `"authenticated"`, or an
    /// attribute map for a subset match. Any other shape is a fatal
    /// configuration error, raised at startup rather than at request time.
    pub fn from_config(value: &serde_json::Value) -> Result<Self, ConfigError> {
        match value {
            serde_json::Value::String(keyword) => match keyword.as_str() {
                "all" => Ok(Self::All),
                "none" => Ok(Self::None),
                "authenticated" => Ok(Self::Authenticated),
                other => Err(ConfigError::InvalidCondition(format!(
                    "unknown condition keyword: {other:?}"
                ))),
            },
            serde_json::Value::Object(map) => {
                let entries = map
                    .iter()
                    .map(|(k, v)| (k.clone(), crate::saml::assertions::normalize_value(v)))
                    .collect();
                Ok(Self::SubsetMatch(entries))
            }
            other => Err(ConfigError::InvalidCondition(format!(
                "expected keyword or attribute map, got {other}"
            ))),
        }
    }

    /// Resolve this condition into its predicate form.
    #[must_use]
    pub fn compile(&self) -> Compiled {
        let predicate: PredicateFn = match self {
            Self::Authenticated => Arc::new(|assertions| assertions.is_some()),
            Self::All => Arc::new(|_| true),
            Self::None => Arc::new(|_| false),
            Self::SubsetMatch(map) => {
                let map = map.clone();
                Arc::new(move |assertions| {
                    assertions.is_some_and(|set| subset_matches(&map, &set.attributes))
                })
            }
            Self::Predicate(f) => f.clone(),
        };
        Compiled(predicate)
    }
}

/// A condition resolved into a callable predicate.
#[derive(Clone)]
pub struct Compiled(PredicateFn);

impl Compiled {
    #[must_use]
    pub fn allows(&self, assertions: Option<&AssertionSet>) -> bool {
        (self.0)(assertions)
    }
}

impl fmt::Debug for Compiled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Compiled(..)")
    }
}

/// Submap test: every expected key must be present with a matching value.
fn subset_matches(
    expected: &BTreeMap<String, AttributeValue>,
    actual: &BTreeMap<String, AttributeValue>,
) -> bool {
    expected.iter().all(|(key, want)| {
        actual
            .get(key)
            .is_some_and(|have| value_matches(want, have))
    })
}

/// Value sets must be equal; nested maps recurse as submaps.
fn value_matches(want: &AttributeValue, have: &AttributeValue) -> bool {
    match (want, have) {
        (AttributeValue::Values(w), AttributeValue::Values(h)) => w == h,
        (AttributeValue::Nested(w), AttributeValue::Nested(h)) => subset_matches(w, h),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::assertions::normalize;
    use serde_json::json;

    fn assertions(value: serde_json::Value) -> AssertionSet {
        normalize(&value)
    }

    #[test]
    fn test_fixed_truth_table() {
        let present = assertions(json!({"lastName": "Jackson"}));
        for (condition, with_assertions, without) in [
            (Condition::All, true, true),
            (Condition::None, false, false),
            (Condition::Authenticated, true, false),
        ] {
            let compiled = condition.compile();
            assert_eq!(compiled.allows(Some(&present)), with_assertions, "{condition:?}");
            assert_eq!(compiled.allows(Option::None), without, "{condition:?}");
        }
    }

    #[test]
    fn test_subset_match_ignores_extra_attributes() {
        let condition =
            Condition::from_config(&json!({"lastName": "Jackson"})).unwrap();
        let compiled = condition.compile();

        let set = assertions(json!({"lastName": "Jackson", "firstName": "Glen"}));
        assert!(compiled.allows(Some(&set)));

        let other = assertions(json!({"lastName": "Smith"}));
        assert!(!compiled.allows(Some(&other)));
    }

    #[test]
    fn test_subset_match_requires_set_equality() {
        let condition = Condition::from_config(&json!({"groups": ["a", "b"]})).unwrap();
        let compiled = condition.compile();

        // Order-independent equality.
        assert!(compiled.allows(Some(&assertions(json!({"groups": ["b", "a"]})))));
        // A superset is not equal.
        assert!(!compiled.allows(Some(&assertions(json!({"groups": ["a", "b", "c"]})))));
    }

    #[test]
    fn test_subset_match_nested_maps_recurse() {
        let condition =
            Condition::from_config(&json!({"address": {"city": "Portland"}})).unwrap();
        let compiled = condition.compile();

        let set = assertions(json!({"address": {"city": "Portland", "state": "OR"}}));
        assert!(compiled.allows(Some(&set)));

        let wrong = assertions(json!({"address": {"state": "OR"}}));
        assert!(!compiled.allows(Some(&wrong)));
    }

    #[test]
    fn test_subset_match_null_assertions_denied() {
        let condition = Condition::from_config(&json!({"lastName": "Jackson"})).unwrap();
        assert!(!condition.compile().allows(Option::None));
    }

    #[test]
    fn test_predicate_receives_possibly_null_assertions() {
        let condition = Condition::predicate(|a| a.is_none());
        let compiled = condition.compile();
        assert!(compiled.allows(Option::None));
        assert!(!compiled.allows(Some(&assertions(json!({"x": "y"})))));
    }

    #[test]
    fn test_from_config_rejects_invalid_shapes() {
        assert!(matches!(
            Condition::from_config(&json!("sometimes")),
            Err(ConfigError::InvalidCondition(_))
        ));
        assert!(matches!(
            Condition::from_config(&json!(42)),
            Err(ConfigError::InvalidCondition(_))
        ));
        assert!(matches!(
            Condition::from_config(&json!(["all"])),
            Err(ConfigError::InvalidCondition(_))
        ));
    }

    #[test]
    fn test_from_config_keywords() {
        assert!(matches!(
            Condition::from_config(&json!("all")).unwrap(),
            Condition::All
        ));
        assert!(matches!(
            Condition::from_config(&json!("none")).unwrap(),
            Condition::None
        ));
        assert!(matches!(
            Condition::from_config(&json!("authenticated")).unwrap(),
            Condition::Authenticated
        ));
    }
}
