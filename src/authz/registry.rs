//! Route registry for ahead-of-time authorization queries.
//!
//! Maps each guarded route to its compiled condition, populated at
//! route-construction time and immutable afterwards. This lets callers ask
//! "could the current user reach this route?" without invoking it, e.g. to
//! decide whether a link is rendered at all.

use crate::authz::condition::{Compiled, Condition};
use crate::authz::guard::effective_allows;
use crate::saml::assertions::AssertionSet;
use axum::http::Method;

/// Outcome of an ahead-of-time authorization query.
///
/// `NotFound` is not an error: it signals that no guarded route matched, and
/// callers must render it distinctly from an actual `Denied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Permitted,
    Denied,
    NotFound,
}

struct RegisteredRoute {
    method: Method,
    path: String,
    condition: Condition,
    compiled: Compiled,
}

/// Registry of guarded routes and their conditions.
#[derive(Default)]
pub struct RouteRegistry {
    routes: Vec<RegisteredRoute>,
}

impl RouteRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&mut self, method: Method, path: impl Into<String>, condition: Condition) {
        let path = normalize_path(&path.into());
        let compiled = condition.compile();
        tracing::debug!(method = %method, path = %path, condition = ?condition, "Route guard registered");
        self.routes.push(RegisteredRoute {
            method,
            path,
            condition,
            compiled,
        });
    }

    /// Resolve the condition guarding `path`/`method`, if any route matches.
    #[must_use]
    pub fn resolve(&self, path: &str, method: &Method) -> Option<&Condition> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|route| route.method == *method && route.path == path)
            .map(|route| &route.condition)
    }

    /// Ahead-of-time authorization query against the current assertions.
    ///
    /// Applies the same override-aware evaluation as the route guard itself,
    /// so the answer here always agrees with what the guard would decide.
    #[must_use]
    pub fn permit(
        &self,
        path: &str,
        method: &Method,
        assertions: Option<&AssertionSet>,
    ) -> Permission {
        let path = normalize_path(path);
        let Some(route) = self
            .routes
            .iter()
            .find(|route| route.method == *method && route.path == path)
        else {
            return Permission::NotFound;
        };

        if effective_allows(&route.compiled, assertions) {
            Permission::Permitted
        } else {
            Permission::Denied
        }
    }
}

fn normalize_path(path: &str) -> String {
    if path.len() > 1 {
        path.trim_end_matches('/').to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::assertions::normalize;
    use serde_json::json;

    fn registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();
        registry.register(Method::GET, "/profile", Condition::Authenticated);
        registry.register(Method::GET, "/open", Condition::All);
        registry.register(Method::POST, "/admin", Condition::None);
        registry
    }

    #[test]
    fn test_unregistered_path_is_not_found_not_denied() {
        let registry = registry();
        assert_eq!(
            registry.permit("/missing", &Method::GET, None),
            Permission::NotFound
        );
        // Same path, unregistered method.
        assert_eq!(
            registry.permit("/profile", &Method::DELETE, None),
            Permission::NotFound
        );
    }

    #[test]
    fn test_permit_follows_condition() {
        let registry = registry();
        let assertions = normalize(&json!({"email": "glen@example.com"}));

        assert_eq!(
            registry.permit("/profile", &Method::GET, Some(&assertions)),
            Permission::Permitted
        );
        assert_eq!(
            registry.permit("/profile", &Method::GET, None),
            Permission::Denied
        );
        assert_eq!(
            registry.permit("/open", &Method::GET, None),
            Permission::Permitted
        );
        assert_eq!(
            registry.permit("/admin", &Method::POST, Some(&assertions)),
            Permission::Denied
        );
    }

    #[test]
    fn test_permit_is_override_aware() {
        let registry = registry();
        let mut assertions = normalize(&json!({"email": "glen@example.com"}));
        assertions.override_condition = Some(Condition::All);

        assert_eq!(
            registry.permit("/admin", &Method::POST, Some(&assertions)),
            Permission::Permitted
        );
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let registry = registry();
        assert_eq!(
            registry.permit("/profile/", &Method::GET, None),
            Permission::Denied
        );
    }

    #[test]
    fn test_resolve_returns_condition() {
        let registry = registry();
        assert!(matches!(
            registry.resolve("/profile", &Method::GET),
            Some(Condition::Authenticated)
        ));
        assert!(registry.resolve("/missing", &Method::GET).is_none());
    }
}
