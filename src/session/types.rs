//! Session state for the SP authentication flow.

use crate::saml::assertions::AssertionSet;
use std::collections::HashMap;
use thiserror::Error;

/// Default sliding TTL for server-side sessions (30 minutes).
pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 1800;

/// The SAML portion of a session.
///
/// Created when the login redirect is issued (holding the pending request),
/// completed with response and assertions on successful validation, and
/// removed as a whole on logout.
#[derive(Debug, Clone, Default)]
pub struct SamlSession {
    /// Serialized authentication request awaiting its response.
    pub request: Option<String>,
    /// Serialized validated response.
    pub response: Option<String>,
    /// Normalized assertions; presence means "authenticated".
    pub assertions: Option<AssertionSet>,
    /// Raw relay target captured at login time.
    pub relay_state: Option<String>,
}

/// Per-user server-side session.
///
/// `data` is host-owned state that survives SAML logout untouched.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub saml: Option<SamlSession>,
    pub data: HashMap<String, String>,
}

impl Session {
    /// The current assertions, when the session is authenticated.
    #[must_use]
    pub fn assertions(&self) -> Option<&AssertionSet> {
        self.saml.as_ref()?.assertions.as_ref()
    }

    /// Remove the SAML sub-state, leaving host data intact.
    pub fn clear_saml(&mut self) -> bool {
        self.saml.take().is_some()
    }
}

/// Session storage errors.
#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::assertions::normalize;
    use serde_json::json;

    #[test]
    fn test_clear_saml_preserves_host_data() {
        let mut session = Session {
            saml: Some(SamlSession {
                assertions: Some(normalize(&json!({"email": "glen@example.com"}))),
                ..Default::default()
            }),
            data: HashMap::from([("cart".to_string(), "3 items".to_string())]),
        };

        assert!(session.assertions().is_some());
        assert!(session.clear_saml());
        assert!(session.assertions().is_none());
        assert_eq!(session.data.get("cart").map(String::as_str), Some("3 items"));

        // Idempotent.
        assert!(!session.clear_saml());
    }
}
