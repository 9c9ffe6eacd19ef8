//! SP configuration.
//!
//! Validated once at startup; invalid configuration (including a malformed
//! override condition) is a fatal [`ConfigError`] and never surfaces at
//! request time.

use crate::authz::Condition;
use crate::error::ConfigError;
use chrono::Duration;
use serde::Deserialize;
use std::collections::HashSet;

use crate::session::DEFAULT_SESSION_TTL_SECONDS;

/// One consent checkbox, rendered in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsentCheckbox {
    pub name: String,
    pub label: String,
    #[serde(default)]
    pub checked: bool,
}

/// Consent step configuration. Presence of this section enables the consent
/// interposition after login.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsentConfig {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub checkboxes: Vec<ConsentCheckbox>,
    /// Lifetime of the consent cookie when the user opts to stay signed in.
    #[serde(default = "default_consent_max_age_days")]
    pub cookie_max_age_days: i64,
}

fn default_consent_max_age_days() -> i64 {
    365
}

/// Service Provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SpConfig {
    /// SP entity ID, also the expected assertion audience.
    pub entity_id: String,
    /// Assertion consumer service URL (the POST login endpoint, absolute).
    pub acs_url: String,
    /// IdP single sign-on URL the login redirect targets.
    pub idp_sso_url: String,
    /// IdP certificate (PEM), passed through to the toolkit.
    pub idp_certificate: String,
    /// SP private key (PEM) for encrypted assertions, when used.
    #[serde(default)]
    pub sp_private_key: Option<String>,

    /// Prefix all SP routes are mounted under.
    #[serde(default = "default_mount_prefix")]
    pub mount_prefix: String,
    /// Fallback relay target when a login carries no `RelayState`.
    #[serde(default)]
    pub default_relay_state: Option<String>,

    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_consent_cookie")]
    pub consent_cookie: String,
    /// Sliding TTL of server-side session state.
    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: i64,
    /// Absolute lifetime of the session cookie, independent of the TTL.
    #[serde(default = "default_cookie_max_age_days")]
    pub cookie_max_age_days: i64,

    #[serde(default)]
    pub consent: Option<ConsentConfig>,

    /// Development-only condition that overrides every route guard.
    /// Must stay unset in production configuration.
    #[serde(default)]
    pub condition_override: Option<serde_json::Value>,
}

fn default_mount_prefix() -> String {
    "/saml".to_string()
}

fn default_session_cookie() -> String {
    "sp_session".to_string()
}

fn default_consent_cookie() -> String {
    "consent".to_string()
}

fn default_session_ttl_seconds() -> i64 {
    DEFAULT_SESSION_TTL_SECONDS
}

fn default_cookie_max_age_days() -> i64 {
    30
}

impl SpConfig {
    /// Minimal configuration with defaults for everything optional.
    pub fn new(
        entity_id: impl Into<String>,
        acs_url: impl Into<String>,
        idp_sso_url: impl Into<String>,
        idp_certificate: impl Into<String>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            acs_url: acs_url.into(),
            idp_sso_url: idp_sso_url.into(),
            idp_certificate: idp_certificate.into(),
            sp_private_key: None,
            mount_prefix: default_mount_prefix(),
            default_relay_state: None,
            session_cookie: default_session_cookie(),
            consent_cookie: default_consent_cookie(),
            session_ttl_seconds: default_session_ttl_seconds(),
            cookie_max_age_days: default_cookie_max_age_days(),
            consent: None,
            condition_override: None,
        }
    }

    /// Validate the configuration. Called once when the SP state is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entity_id.is_empty() {
            return Err(ConfigError::InvalidField {
                field: "entity_id",
                message: "must not be empty".to_string(),
            });
        }
        url::Url::parse(&self.acs_url).map_err(|source| ConfigError::InvalidUrl {
            field: "acs_url",
            source,
        })?;
        url::Url::parse(&self.idp_sso_url).map_err(|source| ConfigError::InvalidUrl {
            field: "idp_sso_url",
            source,
        })?;
        if !self.mount_prefix.starts_with('/') || self.mount_prefix.ends_with('/') {
            return Err(ConfigError::InvalidField {
                field: "mount_prefix",
                message: format!(
                    "must start with '/' and not end with '/': {:?}",
                    self.mount_prefix
                ),
            });
        }
        if self.session_ttl_seconds <= 0 {
            return Err(ConfigError::InvalidField {
                field: "session_ttl_seconds",
                message: "must be positive".to_string(),
            });
        }
        if let Some(relay) = self.default_relay_state.as_deref() {
            crate::saml::relay::safe_target(relay).map_err(|_| ConfigError::InvalidField {
                field: "default_relay_state",
                message: format!("must be a relative path: {relay:?}"),
            })?;
        }
        if let Some(consent) = &self.consent {
            let mut names = HashSet::new();
            for checkbox in &consent.checkboxes {
                if checkbox.name.is_empty() {
                    return Err(ConfigError::InvalidField {
                        field: "consent.checkboxes",
                        message: "checkbox name must not be empty".to_string(),
                    });
                }
                if !names.insert(checkbox.name.as_str()) {
                    return Err(ConfigError::InvalidField {
                        field: "consent.checkboxes",
                        message: format!("duplicate checkbox name: {:?}", checkbox.name),
                    });
                }
            }
        }
        self.parsed_override()?;
        Ok(())
    }

    /// Parse the development override, when configured.
    pub fn parsed_override(&self) -> Result<Option<Condition>, ConfigError> {
        self.condition_override
            .as_ref()
            .map(Condition::from_config)
            .transpose()
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::seconds(self.session_ttl_seconds)
    }

    /// A route path under the mount prefix.
    #[must_use]
    pub fn path(&self, suffix: &str) -> String {
        format!("{}/{}", self.mount_prefix, suffix)
    }

    #[must_use]
    pub fn login_path(&self) -> String {
        self.path("login")
    }

    #[must_use]
    pub fn consent_path(&self) -> String {
        self.path("consent")
    }

    /// Resolve the relay target: explicit parameter, configured default,
    /// then the root path.
    #[must_use]
    pub fn relay_or_default(&self, relay_state: Option<&str>) -> String {
        relay_state
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .or_else(|| self.default_relay_state.clone())
            .unwrap_or_else(|| "/".to_string())
    }
}
