//! Request/response models for the SP endpoints.

use crate::config::ConsentConfig;
use crate::error::html_escape;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

/// Login redirect query parameters.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LoginQuery {
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// Login response POST form, as delivered by the IdP's POST binding.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginResponseForm {
    #[serde(rename = "SAMLResponse")]
    pub saml_response: String,
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// Logout parameters, accepted as query or form field.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct LogoutParams {
    pub relay_state: Option<String>,
}

/// Diagnostic session summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub authenticated: bool,
    pub has_request: bool,
    pub has_response: bool,
    pub relay_state: Option<String>,
}

/// Consent form state: configuration defaults merged with the visitor's
/// stored choices.
#[derive(Debug, Clone)]
pub struct ConsentState {
    pub summary: Option<String>,
    pub checkboxes: Vec<(String, String, bool)>,
    pub agreed: bool,
    pub stay_signed_in: bool,
}

impl ConsentState {
    #[must_use]
    pub fn from_config(config: &ConsentConfig) -> Self {
        Self {
            summary: config.summary.clone(),
            checkboxes: config
                .checkboxes
                .iter()
                .map(|c| (c.name.clone(), c.label.clone(), c.checked))
                .collect(),
            agreed: false,
            stay_signed_in: false,
        }
    }

    /// Overlay choices previously stored in the consent cookie.
    pub fn merge_cookie(&mut self, stored: &BTreeMap<String, String>) {
        if stored.is_empty() {
            return;
        }
        for (name, _, checked) in &mut self.checkboxes {
            *checked = stored.get(name).is_some_and(|v| is_affirmative(v));
        }
        self.agreed = stored.get("agreed").is_some_and(|v| is_affirmative(v));
        self.stay_signed_in = stored
            .get("stay_signed_in")
            .is_some_and(|v| is_affirmative(v));
    }
}

/// Truthy form values as browsers and config files produce them.
#[must_use]
pub fn is_affirmative(value: &str) -> bool {
    matches!(value, "on" | "true" | "1" | "yes")
}

/// Serialize the submitted consent map for cookie storage.
#[must_use]
pub fn encode_consent_cookie(submitted: &BTreeMap<String, String>) -> String {
    serde_urlencoded::to_string(submitted).unwrap_or_default()
}

/// Parse a consent cookie back into its key/value map.
///
/// The urlencoded parser is lenient, so bare words and junk decode into
/// valueless keys; those pairs are dropped. Tampered or garbage cookies
/// therefore yield an empty map, never an error.
#[must_use]
pub fn decode_consent_cookie(raw: &str) -> BTreeMap<String, String> {
    serde_urlencoded::from_str::<BTreeMap<String, String>>(raw)
        .map(|map| {
            map.into_iter()
                .filter(|(_, value)| !value.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// Render the consent form.
///
/// The form submits via GET back to `action`; `relay_state` rides along as a
/// hidden field when the flow should continue to a relay target afterwards.
#[must_use]
pub fn render_consent_form(
    state: &ConsentState,
    action: &str,
    relay_state: Option<&str>,
) -> String {
    let summary = state
        .summary
        .as_deref()
        .map(|s| format!("<p>{}</p>\n", html_escape(s)))
        .unwrap_or_default();

    let relay_input = relay_state
        .map(|rs| {
            format!(
                "<input type=\"hidden\" name=\"RelayState\" value=\"{}\"/>\n",
                html_escape(rs)
            )
        })
        .unwrap_or_default();

    let mut checkboxes = String::new();
    for (name, label, checked) in &state.checkboxes {
        let checked_attr = if *checked { " checked" } else { "" };
        checkboxes.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"{}\"{}/> {}</label><br/>\n",
            html_escape(name),
            checked_attr,
            html_escape(label)
        ));
    }

    let agreed_attr = if state.agreed { " checked" } else { "" };
    let stay_attr = if state.stay_signed_in { " checked" } else { "" };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Consent</title></head>\n<body>\n\
         {summary}<form method=\"GET\" action=\"{}\">\n{relay_input}{checkboxes}\
         <label><input type=\"checkbox\" name=\"agreed\"{agreed_attr}/> I agree</label><br/>\n\
         <label><input type=\"checkbox\" name=\"stay_signed_in\"{stay_attr}/> Stay signed in</label><br/>\n\
         <input type=\"submit\" value=\"Continue\"/>\n</form>\n</body>\n</html>",
        html_escape(action)
    )
}
