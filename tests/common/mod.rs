#![allow(dead_code)]

//! Shared test harness: a scripted toolkit stand-in plus request helpers.

use axum::body::Body;
use axum::http::{header, Request, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use portcullis_saml::config::SpConfig;
use portcullis_saml::router::SpState;
use portcullis_saml::saml::{
    AuthnRequestDoc, ResponseDoc, SamlToolkit, ToolkitError, ValidationError, ValidationPolicy,
};
use portcullis_saml::session::InMemorySessionStore;
use serde_json::json;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

pub const REQUEST_ID: &str = "_req-0001";
pub const REQUEST_XML: &str = "<samlp:AuthnRequest ID=\"_req-0001\"/>";
pub const RESPONSE_XML: &str = "<samlp:Response InResponseTo=\"_req-0001\"/>";

/// Response payloads containing this marker fail validation.
pub const BAD_SIGNATURE_MARKER: &str = "bad-signature";

/// Scripted [`SamlToolkit`]: deterministic request documents, validation
/// keyed off a payload marker, and a fixed assertion document.
pub struct MockToolkit {
    pub assertions: serde_json::Value,
}

impl MockToolkit {
    pub fn new(assertions: serde_json::Value) -> Self {
        Self { assertions }
    }
}

impl Default for MockToolkit {
    fn default() -> Self {
        Self::new(json!({
            "firstName": "Glen",
            "lastName": "Jackson",
            "group": "eng",
        }))
    }
}

impl SamlToolkit for MockToolkit {
    fn build_request(&self, _config: &SpConfig) -> Result<AuthnRequestDoc, ToolkitError> {
        Ok(AuthnRequestDoc {
            id: REQUEST_ID.to_string(),
            xml: REQUEST_XML.to_string(),
            encoded: STANDARD.encode(REQUEST_XML),
        })
    }

    fn validate(
        &self,
        response_xml: &str,
        _policy: &ValidationPolicy,
    ) -> Result<ResponseDoc, ValidationError> {
        if response_xml.contains(BAD_SIGNATURE_MARKER) {
            return Err(ValidationError::Signature(
                "digest mismatch".to_string(),
            ));
        }
        Ok(ResponseDoc {
            xml: response_xml.to_string(),
            in_response_to: Some(REQUEST_ID.to_string()),
        })
    }

    fn extract_assertions(&self, _response: &ResponseDoc) -> serde_json::Value {
        self.assertions.clone()
    }

    fn render_metadata(&self, config: &SpConfig) -> Result<String, ToolkitError> {
        Ok(format!(
            "<md:EntityDescriptor entityID=\"{}\"/>",
            config.entity_id
        ))
    }
}

pub fn test_config() -> SpConfig {
    SpConfig::new(
        "https://sp.example.com/saml/meta",
        "https://sp.example.com/saml/login",
        "https://idp.example.com/sso",
        "-----BEGIN CERTIFICATE-----\nMIIC\n-----END CERTIFICATE-----",
    )
}

pub fn test_state(config: SpConfig) -> SpState {
    test_state_with(config, MockToolkit::default())
}

pub fn test_state_with(config: SpConfig, toolkit: MockToolkit) -> SpState {
    init_test_logging();
    SpState::builder(
        config,
        Arc::new(toolkit),
        Arc::new(InMemorySessionStore::new()),
    )
    .build()
    .expect("test configuration should validate")
}

/// The IdP's POST binding payload: base64 of the response document.
pub fn post_binding(response_xml: &str) -> String {
    STANDARD.encode(response_xml)
}

/// Urlencode form fields the way a submitting browser would; base64
/// payloads contain `+`, which must not reach the body unescaped.
pub fn form_body(fields: &[(&str, &str)]) -> String {
    serde_urlencoded::to_string(fields).unwrap()
}

/// The ACS POST body a browser submits: an encoded `SAMLResponse` plus an
/// optional `RelayState` token.
pub fn login_form(response_xml: &str, relay_token: Option<&str>) -> String {
    let saml_response = post_binding(response_xml);
    let mut fields = vec![("SAMLResponse", saml_response.as_str())];
    if let Some(token) = relay_token {
        fields.push(("RelayState", token));
    }
    form_body(&fields)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, body: String, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
}

/// Extract `name=value` from the response's `Set-Cookie` headers, for
/// replaying in a follow-up request's `Cookie` header.
pub fn set_cookie(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(|v| v.split(';').next().unwrap().to_string())
}

/// The full `Set-Cookie` header for a cookie, attributes included.
pub fn set_cookie_raw(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .map(ToString::to_string)
}
