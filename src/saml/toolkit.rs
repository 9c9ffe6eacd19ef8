//! Interface to the external SAML toolkit.
//!
//! XML parsing, signing, and cryptographic validation are delegated to an
//! opaque toolkit implementation behind this trait. Request/response
//! correlation and replay prevention live in the toolkit's own state manager
//! and must be safe under concurrent pending login attempts.

use crate::config::SpConfig;
use thiserror::Error;

/// A serialized authentication request ready for the redirect binding.
#[derive(Debug, Clone)]
pub struct AuthnRequestDoc {
    /// The request's unique message ID.
    pub id: String,
    /// The raw request document, stored in the session for diagnostics.
    pub xml: String,
    /// Wire encoding of the request for the `SAMLRequest` parameter.
    pub encoded: String,
}

/// A validated response document.
#[derive(Debug, Clone)]
pub struct ResponseDoc {
    /// The raw response document, stored in the session for diagnostics.
    pub xml: String,
    /// The request ID this response answers, when present.
    pub in_response_to: Option<String>,
}

/// Validation inputs handed to the toolkit alongside the response payload.
#[derive(Debug, Clone)]
pub struct ValidationPolicy {
    /// Expected audience (the SP entity ID).
    pub audience: String,
    /// Expected assertion consumer service URL.
    pub acs_url: String,
    /// IdP certificate (PEM), opaque to this crate.
    pub idp_certificate: String,
    /// SP private key (PEM) for encrypted assertions, when configured.
    pub sp_private_key: Option<String>,
}

/// Response failed cryptographic or policy validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("signature validation failed: {0}")]
    Signature(String),

    #[error("assertion expired: {0}")]
    Expired(String),

    #[error("audience mismatch: expected {expected}, got {actual}")]
    AudienceMismatch { expected: String, actual: String },

    #[error("request correlation failed: {0}")]
    Correlation(String),
}

/// Non-validation toolkit failure (request generation, metadata rendering).
#[derive(Debug, Error)]
#[error("SAML toolkit error: {0}")]
pub struct ToolkitError(pub String);

/// The external SAML toolkit.
///
/// Calls are synchronous; the validation call is the only operation in this
/// layer that touches the crypto stack.
pub trait SamlToolkit: Send + Sync {
    /// Build an authentication request message for the configured IdP.
    fn build_request(&self, config: &SpConfig) -> Result<AuthnRequestDoc, ToolkitError>;

    /// Validate a decoded response document against the policy.
    fn validate(
        &self,
        response_xml: &str,
        policy: &ValidationPolicy,
    ) -> Result<ResponseDoc, ValidationError>;

    /// Extract the nested assertion structure from a validated response.
    fn extract_assertions(&self, response: &ResponseDoc) -> serde_json::Value;

    /// Render SP metadata XML.
    fn render_metadata(&self, config: &SpConfig) -> Result<String, ToolkitError>;
}
