//! Error taxonomy for the SP layer.
//!
//! Only [`AuthError::Denied`] is meaningful to end users; everything else is
//! logged with full detail and rendered as a generic message, so internal
//! failure detail never leaks into a response body.

use crate::authz::Condition;
use crate::saml::relay::RelayError;
use crate::saml::toolkit::{ToolkitError, ValidationError};
use crate::session::SessionError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Result type for SP handler operations.
pub type SpResult<T> = Result<T, AuthError>;

/// Fatal configuration errors, raised at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A condition was configured with an invalid shape.
    #[error("invalid condition shape: {0}")]
    InvalidCondition(String),

    #[error("invalid {field}: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },

    #[error("invalid URL in {field}: {source}")]
    InvalidUrl {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Request-time errors of the SP layer.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Access denied by a condition. Carries the original condition as
    /// metadata and, for unauthenticated requesters, a login URL whose
    /// RelayState encodes the path that was denied.
    #[error("authorization denied")]
    Denied {
        condition: Condition,
        authenticated: bool,
        login_url: Option<String>,
    },

    /// SAML response failed cryptographic or policy validation.
    #[error("SAML response validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Response payload was not transportable (bad base64/UTF-8).
    #[error("malformed SAML response payload: {0}")]
    MalformedResponse(String),

    /// Relay token failed to decode or named a non-relative target.
    #[error("invalid relay state: {0}")]
    Relay(#[from] RelayError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("toolkit error: {0}")]
    Toolkit(#[from] ToolkitError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::Denied {
                authenticated: true,
                condition,
                ..
            } => {
                tracing::debug!(condition = ?condition, "Rendering forbidden response");
                (StatusCode::FORBIDDEN, Html("<p>Forbidden</p>".to_string())).into_response()
            }
            Self::Denied {
                authenticated: false,
                login_url,
                ..
            } => {
                let body = match login_url {
                    Some(url) => format!(
                        "<p>Forbidden</p><p><a href=\"{}\">Log in</a></p>",
                        html_escape(&url)
                    ),
                    None => "<p>Forbidden</p>".to_string(),
                };
                (StatusCode::FORBIDDEN, Html(body)).into_response()
            }
            // An invalid response is an authentication failure, not a client
            // syntax error: 403, with the specifics kept to the log.
            Self::Validation(error) => {
                tracing::warn!(error = %error, "SAML response validation failed");
                (
                    StatusCode::FORBIDDEN,
                    Html("<p>SAML response validation failed</p>".to_string()),
                )
                    .into_response()
            }
            Self::MalformedResponse(detail) => {
                tracing::warn!(detail = %detail, "Malformed SAML response payload");
                (
                    StatusCode::BAD_REQUEST,
                    Html("<p>Malformed SAML response</p>".to_string()),
                )
                    .into_response()
            }
            Self::Relay(error) => {
                tracing::warn!(error = %error, "Rejected relay state");
                (
                    StatusCode::BAD_REQUEST,
                    Html("<p>Invalid relay state</p>".to_string()),
                )
                    .into_response()
            }
            Self::Session(error) => {
                tracing::error!(error = %error, "Session storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<p>An internal error occurred</p>".to_string()),
                )
                    .into_response()
            }
            Self::Toolkit(error) => {
                tracing::error!(error = %error, "SAML toolkit failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html("<p>An internal error occurred</p>".to_string()),
                )
                    .into_response()
            }
        }
    }
}

/// HTML escape for XSS prevention.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
