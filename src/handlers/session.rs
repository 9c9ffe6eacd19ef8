//! Diagnostic session echo endpoints, guarded by `Condition::Authenticated`.

use crate::models::SessionSummary;
use crate::session::SessionContext;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};

/// Summary of the current SAML session.
#[utoipa::path(
    get,
    path = "/saml/session",
    responses(
        (status = 200, description = "Session summary", body = SessionSummary),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "No SAML session"),
    ),
    tag = "SAML"
)]
pub async fn session_summary(Extension(ctx): Extension<SessionContext>) -> Response {
    match ctx.session.and_then(|s| s.saml) {
        Some(saml) => Json(SessionSummary {
            authenticated: saml.assertions.is_some(),
            has_request: saml.request.is_some(),
            has_response: saml.response.is_some(),
            relay_state: saml.relay_state,
        })
        .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Raw stored authentication request document.
pub async fn session_request(Extension(ctx): Extension<SessionContext>) -> Response {
    echo_document(ctx, |saml| saml.request)
}

/// Raw stored response document.
pub async fn session_response(Extension(ctx): Extension<SessionContext>) -> Response {
    echo_document(ctx, |saml| saml.response)
}

/// Normalized assertions as JSON.
pub async fn session_assertions(Extension(ctx): Extension<SessionContext>) -> Response {
    match ctx.session.and_then(|s| s.saml).and_then(|s| s.assertions) {
        Some(assertions) => Json(assertions).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn echo_document(
    ctx: SessionContext,
    field: impl FnOnce(crate::session::SamlSession) -> Option<String>,
) -> Response {
    match ctx.session.and_then(|s| s.saml).and_then(field) {
        Some(document) => document.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
