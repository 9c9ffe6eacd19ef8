//! Logout: clears the SAML sub-state while preserving host session data.

use crate::error::SpResult;
use crate::models::LogoutParams;
use crate::router::SpState;
use crate::saml::relay;
use crate::session::SessionContext;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

/// Clear the session's SAML fields. Responds 303 to the relay target when a
/// `relay_state` parameter (query or form) is given, 204 otherwise — the
/// latter serves AJAX callers, the former plain HTML form submissions.
#[utoipa::path(
    post,
    path = "/saml/logout",
    params(LogoutParams),
    responses(
        (status = 204, description = "Logged out"),
        (status = 303, description = "Logged out, redirecting to relay target"),
    ),
    tag = "SAML"
)]
pub async fn logout(
    State(state): State<SpState>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<LogoutParams>,
    form: Option<Form<LogoutParams>>,
) -> SpResult<Response> {
    let relay_token = query
        .relay_state
        .or_else(|| form.and_then(|Form(f)| f.relay_state))
        .filter(|s| !s.is_empty());

    if let (Some(key), Some(mut session)) = (ctx.key, ctx.session) {
        if session.clear_saml() {
            tracing::info!("SAML session cleared on logout");
        }
        state
            .sessions
            .put(&key, session, state.config.session_ttl())
            .await?;
    }

    match relay_token {
        Some(token) => {
            let target = relay::decode(&token)?;
            let target = relay::safe_target(&target)?;
            Ok(Redirect::to(target).into_response())
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
