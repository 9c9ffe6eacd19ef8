//! Session loader layer.
//!
//! Runs before every route in the SP router: resolves the session cookie to
//! stored state, refreshes the sliding TTL, and places the session context
//! and current assertions into request extensions for the guard and the
//! handlers downstream.

use crate::router::SpState;
use crate::saml::assertions::AssertionSet;
use crate::session::types::Session;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

/// The resolved session for the current request.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Session key from the cookie, when one was presented.
    pub key: Option<String>,
    /// The live session, when the key resolved to unexpired state.
    pub session: Option<Session>,
}

/// The current request's assertions, if any.
#[derive(Debug, Clone, Default)]
pub struct CurrentAssertions(pub Option<AssertionSet>);

pub async fn session_loader(
    State(state): State<SpState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let key = jar
        .get(&state.config.session_cookie)
        .map(|cookie| cookie.value().to_string());

    let mut session = None;
    if let Some(key) = key.as_deref() {
        // Sliding expiration: every access through this layer refreshes the
        // TTL, atomically with the read.
        match state
            .sessions
            .get_and_touch(key, state.config.session_ttl())
            .await
        {
            Ok(Some(found)) => session = Some(found),
            Ok(None) => {
                tracing::debug!("Session cookie did not resolve to live state");
            }
            Err(error) => {
                tracing::error!(error = %error, "Session load failed");
            }
        }
    }

    let assertions = session.as_ref().and_then(|s| s.assertions().cloned());
    request
        .extensions_mut()
        .insert(SessionContext { key, session });
    request.extensions_mut().insert(CurrentAssertions(assertions));

    next.run(request).await
}
