//! Per-request authorization enforcement.
//!
//! The guard runs as a route layer after the session loader. A failed check
//! never unwinds: it is converted to a 403 response right here, which keeps
//! the "handled far from the call site" property of the processing chain
//! without exception-style control flow.

use crate::authz::condition::{Compiled, Condition};
use crate::error::AuthError;
use crate::saml::assertions::AssertionSet;
use crate::saml::relay;
use crate::session::CurrentAssertions;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Override-aware evaluation: an override condition carried by the assertion
/// set replaces the route's base predicate. The override slot is only ever
/// populated by the development override layer.
#[must_use]
pub fn effective_allows(base: &Compiled, assertions: Option<&AssertionSet>) -> bool {
    match assertions.and_then(|a| a.override_condition.as_ref()) {
        Some(override_condition) => override_condition.compile().allows(assertions),
        None => base.allows(assertions),
    }
}

/// Inline check: `Ok(())` when the condition permits the assertions,
/// otherwise an [`AuthError::Denied`] carrying the condition as metadata.
pub fn require(
    condition: &Condition,
    assertions: Option<&AssertionSet>,
) -> Result<(), AuthError> {
    if effective_allows(&condition.compile(), assertions) {
        Ok(())
    } else {
        Err(AuthError::Denied {
            condition: condition.clone(),
            authenticated: assertions.is_some(),
            login_url: None,
        })
    }
}

/// Branch on an authorization decision without surfacing an error.
pub fn evaluate<T>(
    condition: &Condition,
    assertions: Option<&AssertionSet>,
    on_permit: impl FnOnce() -> T,
    on_deny: impl FnOnce() -> T,
) -> T {
    if effective_allows(&condition.compile(), assertions) {
        on_permit()
    } else {
        on_deny()
    }
}

/// State for one guarded route: the base condition, compiled once at
/// route-construction time, plus the login path used to build the
/// unauthenticated denial prompt.
#[derive(Clone)]
pub struct GuardContext {
    condition: Condition,
    compiled: Compiled,
    login_path: String,
}

impl GuardContext {
    #[must_use]
    pub fn new(condition: Condition, login_path: impl Into<String>) -> Self {
        let compiled = condition.compile();
        Self {
            condition,
            compiled,
            login_path: login_path.into(),
        }
    }

    #[must_use]
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

/// Route-layer middleware enforcing the guarded route's condition.
///
/// Reads the current assertions from request extensions (placed there by the
/// session loader), evaluates the effective predicate and either continues
/// the chain unchanged or responds 403. Unauthenticated denials carry a login
/// link whose `RelayState` encodes the original request path.
pub async fn guard_middleware(
    State(ctx): State<GuardContext>,
    request: Request,
    next: Next,
) -> Response {
    let assertions = request
        .extensions()
        .get::<CurrentAssertions>()
        .and_then(|current| current.0.clone());

    if effective_allows(&ctx.compiled, assertions.as_ref()) {
        return next.run(request).await;
    }

    let authenticated = assertions.is_some();
    let path = request.uri().path().to_string();
    tracing::warn!(
        path = %path,
        authenticated,
        condition = ?ctx.condition,
        "Access denied by route guard"
    );

    let login_url = (!authenticated)
        .then(|| format!("{}?RelayState={}", ctx.login_path, relay::encode(&path)));

    AuthError::Denied {
        condition: ctx.condition.clone(),
        authenticated,
        login_url,
    }
    .into_response()
}

/// Development override layer.
///
/// When an override condition is configured (never in production defaults),
/// it is injected into the reserved `condition` slot of the current
/// assertion set before the guard runs.
pub async fn override_injector(
    State(state): State<crate::router::SpState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(override_condition) = state.dev_override.as_ref() {
        if let Some(current) = request.extensions_mut().get_mut::<CurrentAssertions>() {
            if let Some(assertions) = current.0.as_mut() {
                assertions.override_condition = Some(override_condition.clone());
                tracing::debug!(condition = ?override_condition, "Override condition injected");
            }
        }
    }
    next.run(request).await
}
