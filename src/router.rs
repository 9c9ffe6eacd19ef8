//! SP application context and route wiring.
//!
//! `SpState` is the explicit context passed to every handler and layer; there
//! are no module-level singletons. Route→condition bindings are collected by
//! the builder and frozen into the [`RouteRegistry`] before the router is
//! constructed, so ahead-of-time permission queries and the route guards
//! always agree.

use crate::authz::{
    guard_middleware, override_injector, Condition, GuardContext, Permission, RouteRegistry,
};
use crate::config::SpConfig;
use crate::error::ConfigError;
use crate::handlers::{
    consent, login_redirect, login_response, logout, metadata, session_assertions,
    session_request, session_response, session_summary,
};
use crate::saml::assertions::AssertionSet;
use crate::saml::SamlToolkit;
use crate::session::{session_loader, SessionStore};
use axum::http::Method;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Application context for the SP layer.
#[derive(Clone)]
pub struct SpState {
    pub config: Arc<SpConfig>,
    pub toolkit: Arc<dyn SamlToolkit>,
    pub sessions: Arc<dyn SessionStore>,
    pub routes: Arc<RouteRegistry>,
    /// Parsed development override condition; `None` in production.
    pub dev_override: Option<Condition>,
}

impl SpState {
    /// Start building the SP state. Guarded host routes are declared on the
    /// builder; `build` validates the configuration and freezes the
    /// registry.
    #[must_use]
    pub fn builder(
        config: SpConfig,
        toolkit: Arc<dyn SamlToolkit>,
        sessions: Arc<dyn SessionStore>,
    ) -> SpStateBuilder {
        SpStateBuilder {
            config,
            toolkit,
            sessions,
            guards: Vec::new(),
        }
    }

    /// Ahead-of-time authorization query against the frozen route registry.
    #[must_use]
    pub fn permit(
        &self,
        path: &str,
        method: &Method,
        assertions: Option<&AssertionSet>,
    ) -> Permission {
        self.routes.permit(path, method, assertions)
    }

    /// Guard context for a condition, for hosts wiring their own route
    /// layers with [`guard_middleware`].
    #[must_use]
    pub fn guard(&self, condition: Condition) -> GuardContext {
        GuardContext::new(condition, self.config.login_path())
    }
}

/// Builder collecting guarded routes before the registry is frozen.
pub struct SpStateBuilder {
    config: SpConfig,
    toolkit: Arc<dyn SamlToolkit>,
    sessions: Arc<dyn SessionStore>,
    guards: Vec<(Method, String, Condition)>,
}

impl SpStateBuilder {
    /// Declare a guarded host route so ahead-of-time queries can resolve it.
    #[must_use]
    pub fn guard(mut self, method: Method, path: impl Into<String>, condition: Condition) -> Self {
        self.guards.push((method, path.into(), condition));
        self
    }

    /// Validate configuration, compile conditions, and freeze the registry.
    ///
    /// Invalid condition shapes and malformed configuration fail here, at
    /// startup, never at request time.
    pub fn build(self) -> Result<SpState, ConfigError> {
        self.config.validate()?;
        let dev_override = self.config.parsed_override()?;
        if dev_override.is_some() {
            tracing::warn!("Condition override configured; never enable this in production");
        }

        let mut registry = RouteRegistry::new();
        for suffix in [
            "session",
            "session/request",
            "session/response",
            "session/assertions",
        ] {
            registry.register(
                Method::GET,
                self.config.path(suffix),
                Condition::Authenticated,
            );
        }
        for (method, path, condition) in self.guards {
            registry.register(method, path, condition);
        }

        Ok(SpState {
            config: Arc::new(self.config),
            toolkit: self.toolkit,
            sessions: self.sessions,
            routes: Arc::new(registry),
            dev_override,
        })
    }
}

/// Build the SP router: metadata, login/logout, consent, and the guarded
/// diagnostic endpoints, with the session loader and override layers
/// wrapping everything.
#[must_use]
pub fn sp_router(state: SpState) -> Router {
    let path = |suffix: &str| state.config.path(suffix);
    let authenticated =
        || from_fn_with_state(state.guard(Condition::Authenticated), guard_middleware);

    Router::new()
        .route(&path("meta"), get(metadata))
        .route(&path("login"), get(login_redirect).post(login_response))
        .route(&path("logout"), post(logout))
        .route(&path("consent"), get(consent))
        .route(
            &path("session"),
            get(session_summary).route_layer(authenticated()),
        )
        .route(
            &path("session/request"),
            get(session_request).route_layer(authenticated()),
        )
        .route(
            &path("session/response"),
            get(session_response).route_layer(authenticated()),
        )
        .route(
            &path("session/assertions"),
            get(session_assertions).route_layer(authenticated()),
        )
        // Layer order: the loader runs first, then the override injector,
        // then any route guard — the chain every guarded request traverses.
        .layer(from_fn_with_state(state.clone(), override_injector))
        .layer(from_fn_with_state(state.clone(), session_loader))
        .with_state(state)
}
