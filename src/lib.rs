//! SAML 2.0 Service Provider authentication and authorization layer.
//!
//! This crate mounts a small set of SP endpoints (login redirect, response
//! consumption, logout, metadata, consent, and diagnostic session echoes)
//! onto an axum application and guards host routes with a declarative
//! condition algebra evaluated against the assertions of the current SAML
//! session.
//!
//! Cryptographic SAML processing (request construction, signature and
//! condition validation, metadata rendering) is delegated to an injected
//! [`SamlToolkit`] implementation; this crate owns everything around it:
//! sessions, relay-state round-tripping, route guards, and the consent
//! flow.
//!
//! # Usage
//!
//! ```no_run
//! use portcullis_saml::authz::Condition;
//! use portcullis_saml::config::SpConfig;
//! use portcullis_saml::router::{sp_router, SpState};
//! use portcullis_saml::session::InMemorySessionStore;
//! use axum::http::Method;
//! use std::sync::Arc;
//!
//! # fn toolkit() -> Arc<dyn portcullis_saml::saml::SamlToolkit> { unimplemented!() }
//! let config = SpConfig::new(
//!     "https://sp.example.com/saml/meta",
//!     "https://sp.example.com/saml/login",
//!     "https://idp.example.com/sso",
//!     "MIIC...",
//! );
//!
//! let state = SpState::builder(config, toolkit(), Arc::new(InMemorySessionStore::new()))
//!     .guard(Method::GET, "/profile", Condition::Authenticated)
//!     .build()
//!     .unwrap();
//!
//! let app = axum::Router::new()
//!     // ... host routes, guarded with `state.guard(...)` route layers ...
//!     .merge(sp_router(state));
//! ```

pub mod authz;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod saml;
pub mod session;

pub use authz::{Compiled, Condition, Permission, RouteRegistry};
pub use config::{ConsentConfig, SpConfig};
pub use error::{AuthError, ConfigError, SpResult};
pub use router::{sp_router, SpState, SpStateBuilder};
pub use saml::{
    normalize, AssertionSet, AttributeValue, SamlToolkit, ToolkitError, ValidationError,
    ValidationPolicy,
};
pub use session::{InMemorySessionStore, SamlSession, Session, SessionStore};
