//! Server-side session state, storage, and the request-scoped loader.

pub mod loader;
pub mod store;
pub mod types;

pub use loader::{session_loader, CurrentAssertions, SessionContext};
pub use store::{InMemorySessionStore, SessionStore};
pub use types::{SamlSession, Session, SessionError, DEFAULT_SESSION_TTL_SECONDS};
