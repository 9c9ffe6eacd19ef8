//! HTTP handlers for the SP endpoints.

pub mod consent;
pub mod login;
pub mod logout;
pub mod metadata;
pub mod session;

pub use consent::consent;
pub use login::{login_redirect, login_response};
pub use logout::logout;
pub use metadata::metadata;
pub use session::{session_assertions, session_request, session_response, session_summary};
