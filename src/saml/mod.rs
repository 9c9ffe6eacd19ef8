//! SAML data handling: assertion normalization, relay tokens, and the
//! external toolkit interface.

pub mod assertions;
pub mod relay;
pub mod toolkit;

pub use assertions::{normalize, AssertionSet, AttributeValue};
pub use toolkit::{
    AuthnRequestDoc, ResponseDoc, SamlToolkit, ToolkitError, ValidationError, ValidationPolicy,
};
