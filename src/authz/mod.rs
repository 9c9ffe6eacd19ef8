//! Authorization decision engine: conditions, guards, and the route registry.

pub mod condition;
pub mod guard;
pub mod registry;

pub use condition::{Compiled, Condition, PredicateFn};
pub use guard::{evaluate, guard_middleware, override_injector, require, GuardContext};
pub use registry::{Permission, RouteRegistry};
