//! Actor identity and the permission gate.
//!
//! Authentication itself lives in an upstream session gateway; every request
//! arrives with an already-resolved actor identity, which the middleware
//! turns into an explicit [`ActorContext`] threaded through the engine.

pub mod actor;
pub mod middleware;

pub use actor::{authorize, ActorContext, Role, ADMIN_TIER, FINANCE_TIER, OWNER_TIER, STAFF_TIER};
pub use middleware::actor_middleware;
