//! Token claims, roles and route gating.
//!
//! Nothing in this module verifies a token. The backend remains the only
//! authority on what a user may do; these helpers only decide what the client
//! offers.

pub mod claims;
pub mod role;
pub mod routes;

pub use claims::{Claims, parse};
pub use role::{Capabilities, Gate, GateDecision, Role, RouteGroup, check};
