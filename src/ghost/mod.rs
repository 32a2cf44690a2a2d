//! Ghost behavior: the state machine that owns forced routes, and the policy that roams otherwise.

pub mod policy;
pub mod state;
