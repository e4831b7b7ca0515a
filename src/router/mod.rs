//! Router Module
//!
//! Priority failover dispatch over the registry's keys and models.

pub mod failover;
pub mod plan;

#[cfg(test)]
pub(crate) mod test_utils;

pub use failover::{FailoverRouter, RoutingSuccess};
pub use plan::{dispatch_plan, DispatchAttempt};
