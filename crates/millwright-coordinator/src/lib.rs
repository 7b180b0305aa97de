//! Millwright Coordinator
//!
//! Owns a run from start to finish. Given a parsed [`Topology`], the
//! [`Coordinator`] builds the channel registry, spawns one worker per node,
//! delivers each node its configuration and then polls every worker's
//! notification channel without blocking until one result per cycle has
//! arrived. Collected records are sorted into a [`Report`].
//!
//! [`Topology`]: millwright_topology::Topology

mod collector;
mod config;
mod coordinator;
mod error;
mod report;

pub use collector::Collector;
pub use config::CoordinatorConfig;
pub use coordinator::Coordinator;
pub use error::CoordinatorError;
pub use report::Report;
