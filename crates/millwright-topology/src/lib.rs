//! Millwright Topology
//!
//! This crate provides the validated production tree for a millwright run.
//! A topology is built from a line-oriented description file (or from its
//! already-split parts) and guarantees:
//! - The id space is exactly `1..=N` with machine 1 as the root
//! - Parent links form a single tree reachable from the root
//! - Every leaf carries exactly one seed, assigned in ascending id order
//!
//! Once built, the topology hands out one [`NodeConfig`] slice per machine,
//! ready to be delivered to the workers.
//!
//! [`NodeConfig`]: millwright_config::NodeConfig

mod error;
mod parse;
mod topology;

pub use error::TopologyError;
pub use topology::{ChildLink, Node, Topology};
