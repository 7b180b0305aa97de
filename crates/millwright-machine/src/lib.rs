//! Millwright Machine
//!
//! The per-worker production state machine. Each cycle a node:
//!
//! 1. gathers one product per child (ascending child id), or takes its seed
//! 2. transforms the input according to its current [`MachineState`]
//! 3. accrues wear and, on crossing the threshold, reports maintenance
//! 4. sends the product to its parent, or reports a result if it is the root
//! 5. rotates its state and advances the cycle counter
//!
//! [`run_worker`] wraps the loop with configuration intake so a worker can be
//! spawned straight from its [`NodeEndpoints`].
//!
//! [`MachineState`]: millwright_config::MachineState
//! [`NodeEndpoints`]: millwright_transport::NodeEndpoints

mod error;
mod gather;
mod node;
mod worker;

pub use error::{ConfigError, MachineError, ProtocolError};
pub use node::{NodeChannels, NodeSummary, Production, ProductionNode};
pub use worker::run_worker;
