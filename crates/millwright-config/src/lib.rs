//! Millwright Config
//!
//! This crate contains the configuration types shared by every part of a
//! millwright run: the machine states and their transformations, the
//! run-wide settings (cycle count, wear costs, wear threshold) and the
//! per-node configuration message the coordinator hands to each worker.
//!
//! The node configuration travels as a JSON document:
//!
//! ```json
//! {
//!   "cycles": 3,
//!   "wear_costs": [1, 2, 3, 4, 5],
//!   "threshold": 10,
//!   "parent_id": 2,
//!   "children": [],
//!   "initial_state": "trim",
//!   "seed": "abc"
//! }
//! ```

mod node;
mod settings;
mod state;

pub use node::{NodeConfig, NodeId, ROOT_ID};
pub use settings::{RunSettings, WEAR_COST_COUNT, WearCosts};
pub use state::{MachineState, ParseStateError};
