use serde::{Deserialize, Serialize};

use crate::settings::{RunSettings, WearCosts};
use crate::state::MachineState;

/// Stable machine identifier, `1..=N`.
pub type NodeId = u32;

/// Id of the root machine.
pub const ROOT_ID: NodeId = 1;

/// Configuration delivered once to a worker before it starts producing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
  pub cycles: u32,
  pub wear_costs: WearCosts,
  pub threshold: u64,
  pub parent_id: Option<NodeId>,
  /// Child ids in ascending order.
  #[serde(default)]
  pub children: Vec<NodeId>,
  pub initial_state: MachineState,
  /// Seed product; present only on leaves.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub seed: Option<String>,
}

impl NodeConfig {
  pub fn settings(&self) -> RunSettings {
    RunSettings {
      cycles: self.cycles,
      wear_costs: self.wear_costs,
      threshold: self.threshold,
    }
  }

  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  /// Serialize into the wire form sent to the worker.
  pub fn to_message(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }

  /// Parse the wire form received from the coordinator.
  pub fn from_message(message: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(message)
  }
}
