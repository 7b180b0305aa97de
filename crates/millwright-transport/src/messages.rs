use millwright_config::NodeId;
use serde::{Deserialize, Serialize};

/// A product travelling from a child to its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductEnvelope {
  pub producer_id: NodeId,
  pub product: String,
}

/// A machine's wear crossed the threshold during `cycle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
  pub node_id: NodeId,
  pub cost: u64,
  pub cycle: u32,
}

impl MaintenanceRecord {
  /// Report ordering key: node, then cycle, then cost.
  pub fn sort_key(&self) -> (NodeId, u32, u64) {
    (self.node_id, self.cycle, self.cost)
  }
}

/// The root's final product for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
  pub product: String,
  pub cycle: u32,
}

/// Messages a worker sends to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
  Result(ResultRecord),
  Maintenance(MaintenanceRecord),
}
