//! The production node state machine.

use millwright_config::{MachineState, NodeConfig, NodeId, ROOT_ID, RunSettings};
use millwright_transport::{
  MaintenanceRecord, Notification, Notifier, ParentLink, ProductEnvelope, ProductInbox,
  ResultRecord,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::error::{ConfigError, MachineError, ProtocolError};
use crate::gather::Gatherer;

/// Output of one transform step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
  pub output: String,
  /// Set when this step pushed wear over the threshold.
  pub maintenance: Option<MaintenanceRecord>,
}

/// Summary returned by a node that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
  pub node_id: NodeId,
  pub cycles_completed: u32,
  pub maintenance_events: u32,
  pub final_state: MachineState,
}

/// One machine of the production tree.
///
/// Owns its state, wear and cycle counter; nothing outside the node's own
/// cycle loop mutates them.
#[derive(Debug, Clone)]
pub struct ProductionNode {
  id: NodeId,
  parent_id: Option<NodeId>,
  children: Vec<NodeId>,
  seed: Option<String>,
  settings: RunSettings,
  state: MachineState,
  accumulated_wear: u64,
  cycle: u32,
  maintenance_events: u32,
}

impl ProductionNode {
  /// Build a node from its configuration message.
  pub fn new(id: NodeId, config: NodeConfig) -> Result<Self, ConfigError> {
    let settings = config.settings();
    let NodeConfig {
      parent_id,
      mut children,
      initial_state,
      seed,
      ..
    } = config;

    children.sort_unstable();
    children.dedup();

    if parent_id.is_none() != (id == ROOT_ID) {
      return Err(ConfigError::RootMismatch { node_id: id });
    }
    if (id == ROOT_ID) != (initial_state == MachineState::Add) {
      return Err(ConfigError::InvalidState {
        node_id: id,
        state: initial_state,
      });
    }
    match (children.is_empty(), &seed) {
      (true, None) => return Err(ConfigError::MissingSeed { node_id: id }),
      (false, Some(_)) => return Err(ConfigError::UnexpectedSeed { node_id: id }),
      _ => {}
    }

    Ok(Self {
      id,
      parent_id,
      children,
      seed,
      settings,
      state: initial_state,
      accumulated_wear: 0,
      cycle: 1,
      maintenance_events: 0,
    })
  }

  pub fn id(&self) -> NodeId {
    self.id
  }

  /// Child ids, ascending.
  pub fn children(&self) -> &[NodeId] {
    &self.children
  }

  pub fn state(&self) -> MachineState {
    self.state
  }

  pub fn accumulated_wear(&self) -> u64 {
    self.accumulated_wear
  }

  /// The cycle about to run (or `cycles + 1` once finished).
  pub fn cycle(&self) -> u32 {
    self.cycle
  }

  pub fn is_finished(&self) -> bool {
    self.cycle > self.settings.cycles
  }

  /// Transform `input` in the current state and account for wear.
  ///
  /// Does not advance the state or the cycle counter. Fails if the wear or
  /// the maintenance cost would not fit in a `u64`.
  pub fn produce(&mut self, input: &str) -> Result<Production, MachineError> {
    let output = self.state.transform(input);

    let mut maintenance = None;
    if let Some(wear_cost) = self.settings.wear_costs.for_state(self.state) {
      let (node_id, cycle) = (self.id, self.cycle);
      let overflow = || MachineError::WearOverflow { node_id, cycle };
      let wear = self
        .accumulated_wear
        .checked_add(wear_cost)
        .ok_or_else(overflow)?;
      if wear >= self.settings.threshold {
        let cost = (wear - self.settings.threshold)
          .checked_add(1)
          .and_then(|excess| excess.checked_mul(wear_cost))
          .ok_or_else(overflow)?;
        maintenance = Some(MaintenanceRecord {
          node_id: self.id,
          cost,
          cycle: self.cycle,
        });
        self.accumulated_wear = 0;
        self.maintenance_events += 1;
      } else {
        self.accumulated_wear = wear;
      }
    }

    Ok(Production {
      output,
      maintenance,
    })
  }

  /// Rotate the state and move to the next cycle.
  pub fn advance(&mut self) {
    self.state = self.state.next();
    self.cycle += 1;
  }

  /// Run one gather → transform → emit → advance round.
  pub async fn run_cycle<N: Notifier>(
    &mut self,
    channels: &mut NodeChannels<N>,
    cancel: &CancellationToken,
  ) -> Result<(), MachineError> {
    let input = match (&mut channels.gatherer, &self.seed) {
      (Some(gatherer), _) => tokio::select! {
        input = gatherer.gather() => input?,
        _ = cancel.cancelled() => return Err(MachineError::Cancelled { node_id: self.id }),
      },
      (None, Some(seed)) => seed.clone(),
      (None, None) => {
        return Err(ConfigError::MissingSeed { node_id: self.id }.into());
      }
    };

    let production = self.produce(&input)?;
    if let Some(record) = production.maintenance {
      info!(
        node_id = self.id,
        cycle = record.cycle,
        cost = record.cost,
        state = %self.state,
        "maintenance_emitted"
      );
      channels.notifier.notify(Notification::Maintenance(record));
    }

    match &channels.parent {
      Some(parent) => {
        let envelope = ProductEnvelope {
          producer_id: self.id,
          product: production.output,
        };
        tokio::select! {
          sent = parent.send(envelope) => sent?,
          _ = cancel.cancelled() => return Err(MachineError::Cancelled { node_id: self.id }),
        }
      }
      None => channels.notifier.notify(Notification::Result(ResultRecord {
        product: production.output,
        cycle: self.cycle,
      })),
    }

    debug!(
      node_id = self.id,
      cycle = self.cycle,
      state = %self.state,
      wear = self.accumulated_wear,
      "cycle_completed"
    );
    self.advance();
    Ok(())
  }

  /// Run every configured cycle, then stop.
  #[instrument(
    name = "production_node",
    skip(self, channels, cancel),
    fields(node_id = self.id, cycles = self.settings.cycles)
  )]
  pub async fn run<N: Notifier>(
    mut self,
    mut channels: NodeChannels<N>,
    cancel: CancellationToken,
  ) -> Result<NodeSummary, MachineError> {
    info!(
      node_id = self.id,
      state = %self.state,
      children = ?self.children,
      "node_started"
    );

    while !self.is_finished() {
      self.run_cycle(&mut channels, &cancel).await?;
    }

    let summary = NodeSummary {
      node_id: self.id,
      cycles_completed: self.cycle - 1,
      maintenance_events: self.maintenance_events,
      final_state: self.state,
    };
    info!(
      node_id = self.id,
      maintenance_events = summary.maintenance_events,
      "node_finished"
    );
    Ok(summary)
  }
}

/// The channels a node talks through during its cycle loop.
#[derive(Debug)]
pub struct NodeChannels<N: Notifier> {
  gatherer: Option<Gatherer>,
  parent: Option<ParentLink>,
  notifier: N,
}

impl<N: Notifier> NodeChannels<N> {
  /// Pair a node with its endpoints, checking that they fit its place in
  /// the tree.
  pub fn new(
    node: &ProductionNode,
    inbox: Option<ProductInbox>,
    parent: Option<ParentLink>,
    notifier: N,
  ) -> Result<Self, ProtocolError> {
    let mismatch = |detail: &'static str| ProtocolError::EndpointMismatch {
      node_id: node.id,
      detail,
    };

    let gatherer = match (node.children.is_empty(), inbox) {
      (true, _) => None,
      (false, Some(inbox)) => Some(Gatherer::new(node.id, inbox, &node.children)),
      (false, None) => return Err(mismatch("children configured but no inbox")),
    };

    match (node.parent_id, &parent) {
      (Some(expected), Some(link)) if link.parent_id() != expected => {
        return Err(mismatch("parent link points at a different node"));
      }
      (Some(_), None) => return Err(mismatch("parent configured but no parent link")),
      (None, Some(_)) => return Err(mismatch("root was given a parent link")),
      _ => {}
    }

    Ok(Self {
      gatherer,
      parent,
      notifier,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use millwright_config::WearCosts;

  fn config(parent_id: Option<NodeId>, state: MachineState, threshold: u64) -> NodeConfig {
    NodeConfig {
      cycles: 5,
      wear_costs: WearCosts::new([4, 4, 4, 4, 4]),
      threshold,
      parent_id,
      children: vec![],
      initial_state: state,
      seed: Some("abc".to_string()),
    }
  }

  #[test]
  fn test_threshold_crossing_cost() {
    let mut node = ProductionNode::new(2, config(Some(1), MachineState::Reverse, 10)).unwrap();

    assert_eq!(node.produce("abc").unwrap().maintenance, None);
    assert_eq!(node.accumulated_wear(), 4);
    assert_eq!(node.produce("abc").unwrap().maintenance, None);
    assert_eq!(node.accumulated_wear(), 8);

    let production = node.produce("abc").unwrap();
    assert_eq!(production.output, "cba");
    assert_eq!(
      production.maintenance,
      Some(MaintenanceRecord {
        node_id: 2,
        cost: 12,
        cycle: 1
      })
    );
    assert_eq!(node.accumulated_wear(), 0);
  }

  #[test]
  fn test_exact_threshold_hit() {
    let mut node = ProductionNode::new(2, config(Some(1), MachineState::Trim, 8)).unwrap();
    node.produce("abc").unwrap();
    let record = node.produce("abc").unwrap().maintenance.unwrap();
    // (8 - 8 + 1) * 4
    assert_eq!(record.cost, 4);
    assert_eq!(node.accumulated_wear(), 0);
  }

  #[test]
  fn test_rotation_ignores_wear() {
    let mut node = ProductionNode::new(3, config(Some(1), MachineState::Split, 1)).unwrap();
    let mut seen = Vec::new();
    while !node.is_finished() {
      seen.push(node.state());
      assert!(node.produce("abcdef").unwrap().maintenance.is_some());
      node.advance();
    }

    use MachineState::*;
    assert_eq!(seen, vec![Split, Chop, Enhance, Split, Chop]);
    assert_eq!(node.cycle(), 6);
  }

  #[test]
  fn test_add_never_wears() {
    let mut root_config = config(None, MachineState::Add, 0);
    root_config.children = vec![2];
    root_config.seed = None;
    let mut root = ProductionNode::new(1, root_config).unwrap();

    let production = root.produce("xyz").unwrap();
    assert_eq!(production.output, "xyz");
    assert_eq!(production.maintenance, None);
    assert_eq!(root.accumulated_wear(), 0);
  }

  #[test]
  fn test_maintenance_cost_overflow() {
    let mut leaf = config(Some(1), MachineState::Reverse, 1);
    leaf.wear_costs = WearCosts::new([1, 1 << 40, 1, 1, 1]);
    let mut node = ProductionNode::new(2, leaf).unwrap();

    // (2^40 - 1 + 1) * 2^40 does not fit in a u64
    assert!(matches!(
      node.produce("ab"),
      Err(MachineError::WearOverflow {
        node_id: 2,
        cycle: 1
      })
    ));
  }

  #[test]
  fn test_accumulated_wear_overflow() {
    let mut leaf = config(Some(1), MachineState::Trim, u64::MAX);
    leaf.wear_costs = WearCosts::new([1, 1, 1, u64::MAX - 1, 1]);
    let mut node = ProductionNode::new(2, leaf).unwrap();

    assert_eq!(node.produce("abcd").unwrap().maintenance, None);
    assert_eq!(node.accumulated_wear(), u64::MAX - 1);
    assert!(matches!(
      node.produce("abcd"),
      Err(MachineError::WearOverflow { node_id: 2, .. })
    ));
  }

  #[test]
  fn test_large_costs_without_overflow() {
    let mut leaf = config(Some(1), MachineState::Reverse, 1);
    leaf.wear_costs = WearCosts::new([1, 1 << 31, 1, 1, 1]);
    let mut node = ProductionNode::new(2, leaf).unwrap();

    let record = node.produce("ab").unwrap().maintenance.unwrap();
    assert_eq!(record.cost, 1 << 62);
  }

  #[test]
  fn test_leaf_without_seed() {
    let mut leaf = config(Some(1), MachineState::Chop, 10);
    leaf.seed = None;
    assert!(matches!(
      ProductionNode::new(4, leaf),
      Err(ConfigError::MissingSeed { node_id: 4 })
    ));
  }

  #[test]
  fn test_inner_node_with_seed() {
    let mut inner = config(Some(1), MachineState::Chop, 10);
    inner.children = vec![5];
    assert!(matches!(
      ProductionNode::new(4, inner),
      Err(ConfigError::UnexpectedSeed { node_id: 4 })
    ));
  }

  #[test]
  fn test_root_rules() {
    assert!(matches!(
      ProductionNode::new(3, config(None, MachineState::Chop, 10)),
      Err(ConfigError::RootMismatch { node_id: 3 })
    ));
    assert!(matches!(
      ProductionNode::new(2, config(Some(1), MachineState::Add, 10)),
      Err(ConfigError::InvalidState { node_id: 2, .. })
    ));
  }

  #[test]
  fn test_children_sorted_on_construction() {
    let mut inner = config(Some(1), MachineState::Trim, 10);
    inner.children = vec![7, 3, 5];
    inner.seed = None;
    let node = ProductionNode::new(2, inner).unwrap();
    assert_eq!(node.children(), &[3, 5, 7]);
  }
}
