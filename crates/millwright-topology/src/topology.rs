use std::collections::{BTreeMap, BTreeSet, VecDeque};

use millwright_config::{MachineState, NodeConfig, NodeId, ROOT_ID, RunSettings};
use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// One `<node_id> <parent_id> <state>` line of the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildLink {
  pub node_id: NodeId,
  pub parent_id: NodeId,
  pub initial_state: MachineState,
}

/// A machine in the production tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: NodeId,
  pub parent_id: Option<NodeId>,
  /// Child ids, ascending.
  pub children: Vec<NodeId>,
  pub initial_state: MachineState,
  pub seed: Option<String>,
}

impl Node {
  pub fn is_leaf(&self) -> bool {
    self.children.is_empty()
  }

  pub fn is_root(&self) -> bool {
    self.parent_id.is_none()
  }
}

/// A validated production tree plus the run-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
  settings: RunSettings,
  nodes: BTreeMap<NodeId, Node>,
}

impl Topology {
  /// Build a topology from the machine count, settings, child links and
  /// seed strings.
  ///
  /// The root (id 1) is synthesized in state `add`. Leaves are the nodes
  /// that never appear as a parent; they receive `seeds` in ascending id
  /// order.
  pub fn from_parts(
    machine_count: u32,
    settings: RunSettings,
    links: Vec<ChildLink>,
    seeds: Vec<String>,
  ) -> Result<Self, TopologyError> {
    if machine_count == 0 {
      return Err(TopologyError::Empty);
    }

    let expected = (machine_count - 1) as usize;
    if links.len() != expected {
      return Err(TopologyError::LinkCount {
        machine_count,
        expected,
        actual: links.len(),
      });
    }

    let mut nodes = BTreeMap::new();
    nodes.insert(
      ROOT_ID,
      Node {
        id: ROOT_ID,
        parent_id: None,
        children: Vec::new(),
        initial_state: MachineState::Add,
        seed: None,
      },
    );

    for link in &links {
      if link.node_id == ROOT_ID || link.node_id == 0 || link.node_id > machine_count {
        return Err(TopologyError::IdOutOfRange {
          node_id: link.node_id,
          machine_count,
        });
      }
      if link.initial_state == MachineState::Add {
        return Err(TopologyError::AddOnNonRoot {
          node_id: link.node_id,
        });
      }
      if nodes.contains_key(&link.node_id) {
        return Err(TopologyError::DuplicateNode {
          node_id: link.node_id,
        });
      }
      nodes.insert(
        link.node_id,
        Node {
          id: link.node_id,
          parent_id: Some(link.parent_id),
          children: Vec::new(),
          initial_state: link.initial_state,
          seed: None,
        },
      );
    }

    // Parents may be declared after their children, so wire edges in a
    // second pass.
    for link in &links {
      let parent = nodes
        .get_mut(&link.parent_id)
        .ok_or(TopologyError::UnknownParent {
          node_id: link.node_id,
          parent_id: link.parent_id,
        })?;
      parent.children.push(link.node_id);
    }
    for node in nodes.values_mut() {
      node.children.sort_unstable();
    }

    check_reachable(&nodes)?;

    let leaves: Vec<NodeId> = nodes
      .values()
      .filter(|n| n.is_leaf())
      .map(|n| n.id)
      .collect();
    if leaves.len() != seeds.len() {
      return Err(TopologyError::SeedCount {
        leaves: leaves.len(),
        seeds: seeds.len(),
      });
    }
    for (leaf_id, seed) in leaves.into_iter().zip(seeds) {
      if let Some(leaf) = nodes.get_mut(&leaf_id) {
        leaf.seed = Some(seed);
      }
    }

    Ok(Self { settings, nodes })
  }

  pub fn settings(&self) -> &RunSettings {
    &self.settings
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Get a node by id.
  pub fn node(&self, id: NodeId) -> Option<&Node> {
    self.nodes.get(&id)
  }

  /// All nodes in ascending id order.
  pub fn nodes(&self) -> impl Iterator<Item = &Node> {
    self.nodes.values()
  }

  pub fn root(&self) -> &Node {
    // from_parts always inserts the root.
    &self.nodes[&ROOT_ID]
  }

  /// Leaf ids in ascending order.
  pub fn leaves(&self) -> Vec<NodeId> {
    self
      .nodes
      .values()
      .filter(|n| n.is_leaf())
      .map(|n| n.id)
      .collect()
  }

  /// The configuration message for a single machine.
  pub fn node_config(&self, id: NodeId) -> Option<NodeConfig> {
    self.nodes.get(&id).map(|node| NodeConfig {
      cycles: self.settings.cycles,
      wear_costs: self.settings.wear_costs,
      threshold: self.settings.threshold,
      parent_id: node.parent_id,
      children: node.children.clone(),
      initial_state: node.initial_state,
      seed: node.seed.clone(),
    })
  }

  /// Configuration messages for every machine, ascending id.
  pub fn node_configs(&self) -> Vec<(NodeId, NodeConfig)> {
    self
      .nodes
      .keys()
      .filter_map(|&id| self.node_config(id).map(|c| (id, c)))
      .collect()
  }
}

/// Every node must be reachable from the root by following children.
fn check_reachable(nodes: &BTreeMap<NodeId, Node>) -> Result<(), TopologyError> {
  let mut seen = BTreeSet::new();
  let mut queue = VecDeque::from([ROOT_ID]);
  while let Some(id) = queue.pop_front() {
    if !seen.insert(id) {
      continue;
    }
    if let Some(node) = nodes.get(&id) {
      queue.extend(node.children.iter().copied());
    }
  }

  match nodes.keys().find(|id| !seen.contains(*id)) {
    Some(&node_id) => Err(TopologyError::Unreachable { node_id }),
    None => Ok(()),
  }
}
