use millwright_config::{NodeId, ParseStateError};
use thiserror::Error;

/// A malformed topology description.
#[derive(Debug, Error)]
pub enum TopologyError {
  #[error("line {line}: missing {what}")]
  MissingLine { line: usize, what: &'static str },

  #[error("line {line}: expected an integer for {what}, got '{value}'")]
  InvalidNumber {
    line: usize,
    what: &'static str,
    value: String,
  },

  #[error("line {line}: expected 5 wear costs, got {count}")]
  WearCostCount { line: usize, count: usize },

  #[error("line {line}: expected '<node_id> <parent_id> <state>', got '{content}'")]
  InvalidLink { line: usize, content: String },

  #[error("line {line}: {source}")]
  UnknownState {
    line: usize,
    #[source]
    source: ParseStateError,
  },

  #[error("topology must contain at least one machine")]
  Empty,

  #[error("expected {expected} child links for {machine_count} machines, got {actual}")]
  LinkCount {
    machine_count: u32,
    expected: usize,
    actual: usize,
  },

  #[error("node id {node_id} is outside 2..={machine_count}")]
  IdOutOfRange { node_id: NodeId, machine_count: u32 },

  #[error("node {node_id} is declared more than once")]
  DuplicateNode { node_id: NodeId },

  #[error("node {node_id} references unknown parent {parent_id}")]
  UnknownParent { node_id: NodeId, parent_id: NodeId },

  #[error("node {node_id} is not reachable from the root (cycle in parent links)")]
  Unreachable { node_id: NodeId },

  #[error("node {node_id} uses the root-only state 'add'")]
  AddOnNonRoot { node_id: NodeId },

  #[error("found {leaves} leaves but {seeds} seed lines")]
  SeedCount { leaves: usize, seeds: usize },
}
