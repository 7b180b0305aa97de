//! Worker errors.

use millwright_config::{MachineState, NodeId};
use millwright_transport::TransportError;

/// The node configuration is inconsistent with the node's place in the tree.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("leaf node {node_id} has no seed")]
  MissingSeed { node_id: NodeId },

  #[error("node {node_id} has children but was given a seed")]
  UnexpectedSeed { node_id: NodeId },

  #[error("node {node_id}: only the root may have no parent")]
  RootMismatch { node_id: NodeId },

  #[error("node {node_id} cannot start in state '{state}'")]
  InvalidState { node_id: NodeId, state: MachineState },
}

/// A message did not have the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
  #[error("node {node_id} received an undecodable configuration message")]
  InvalidConfig {
    node_id: NodeId,
    #[source]
    source: serde_json::Error,
  },

  #[error("node {node_id} received a product from {producer_id}, which is not one of its children")]
  UnknownProducer { node_id: NodeId, producer_id: NodeId },

  #[error("node {node_id}: configuration does not match its endpoints ({detail})")]
  EndpointMismatch { node_id: NodeId, detail: &'static str },
}

/// Errors that stop a worker.
#[derive(Debug, thiserror::Error)]
pub enum MachineError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Protocol(#[from] ProtocolError),

  #[error(transparent)]
  Transport(#[from] TransportError),

  /// Accumulated wear or a maintenance cost no longer fits in 64 bits.
  #[error("node {node_id}: wear accounting overflowed in cycle {cycle}")]
  WearOverflow { node_id: NodeId, cycle: u32 },

  /// The run was torn down while this node was waiting.
  #[error("node {node_id} cancelled")]
  Cancelled { node_id: NodeId },
}
