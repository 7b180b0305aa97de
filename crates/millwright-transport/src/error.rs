//! Transport errors.

use millwright_config::NodeId;

/// Errors raised by the channels between workers and the coordinator.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  /// The parent of `node_id` is gone and can no longer accept products.
  #[error("parent {parent_id} of node {node_id} stopped accepting products")]
  ParentClosed { node_id: NodeId, parent_id: NodeId },

  /// Every child of `node_id` dropped its link before the gather finished.
  #[error("product inbox of node {node_id} closed")]
  InboxClosed { node_id: NodeId },

  /// The coordinator dropped the configuration channel without sending.
  #[error("configuration channel of node {node_id} closed before delivery")]
  ConfigClosed { node_id: NodeId },

  /// The worker dropped its configuration inbox before delivery.
  #[error("node {node_id} is not accepting configuration")]
  ConfigRejected { node_id: NodeId },

  /// A link references a node that has no endpoint.
  #[error("node {node_id} references unknown endpoint {target}")]
  UnknownEndpoint { node_id: NodeId, target: NodeId },

  /// Two specs were registered for the same node.
  #[error("duplicate endpoint for node {node_id}")]
  DuplicateEndpoint { node_id: NodeId },
}
