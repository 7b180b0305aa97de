//! Coordinator errors.

use std::path::PathBuf;
use std::time::Duration;

use millwright_config::NodeId;
use millwright_machine::MachineError;
use millwright_transport::TransportError;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
  /// Channel setup or configuration delivery failed.
  #[error("transport failure")]
  Transport(#[from] TransportError),

  /// A node configuration could not be serialized.
  #[error("failed to encode configuration for node {node_id}")]
  ConfigEncoding {
    node_id: NodeId,
    #[source]
    source: serde_json::Error,
  },

  /// The topology has no configuration slice for an endpoint.
  #[error("no configuration for node {node_id}")]
  MissingConfig { node_id: NodeId },

  /// A worker stopped with an error before every result arrived.
  #[error("worker {node_id} failed")]
  Worker {
    node_id: NodeId,
    #[source]
    source: MachineError,
  },

  /// A worker task panicked or was aborted.
  #[error("worker {node_id} panicked: {message}")]
  WorkerPanicked { node_id: NodeId, message: String },

  /// No notification arrived within the stall timeout.
  #[error("no progress for {waited:?} ({received} of {expected} results received)")]
  Stalled {
    waited: Duration,
    received: usize,
    expected: usize,
  },

  /// Writing the report failed.
  #[error("failed to write report to {}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
