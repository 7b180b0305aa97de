//! Worker bootstrap: configuration intake followed by the cycle loop.

use millwright_config::NodeConfig;
use millwright_transport::NodeEndpoints;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{MachineError, ProtocolError};
use crate::node::{NodeChannels, NodeSummary, ProductionNode};

/// Run one worker to completion.
///
/// Waits for the serialized configuration, builds the node and runs every
/// cycle. Cancelling `cancel` stops a worker blocked on any channel.
pub async fn run_worker(
  endpoints: NodeEndpoints,
  cancel: CancellationToken,
) -> Result<NodeSummary, MachineError> {
  let NodeEndpoints {
    node_id,
    config,
    inbox,
    parent,
    notifier,
  } = endpoints;

  let message = tokio::select! {
    message = config.recv() => message?,
    _ = cancel.cancelled() => return Err(MachineError::Cancelled { node_id }),
  };
  let config = NodeConfig::from_message(&message)
    .map_err(|source| ProtocolError::InvalidConfig { node_id, source })?;
  debug!(node_id, config = ?config, "configuration_received");

  let node = ProductionNode::new(node_id, config)?;
  let channels = NodeChannels::new(&node, inbox, parent, notifier)?;
  node.run(channels, cancel).await
}
