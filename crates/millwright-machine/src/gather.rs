use std::collections::{BTreeMap, VecDeque};

use millwright_config::NodeId;
use millwright_transport::ProductInbox;

use crate::error::{MachineError, ProtocolError};

/// Collects one product per child from a shared inbox.
///
/// Children may run ahead of each other; an early product waits in its
/// producer's queue until the gather for its cycle. Queues are keyed by
/// child id, so iteration order is ascending id.
#[derive(Debug)]
pub(crate) struct Gatherer {
  node_id: NodeId,
  inbox: ProductInbox,
  pending: BTreeMap<NodeId, VecDeque<String>>,
}

impl Gatherer {
  pub(crate) fn new(node_id: NodeId, inbox: ProductInbox, children: &[NodeId]) -> Self {
    Self {
      node_id,
      inbox,
      pending: children.iter().map(|&id| (id, VecDeque::new())).collect(),
    }
  }

  fn is_complete(&self) -> bool {
    self.pending.values().all(|queue| !queue.is_empty())
  }

  /// Wait for one product from every child and concatenate them by
  /// ascending producer id.
  pub(crate) async fn gather(&mut self) -> Result<String, MachineError> {
    while !self.is_complete() {
      let envelope = self.inbox.recv().await?;
      let queue = self
        .pending
        .get_mut(&envelope.producer_id)
        .ok_or(ProtocolError::UnknownProducer {
          node_id: self.node_id,
          producer_id: envelope.producer_id,
        })?;
      queue.push_back(envelope.product);
    }

    let mut input = String::new();
    for queue in self.pending.values_mut() {
      if let Some(product) = queue.pop_front() {
        input.push_str(&product);
      }
    }
    Ok(input)
  }
}
