use millwright_config::NodeId;
use tokio::sync::{mpsc, oneshot};

use crate::error::TransportError;
use crate::messages::ProductEnvelope;

/// A child's sending end of its parent's product inbox.
#[derive(Debug, Clone)]
pub struct ParentLink {
  node_id: NodeId,
  parent_id: NodeId,
  sender: mpsc::Sender<ProductEnvelope>,
}

impl ParentLink {
  pub(crate) fn new(node_id: NodeId, parent_id: NodeId, sender: mpsc::Sender<ProductEnvelope>) -> Self {
    Self {
      node_id,
      parent_id,
      sender,
    }
  }

  pub fn parent_id(&self) -> NodeId {
    self.parent_id
  }

  /// Deliver a product, waiting until the parent's inbox has room.
  pub async fn send(&self, envelope: ProductEnvelope) -> Result<(), TransportError> {
    self
      .sender
      .send(envelope)
      .await
      .map_err(|_| TransportError::ParentClosed {
        node_id: self.node_id,
        parent_id: self.parent_id,
      })
  }
}

/// A parent's receiving end, shared by all of its children.
#[derive(Debug)]
pub struct ProductInbox {
  node_id: NodeId,
  receiver: mpsc::Receiver<ProductEnvelope>,
}

impl ProductInbox {
  pub(crate) fn new(node_id: NodeId, receiver: mpsc::Receiver<ProductEnvelope>) -> Self {
    Self { node_id, receiver }
  }

  /// Wait for the next envelope from any child.
  pub async fn recv(&mut self) -> Result<ProductEnvelope, TransportError> {
    self
      .receiver
      .recv()
      .await
      .ok_or(TransportError::InboxClosed {
        node_id: self.node_id,
      })
  }
}

/// Coordinator side of a worker's one-shot configuration delivery.
#[derive(Debug)]
pub struct ConfigOutbox {
  node_id: NodeId,
  sender: oneshot::Sender<String>,
}

impl ConfigOutbox {
  pub fn node_id(&self) -> NodeId {
    self.node_id
  }

  /// Send the serialized configuration. Consumes the outbox.
  pub fn send(self, message: String) -> Result<(), TransportError> {
    self
      .sender
      .send(message)
      .map_err(|_| TransportError::ConfigRejected {
        node_id: self.node_id,
      })
  }
}

/// Worker side of the configuration delivery.
#[derive(Debug)]
pub struct ConfigInbox {
  node_id: NodeId,
  receiver: oneshot::Receiver<String>,
}

impl ConfigInbox {
  /// Wait for the serialized configuration.
  pub async fn recv(self) -> Result<String, TransportError> {
    self.receiver.await.map_err(|_| TransportError::ConfigClosed {
      node_id: self.node_id,
    })
  }
}

pub(crate) fn config_channel(node_id: NodeId) -> (ConfigOutbox, ConfigInbox) {
  let (sender, receiver) = oneshot::channel();
  (
    ConfigOutbox { node_id, sender },
    ConfigInbox { node_id, receiver },
  )
}
