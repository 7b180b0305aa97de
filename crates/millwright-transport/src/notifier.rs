//! Worker → coordinator notifications.
//!
//! Workers report results and maintenance events through a [`Notifier`].
//! Sending never blocks the worker's cycle loop; the coordinator drains the
//! other end with non-blocking polls.

use millwright_config::NodeId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::trace;

use crate::messages::Notification;

/// Trait for delivering notifications to the coordinator.
///
/// Implementations must not block: the caller is in the middle of a
/// production cycle.
pub trait Notifier: Send + Sync {
  /// Called for every result or maintenance record a worker produces.
  fn notify(&self, notification: Notification);
}

/// A notifier backed by an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  node_id: NodeId,
  // Unbounded so that a coordinator busy polling other workers never stalls
  // this one. Volume is at most two messages per node per cycle.
  sender: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
  pub fn new(node_id: NodeId, sender: mpsc::UnboundedSender<Notification>) -> Self {
    Self { node_id, sender }
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, notification: Notification) {
    // The coordinator stops listening once it has every result; anything
    // sent after that is dropped.
    if self.sender.send(notification).is_err() {
      trace!(node_id = self.node_id, "notification dropped, coordinator gone");
    }
  }
}

/// Outcome of a single non-blocking poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Polled {
  Ready(Notification),
  Empty,
  /// The worker dropped its notifier and nothing is left to read.
  Disconnected,
}

/// The coordinator's end of one worker's notification channel.
#[derive(Debug)]
pub struct NotificationReceiver {
  node_id: NodeId,
  receiver: mpsc::UnboundedReceiver<Notification>,
}

impl NotificationReceiver {
  pub fn node_id(&self) -> NodeId {
    self.node_id
  }

  /// Take one notification if one is available, without waiting.
  pub fn poll(&mut self) -> Polled {
    match self.receiver.try_recv() {
      Ok(notification) => Polled::Ready(notification),
      Err(TryRecvError::Empty) => Polled::Empty,
      Err(TryRecvError::Disconnected) => Polled::Disconnected,
    }
  }
}

/// Create a notifier / receiver pair for one worker.
pub fn notification_channel(node_id: NodeId) -> (ChannelNotifier, NotificationReceiver) {
  let (sender, receiver) = mpsc::unbounded_channel();
  (
    ChannelNotifier::new(node_id, sender),
    NotificationReceiver { node_id, receiver },
  )
}
