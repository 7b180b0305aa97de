use std::collections::BTreeMap;

use millwright_config::NodeId;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::link::{ConfigInbox, ConfigOutbox, ParentLink, ProductInbox, config_channel};
use crate::messages::ProductEnvelope;
use crate::notifier::{ChannelNotifier, NotificationReceiver, notification_channel};

/// What the registry needs to know about one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointSpec {
  pub node_id: NodeId,
  pub parent_id: Option<NodeId>,
  /// Number of children feeding this node.
  pub fan_in: usize,
}

/// Everything a worker needs to talk to the rest of the run.
#[derive(Debug)]
pub struct NodeEndpoints {
  pub node_id: NodeId,
  pub config: ConfigInbox,
  /// Present when the node has children.
  pub inbox: Option<ProductInbox>,
  /// Present when the node has a parent.
  pub parent: Option<ParentLink>,
  pub notifier: ChannelNotifier,
}

/// The coordinator's side of every worker channel.
#[derive(Debug)]
pub struct CoordinatorEndpoints {
  /// Configuration outboxes, ascending node id.
  pub config: Vec<ConfigOutbox>,
  /// Notification receivers, ascending node id.
  pub notifications: Vec<NotificationReceiver>,
}

/// Node id → endpoint table, built before any worker starts.
#[derive(Debug)]
pub struct Registry {
  coordinator: CoordinatorEndpoints,
  nodes: BTreeMap<NodeId, NodeEndpoints>,
}

impl Registry {
  /// Create every channel of the run.
  ///
  /// Each parent gets one inbox sized to its fan-in, so every child can
  /// deposit one product per cycle without waiting on its siblings.
  pub fn build(specs: &[EndpointSpec]) -> Result<Self, TransportError> {
    let mut inboxes: BTreeMap<NodeId, (mpsc::Sender<ProductEnvelope>, ProductInbox)> =
      BTreeMap::new();
    for spec in specs {
      if inboxes.contains_key(&spec.node_id) {
        return Err(TransportError::DuplicateEndpoint {
          node_id: spec.node_id,
        });
      }
      let (sender, receiver) = mpsc::channel(spec.fan_in.max(1));
      inboxes.insert(spec.node_id, (sender, ProductInbox::new(spec.node_id, receiver)));
    }

    let mut parent_links = BTreeMap::new();
    for spec in specs {
      if let Some(parent_id) = spec.parent_id {
        let (sender, _) = inboxes
          .get(&parent_id)
          .ok_or(TransportError::UnknownEndpoint {
            node_id: spec.node_id,
            target: parent_id,
          })?;
        parent_links.insert(
          spec.node_id,
          ParentLink::new(spec.node_id, parent_id, sender.clone()),
        );
      }
    }

    let fan_in: BTreeMap<NodeId, usize> = specs.iter().map(|s| (s.node_id, s.fan_in)).collect();
    let mut config = Vec::with_capacity(specs.len());
    let mut notifications = Vec::with_capacity(specs.len());
    let mut nodes = BTreeMap::new();

    // The registry's own sender clones are dropped here, so an inbox closes
    // once all of its children are gone.
    for (node_id, (_, inbox)) in inboxes {
      let (outbox, config_inbox) = config_channel(node_id);
      let (notifier, receiver) = notification_channel(node_id);
      config.push(outbox);
      notifications.push(receiver);

      let has_children = fan_in.get(&node_id).copied().unwrap_or(0) > 0;
      nodes.insert(
        node_id,
        NodeEndpoints {
          node_id,
          config: config_inbox,
          inbox: has_children.then_some(inbox),
          parent: parent_links.remove(&node_id),
          notifier,
        },
      );
    }

    Ok(Self {
      coordinator: CoordinatorEndpoints {
        config,
        notifications,
      },
      nodes,
    })
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Split into the coordinator's endpoints and each worker's endpoints,
  /// ascending node id.
  pub fn split(self) -> (CoordinatorEndpoints, Vec<NodeEndpoints>) {
    (self.coordinator, self.nodes.into_values().collect())
  }
}
