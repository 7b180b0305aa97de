//! Millwright Transport
//!
//! Point-to-point plumbing between the workers of a run and its coordinator.
//! The coordinator builds a [`Registry`] before any worker starts; the
//! registry is then split into the coordinator's side and one
//! [`NodeEndpoints`] bundle per machine.
//!
//! # Channels
//!
//! ```text
//!  coordinator ──ConfigOutbox──────────────▶ ConfigInbox      (oneshot, once)
//!  child       ──ParentLink────────────────▶ ProductInbox     (bounded, blocking)
//!  worker      ──ChannelNotifier───────────▶ NotificationReceiver (unbounded, polled)
//! ```
//!
//! A parent's [`ProductInbox`] is shared by all of its children, so envelopes
//! arrive from an unspecified sender and carry their producer id. The
//! coordinator never blocks on a single worker: it polls every
//! [`NotificationReceiver`] with [`NotificationReceiver::poll`].

mod error;
mod link;
mod messages;
mod notifier;
mod registry;

pub use error::TransportError;
pub use link::{ConfigInbox, ConfigOutbox, ParentLink, ProductInbox};
pub use messages::{MaintenanceRecord, Notification, ProductEnvelope, ResultRecord};
pub use notifier::{ChannelNotifier, NotificationReceiver, Notifier, Polled, notification_channel};
pub use registry::{CoordinatorEndpoints, EndpointSpec, NodeEndpoints, Registry};
