//! Non-blocking aggregation of worker notifications.

use millwright_transport::{
  MaintenanceRecord, Notification, NotificationReceiver, Polled, ResultRecord,
};
use tracing::trace;

/// Polls every worker's notification channel and buffers what it finds.
///
/// The collector is complete once it holds `expected_results` results;
/// maintenance records still in flight at that point are never read.
#[derive(Debug)]
pub struct Collector {
  receivers: Vec<NotificationReceiver>,
  expected_results: usize,
  results: Vec<ResultRecord>,
  maintenance: Vec<MaintenanceRecord>,
}

impl Collector {
  /// `receivers` are polled in the order given.
  pub fn new(receivers: Vec<NotificationReceiver>, expected_results: usize) -> Self {
    Self {
      receivers,
      expected_results,
      results: Vec::with_capacity(expected_results),
      maintenance: Vec::new(),
    }
  }

  pub fn is_complete(&self) -> bool {
    self.results.len() >= self.expected_results
  }

  pub fn results_received(&self) -> usize {
    self.results.len()
  }

  pub fn expected_results(&self) -> usize {
    self.expected_results
  }

  /// Drain every message currently available on every channel without
  /// waiting. Returns how many messages were taken.
  pub fn sweep(&mut self) -> usize {
    let mut taken = 0;
    for receiver in &mut self.receivers {
      while let Polled::Ready(notification) = receiver.poll() {
        trace!(node_id = receiver.node_id(), ?notification, "notification_received");
        match notification {
          Notification::Result(record) => self.results.push(record),
          Notification::Maintenance(record) => self.maintenance.push(record),
        }
        taken += 1;
      }
    }
    taken
  }

  /// Hand back the buffered records, in arrival order.
  pub fn into_records(self) -> (Vec<ResultRecord>, Vec<MaintenanceRecord>) {
    (self.results, self.maintenance)
  }
}
