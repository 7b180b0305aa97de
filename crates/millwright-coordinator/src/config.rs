use std::time::Duration;

/// Configuration for the coordinator's collection loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
  /// How long to back off after a sweep that found nothing. Zero yields to
  /// the scheduler instead of sleeping.
  pub poll_interval: Duration,
  /// Abort the run if no notification arrives for this long.
  pub stall_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
  fn default() -> Self {
    Self {
      poll_interval: Duration::from_millis(1),
      stall_timeout: None,
    }
  }
}
