//! Run orchestration.
//!
//! The `Coordinator` wires the channel registry from a topology, spawns one
//! worker task per node, hands each its configuration and then polls the
//! workers' notification channels until every cycle has produced a result.

use std::time::Duration;

use futures::future::join_all;
use millwright_config::NodeId;
use millwright_machine::{MachineError, NodeSummary, run_worker};
use millwright_topology::Topology;
use millwright_transport::{
  ConfigOutbox, EndpointSpec, MaintenanceRecord, Registry, ResultRecord,
};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::collector::Collector;
use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::report::Report;

/// A spawned worker task.
#[derive(Debug)]
pub(crate) struct WorkerHandle {
  pub(crate) node_id: NodeId,
  pub(crate) handle: JoinHandle<Result<NodeSummary, MachineError>>,
}

/// Drives a whole run: setup, configuration, collection and teardown.
#[derive(Debug, Clone, Default)]
pub struct Coordinator {
  config: CoordinatorConfig,
}

impl Coordinator {
  pub fn new(config: CoordinatorConfig) -> Self {
    Self { config }
  }

  /// Run every node of `topology` for the configured number of cycles and
  /// return the sorted report.
  #[instrument(
    name = "coordinator_run",
    skip(self, topology),
    fields(run_id = tracing::field::Empty, machines = topology.len())
  )]
  pub async fn run(&self, topology: &Topology) -> Result<Report, CoordinatorError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    tracing::Span::current().record("run_id", run_id.as_str());

    let specs: Vec<EndpointSpec> = topology
      .nodes()
      .map(|node| EndpointSpec {
        node_id: node.id,
        parent_id: node.parent_id,
        fan_in: node.children.len(),
      })
      .collect();
    let (endpoints, workers) = Registry::build(&specs)?.split();

    let cancel = CancellationToken::new();
    let mut handles: Vec<WorkerHandle> = workers
      .into_iter()
      .map(|endpoints| WorkerHandle {
        node_id: endpoints.node_id,
        handle: tokio::spawn(run_worker(endpoints, cancel.child_token())),
      })
      .collect();

    let cycles = topology.settings().cycles;
    info!(run_id = %run_id, cycles, "run_started");

    let collected = match distribute(topology, endpoints.config) {
      Ok(()) => {
        let collector = Collector::new(endpoints.notifications, cycles as usize);
        self.collect(collector, &mut handles).await
      }
      Err(e) => Err(e),
    };

    cancel.cancel();
    let outcome = shutdown(handles, collected.is_ok()).await;

    let (results, maintenance) = collected.map_err(|e| most_severe(e, outcome.failures))?;
    info!(
      run_id = %run_id,
      results = results.len(),
      maintenance = maintenance.len(),
      workers_finished = outcome.finished,
      workers_cancelled = outcome.cancelled,
      "collection_completed"
    );
    Ok(Report::from_records(results, maintenance))
  }

  /// Poll until the collector is complete, watching the workers while idle.
  pub(crate) async fn collect(
    &self,
    mut collector: Collector,
    handles: &mut Vec<WorkerHandle>,
  ) -> Result<(Vec<ResultRecord>, Vec<MaintenanceRecord>), CoordinatorError> {
    let mut last_progress = Instant::now();

    while !collector.is_complete() {
      if collector.sweep() > 0 {
        last_progress = Instant::now();
        continue;
      }

      reap_finished(handles).await?;

      if let Some(limit) = self.config.stall_timeout {
        let waited = last_progress.elapsed();
        if waited >= limit {
          return Err(CoordinatorError::Stalled {
            waited,
            received: collector.results_received(),
            expected: collector.expected_results(),
          });
        }
      }

      idle(self.config.poll_interval).await;
    }

    Ok(collector.into_records())
  }
}

/// Send every node its serialized configuration slice.
fn distribute(topology: &Topology, outboxes: Vec<ConfigOutbox>) -> Result<(), CoordinatorError> {
  for outbox in outboxes {
    let node_id = outbox.node_id();
    let config = topology
      .node_config(node_id)
      .ok_or(CoordinatorError::MissingConfig { node_id })?;
    let message = config
      .to_message()
      .map_err(|source| CoordinatorError::ConfigEncoding { node_id, source })?;
    outbox.send(message)?;
  }
  debug!(machines = topology.len(), "configuration_distributed");
  Ok(())
}

async fn idle(poll_interval: Duration) {
  if poll_interval.is_zero() {
    tokio::task::yield_now().await;
  } else {
    tokio::time::sleep(poll_interval).await;
  }
}

/// Take every worker that has already stopped and surface the most severe
/// failure among them.
async fn reap_finished(handles: &mut Vec<WorkerHandle>) -> Result<(), CoordinatorError> {
  let mut failures = Vec::new();
  let mut index = 0;
  while index < handles.len() {
    if !handles[index].handle.is_finished() {
      index += 1;
      continue;
    }
    let worker = handles.remove(index);
    match settle(worker.node_id, worker.handle.await) {
      Ok(summary) => debug!(
        node_id = summary.node_id,
        cycles = summary.cycles_completed,
        "worker_finished"
      ),
      Err(e) => failures.push(e),
    }
  }

  let mut failures = failures.into_iter();
  match failures.next() {
    Some(first) => Err(most_severe(first, failures.collect())),
    None => Ok(()),
  }
}

/// Lower is closer to the root cause. A failing worker closes its channels,
/// so its neighbours stop with transport errors shortly after.
fn failure_rank(error: &CoordinatorError) -> u8 {
  match error {
    CoordinatorError::WorkerPanicked { .. } => 0,
    CoordinatorError::Worker {
      source: MachineError::Transport(_),
      ..
    } => 2,
    CoordinatorError::Worker {
      source: MachineError::Cancelled { .. },
      ..
    } => 3,
    _ => 1,
  }
}

/// Pick the failure closest to the root cause; ties keep the earlier one.
fn most_severe(first: CoordinatorError, others: Vec<CoordinatorError>) -> CoordinatorError {
  others.into_iter().fold(first, |best, e| {
    if failure_rank(&e) < failure_rank(&best) {
      e
    } else {
      best
    }
  })
}

fn settle(
  node_id: NodeId,
  joined: Result<Result<NodeSummary, MachineError>, JoinError>,
) -> Result<NodeSummary, CoordinatorError> {
  match joined {
    Ok(Ok(summary)) => Ok(summary),
    Ok(Err(source)) => Err(CoordinatorError::Worker { node_id, source }),
    Err(e) => Err(CoordinatorError::WorkerPanicked {
      node_id,
      message: e.to_string(),
    }),
  }
}

#[derive(Debug, Default)]
struct ShutdownOutcome {
  finished: usize,
  cancelled: usize,
  /// Failures of workers that stopped on their own, when the run failed.
  failures: Vec<CoordinatorError>,
}

/// Await every remaining worker after the cancellation token has fired.
async fn shutdown(handles: Vec<WorkerHandle>, succeeded: bool) -> ShutdownOutcome {
  let (ids, joins): (Vec<NodeId>, Vec<_>) =
    handles.into_iter().map(|w| (w.node_id, w.handle)).unzip();

  let mut outcome = ShutdownOutcome::default();
  for (node_id, joined) in ids.into_iter().zip(join_all(joins).await) {
    match settle(node_id, joined) {
      Ok(_) => outcome.finished += 1,
      Err(CoordinatorError::Worker {
        source: MachineError::Cancelled { .. },
        ..
      }) => outcome.cancelled += 1,
      Err(e) if !succeeded => {
        debug!(node_id, error = %e, "worker_stopped");
        outcome.failures.push(e);
      }
      Err(e) => warn!(node_id, error = %e, "worker_failed_after_collection"),
    }
  }
  outcome
}

#[cfg(test)]
mod tests {
  use super::*;
  use millwright_transport::{Notification, Notifier, TransportError, notification_channel};

  fn coordinator(stall_ms: Option<u64>) -> Coordinator {
    Coordinator::new(CoordinatorConfig {
      poll_interval: Duration::from_millis(1),
      stall_timeout: stall_ms.map(Duration::from_millis),
    })
  }

  #[tokio::test]
  async fn test_failed_worker_aborts_collection() {
    let (_notifier, receiver) = notification_channel(3);
    let collector = Collector::new(vec![receiver], 1);
    let mut handles = vec![WorkerHandle {
      node_id: 3,
      handle: tokio::spawn(async { Err(MachineError::Cancelled { node_id: 3 }) }),
    }];

    let err = coordinator(None)
      .collect(collector, &mut handles)
      .await
      .unwrap_err();
    assert!(matches!(err, CoordinatorError::Worker { node_id: 3, .. }));
    assert!(handles.is_empty());
  }

  async fn exploding_worker() -> Result<NodeSummary, MachineError> {
    panic!("wear table exploded")
  }

  #[tokio::test]
  async fn test_panic_reported_before_downstream_transport_error() {
    let (_notifier, receiver) = notification_channel(1);
    let collector = Collector::new(vec![receiver], 1);
    let mut handles = vec![
      WorkerHandle {
        node_id: 1,
        handle: tokio::spawn(async {
          Err(MachineError::Transport(TransportError::InboxClosed { node_id: 1 }))
        }),
      },
      WorkerHandle {
        node_id: 2,
        handle: tokio::spawn(exploding_worker()),
      },
    ];
    while !handles.iter().all(|w| w.handle.is_finished()) {
      tokio::task::yield_now().await;
    }

    let err = coordinator(None)
      .collect(collector, &mut handles)
      .await
      .unwrap_err();
    assert!(matches!(err, CoordinatorError::WorkerPanicked { node_id: 2, .. }));
  }

  #[test]
  fn test_most_severe_prefers_cause_over_transport() {
    let transport = CoordinatorError::Worker {
      node_id: 1,
      source: MachineError::Transport(TransportError::InboxClosed { node_id: 1 }),
    };
    let cancelled = CoordinatorError::Worker {
      node_id: 3,
      source: MachineError::Cancelled { node_id: 3 },
    };
    let overflow = CoordinatorError::Worker {
      node_id: 2,
      source: MachineError::WearOverflow {
        node_id: 2,
        cycle: 1,
      },
    };

    let err = most_severe(transport, vec![cancelled, overflow]);
    assert!(matches!(err, CoordinatorError::Worker { node_id: 2, .. }));
  }

  #[tokio::test]
  async fn test_stall_timeout() {
    let (_notifier, receiver) = notification_channel(1);
    let collector = Collector::new(vec![receiver], 2);
    let mut handles = vec![WorkerHandle {
      node_id: 1,
      handle: tokio::spawn(async {
        std::future::pending::<()>().await;
        Err(MachineError::Cancelled { node_id: 1 })
      }),
    }];

    let err = coordinator(Some(20))
      .collect(collector, &mut handles)
      .await
      .unwrap_err();
    assert!(matches!(
      err,
      CoordinatorError::Stalled {
        received: 0,
        expected: 2,
        ..
      }
    ));

    for worker in handles {
      worker.handle.abort();
    }
  }

  #[tokio::test]
  async fn test_collect_waits_for_late_results() {
    let (notifier, receiver) = notification_channel(1);
    let collector = Collector::new(vec![receiver], 2);
    let mut handles = Vec::new();

    notifier.notify(Notification::Result(ResultRecord {
      product: "a".to_string(),
      cycle: 1,
    }));
    let sender = tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(10)).await;
      notifier.notify(Notification::Result(ResultRecord {
        product: "b".to_string(),
        cycle: 2,
      }));
    });

    let (results, maintenance) = coordinator(Some(5_000))
      .collect(collector, &mut handles)
      .await
      .unwrap();
    sender.await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(maintenance.is_empty());
  }
}
