//! Whole-run tests: topology text in, report out.

use std::time::Duration;

use millwright_coordinator::{Coordinator, CoordinatorConfig, CoordinatorError, Report};
use millwright_machine::MachineError;
use millwright_topology::Topology;

async fn run(text: &str) -> Report {
  let topology = Topology::parse(text).unwrap();
  let coordinator = Coordinator::new(CoordinatorConfig {
    poll_interval: Duration::from_millis(1),
    stall_timeout: Some(Duration::from_secs(10)),
  });
  coordinator.run(&topology).await.unwrap()
}

#[tokio::test]
async fn test_three_node_chain() {
  let report = run("3\n1\n1 1 1 1 1\n5\n2 1 reverse\n3 2 trim\nx\n").await;
  assert_eq!(report.render(), "x\n");
}

#[tokio::test]
async fn test_fork_concatenates_by_child_id() {
  // cycle 1: reverse("ab") + split("abcd"); cycle 2: trim("ab") + chop("abcd")
  let report = run("3\n2\n1 1 1 1 1\n100\n3 1 split\n2 1 reverse\nab\nabcd\n").await;
  assert_eq!(report.render(), "baab\nababc\n");
}

#[tokio::test]
async fn test_enhanced_product_reaches_root() {
  // cycle 1: enhance("abc"); cycle 2: split("abc")
  let report = run("2\n2\n1 1 1 1 1\n100\n2 1 enhance\nabc\n").await;
  assert_eq!(report.render(), "aabcc\nab\n");
}

#[tokio::test]
async fn test_wear_overflow_is_attributed_to_its_node() {
  let topology = Topology::parse("2\n1\n1 1099511627776 1 1 1\n1\n2 1 reverse\nab\n").unwrap();
  let err = Coordinator::default().run(&topology).await.unwrap_err();

  assert!(matches!(
    err,
    CoordinatorError::Worker {
      node_id: 2,
      source: MachineError::WearOverflow {
        node_id: 2,
        cycle: 1
      }
    }
  ));
}

#[tokio::test]
async fn test_maintenance_lines() {
  let report = run("2\n3\n1 2 3 4 5\n2\n2 1 reverse\nab\n").await;
  assert_eq!(report.render(), "ba\nab\nba\n2-2-1\n2-12-2\n2-2-3");
}

#[tokio::test]
async fn test_single_machine() {
  let report = run("1\n2\n1 1 1 1 1\n5\nalone\n").await;
  assert_eq!(report.render(), "alone\nalone\n");
  assert!(report.maintenance.is_empty());
}

#[tokio::test]
async fn test_every_cycle_reported_once() {
  let report = run(
    "\
5
6
1 2 3 4 5
4
2 1 split
3 1 trim
4 2 reverse
5 2 enhance
alpha
beta
gamma
",
  )
  .await;

  let cycles: Vec<u32> = report.results.iter().map(|r| r.cycle).collect();
  assert_eq!(cycles, (1..=6).collect::<Vec<_>>());

  let keys: Vec<_> = report.maintenance.iter().map(|m| m.sort_key()).collect();
  let mut sorted = keys.clone();
  sorted.sort();
  assert_eq!(keys, sorted);
  assert!(report.maintenance.iter().all(|m| m.node_id != 1));
  assert!(report.maintenance.iter().all(|m| (1..=6).contains(&m.cycle)));
}

#[tokio::test]
async fn test_zero_yield_polling() {
  let topology = Topology::parse("3\n4\n1 1 1 1 1\n50\n2 1 chop\n3 1 trim\nleft\nright\n").unwrap();
  let coordinator = Coordinator::new(CoordinatorConfig {
    poll_interval: Duration::ZERO,
    stall_timeout: None,
  });

  let report = coordinator.run(&topology).await.unwrap();
  assert_eq!(report.results.len(), 4);
}

#[tokio::test]
async fn test_report_written_from_file_input() {
  let dir = tempfile::tempdir().unwrap();
  let input = dir.path().join("topology.txt");
  let output = dir.path().join("report.txt");
  std::fs::write(&input, "3\n1\n1 1 1 1 1\n5\n2 1 reverse\n3 2 trim\nx\n").unwrap();

  let text = tokio::fs::read_to_string(&input).await.unwrap();
  let topology = Topology::parse(&text).unwrap();
  let report = Coordinator::default().run(&topology).await.unwrap();
  report.write_to(&output).await.unwrap();

  assert_eq!(std::fs::read_to_string(&output).unwrap(), "x\n");
}
