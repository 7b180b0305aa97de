//! Parser for the line-oriented topology description.
//!
//! ```text
//! 3            machine count N
//! 2            production cycles
//! 1 2 3 4 5    wear costs: enhance reverse chop trim split
//! 10           wear threshold
//! 2 1 reverse  N-1 lines of `<node_id> <parent_id> <state>`
//! 3 2 trim
//! seed         one seed per leaf, ascending leaf id
//! ```

use std::str::FromStr;

use millwright_config::{MachineState, RunSettings, WEAR_COST_COUNT, WearCosts};

use crate::error::TopologyError;
use crate::topology::{ChildLink, Topology};

impl Topology {
  /// Parse a full topology description.
  pub fn parse(text: &str) -> Result<Self, TopologyError> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let machine_count: u32 = header(&mut lines, 1, "machine count")?;
    let cycles: u32 = header(&mut lines, 2, "cycle count")?;
    let wear_costs = parse_wear_costs(next_line(&mut lines, 3, "wear costs")?)?;
    let threshold: u64 = header(&mut lines, 4, "wear threshold")?;

    let link_count = machine_count.saturating_sub(1) as usize;
    let mut links = Vec::with_capacity(link_count);
    for i in 0..link_count {
      let line = next_line(&mut lines, 5 + i, "child link")?;
      links.push(parse_link(line)?);
    }

    let mut seeds: Vec<String> = lines.map(|(_, l)| l.trim().to_string()).collect();
    while seeds.last().is_some_and(|s| s.is_empty()) {
      seeds.pop();
    }

    let settings = RunSettings {
      cycles,
      wear_costs,
      threshold,
    };
    Topology::from_parts(machine_count, settings, links, seeds)
  }
}

fn next_line<'a>(
  lines: &mut impl Iterator<Item = (usize, &'a str)>,
  line: usize,
  what: &'static str,
) -> Result<(usize, &'a str), TopologyError> {
  lines.next().ok_or(TopologyError::MissingLine { line, what })
}

fn header<'a, T: FromStr>(
  lines: &mut impl Iterator<Item = (usize, &'a str)>,
  line: usize,
  what: &'static str,
) -> Result<T, TopologyError> {
  parse_number(next_line(lines, line, what)?, what)
}

fn parse_number<T: FromStr>(
  (line, content): (usize, &str),
  what: &'static str,
) -> Result<T, TopologyError> {
  let value = content.trim();
  value.parse().map_err(|_| TopologyError::InvalidNumber {
    line,
    what,
    value: value.to_string(),
  })
}

fn parse_wear_costs((line, content): (usize, &str)) -> Result<WearCosts, TopologyError> {
  let fields: Vec<&str> = content.split_whitespace().collect();
  if fields.len() != WEAR_COST_COUNT {
    return Err(TopologyError::WearCostCount {
      line,
      count: fields.len(),
    });
  }

  let mut costs = [0u64; WEAR_COST_COUNT];
  for (slot, field) in costs.iter_mut().zip(fields) {
    *slot = parse_number((line, field), "wear cost")?;
  }
  Ok(WearCosts::new(costs))
}

fn parse_link((line, content): (usize, &str)) -> Result<ChildLink, TopologyError> {
  let fields: Vec<&str> = content.split_whitespace().collect();
  let [node_id, parent_id, state] = fields.as_slice() else {
    return Err(TopologyError::InvalidLink {
      line,
      content: content.to_string(),
    });
  };

  let initial_state = state
    .parse::<MachineState>()
    .map_err(|source| TopologyError::UnknownState { line, source })?;

  Ok(ChildLink {
    node_id: parse_number((line, *node_id), "node id")?,
    parent_id: parse_number((line, *parent_id), "parent id")?,
    initial_state,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = "\
5
3
1 2 3 4 5
10
2 1 split
3 1 trim
4 2 reverse
5 2 enhance
leaf-three
leaf-four
leaf-five
";

  #[test]
  fn test_parse_sample() {
    let topology = Topology::parse(SAMPLE).unwrap();

    assert_eq!(topology.len(), 5);
    assert_eq!(topology.settings().cycles, 3);
    assert_eq!(topology.settings().threshold, 10);
    assert_eq!(topology.settings().wear_costs.as_array(), &[1, 2, 3, 4, 5]);
    assert_eq!(topology.root().children, vec![2, 3]);
    assert_eq!(topology.node(2).unwrap().initial_state, MachineState::Split);
    assert_eq!(topology.node(5).unwrap().seed.as_deref(), Some("leaf-five"));
  }

  #[test]
  fn test_parse_minimal_chain() {
    let topology = Topology::parse("3\n1\n1 1 1 1 1\n5\n2 1 reverse\n3 2 trim\nx").unwrap();
    assert_eq!(topology.leaves(), vec![3]);
    assert_eq!(topology.node(3).unwrap().seed.as_deref(), Some("x"));
  }

  #[test]
  fn test_parse_trims_seeds_and_trailing_blank_lines() {
    let topology = Topology::parse("2\n1\n1 1 1 1 1\n5\n2 1 chop\n  padded \r\n\n\n").unwrap();
    assert_eq!(topology.node(2).unwrap().seed.as_deref(), Some("padded"));
  }

  #[test]
  fn test_parse_missing_header() {
    let err = Topology::parse("3\n2\n").unwrap_err();
    assert!(matches!(err, TopologyError::MissingLine { line: 3, .. }));
  }

  #[test]
  fn test_parse_bad_number() {
    let err = Topology::parse("three\n").unwrap_err();
    assert!(matches!(err, TopologyError::InvalidNumber { line: 1, .. }));
  }

  #[test]
  fn test_parse_wrong_wear_cost_count() {
    let err = Topology::parse("2\n1\n1 2 3\n5\n2 1 chop\nx\n").unwrap_err();
    assert!(matches!(err, TopologyError::WearCostCount { line: 3, count: 3 }));
  }

  #[test]
  fn test_parse_unknown_state() {
    let err = Topology::parse("2\n1\n1 1 1 1 1\n5\n2 1 polish\nx\n").unwrap_err();
    assert!(matches!(err, TopologyError::UnknownState { line: 5, .. }));
  }

  #[test]
  fn test_parse_malformed_link() {
    let err = Topology::parse("2\n1\n1 1 1 1 1\n5\n2 1\nx\n").unwrap_err();
    assert!(matches!(err, TopologyError::InvalidLink { line: 5, .. }));
  }

  #[test]
  fn test_parse_seed_mismatch() {
    let err = Topology::parse("2\n1\n1 1 1 1 1\n5\n2 1 chop\nx\ny\n").unwrap_err();
    assert!(matches!(err, TopologyError::SeedCount { leaves: 1, seeds: 2 }));
  }
}
