use serde::{Deserialize, Serialize};

use crate::state::MachineState;

/// Number of stateful transformations, and so of wear cost entries.
pub const WEAR_COST_COUNT: usize = 5;

/// Wear cost per stateful transformation, in the order
/// enhance, reverse, chop, trim, split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WearCosts([u64; WEAR_COST_COUNT]);

impl WearCosts {
  pub fn new(costs: [u64; WEAR_COST_COUNT]) -> Self {
    Self(costs)
  }

  /// Wear accrued by one application of `state`, or `None` for `Add`.
  pub fn for_state(&self, state: MachineState) -> Option<u64> {
    state.wear_index().map(|i| self.0[i])
  }

  pub fn as_array(&self) -> &[u64; WEAR_COST_COUNT] {
    &self.0
  }
}

/// Run-wide settings shared by every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
  /// Total number of production cycles.
  pub cycles: u32,
  pub wear_costs: WearCosts,
  /// Accumulated wear at which a maintenance event fires.
  pub threshold: u64,
}
