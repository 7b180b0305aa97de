use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The operating state of a machine.
///
/// `Add` belongs to the root only and never changes. The remaining states
/// rotate in two fixed loops, `trim -> reverse -> trim` and
/// `split -> chop -> enhance -> split`, one step per completed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
  Add,
  Enhance,
  Reverse,
  Chop,
  Trim,
  Split,
}

/// Error returned when a state name is not one of the six known states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown machine state: '{0}'")]
pub struct ParseStateError(pub String);

impl MachineState {
  /// The state this machine moves to after a completed cycle.
  pub fn next(self) -> Self {
    match self {
      MachineState::Add => MachineState::Add,
      MachineState::Trim => MachineState::Reverse,
      MachineState::Reverse => MachineState::Trim,
      MachineState::Split => MachineState::Chop,
      MachineState::Chop => MachineState::Enhance,
      MachineState::Enhance => MachineState::Split,
    }
  }

  /// Index of this state's entry in the wear cost table, or `None` for `Add`.
  pub fn wear_index(self) -> Option<usize> {
    match self {
      MachineState::Add => None,
      MachineState::Enhance => Some(0),
      MachineState::Reverse => Some(1),
      MachineState::Chop => Some(2),
      MachineState::Trim => Some(3),
      MachineState::Split => Some(4),
    }
  }

  /// Whether applying this state accrues wear.
  pub fn is_stateful(self) -> bool {
    self.wear_index().is_some()
  }

  /// Apply this state's transformation to `input`.
  ///
  /// Lengths are counted in `char`s, so multi-byte input is never split in
  /// the middle of a code point.
  pub fn transform(self, input: &str) -> String {
    match self {
      MachineState::Add => input.to_string(),
      MachineState::Enhance => match (input.chars().next(), input.chars().next_back()) {
        (Some(first), Some(last)) => {
          let mut out = String::with_capacity(input.len() + first.len_utf8() + last.len_utf8());
          out.push(first);
          out.push_str(input);
          out.push(last);
          out
        }
        _ => String::new(),
      },
      MachineState::Reverse => input.chars().rev().collect(),
      MachineState::Chop => {
        let len = input.chars().count();
        if len > 1 {
          input.chars().take(len - 1).collect()
        } else {
          input.to_string()
        }
      }
      MachineState::Trim => {
        let len = input.chars().count();
        if len > 2 {
          input.chars().skip(1).take(len - 2).collect()
        } else {
          input.to_string()
        }
      }
      MachineState::Split => {
        let len = input.chars().count();
        input.chars().take(len.div_ceil(2)).collect()
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      MachineState::Add => "add",
      MachineState::Enhance => "enhance",
      MachineState::Reverse => "reverse",
      MachineState::Chop => "chop",
      MachineState::Trim => "trim",
      MachineState::Split => "split",
    }
  }
}

impl fmt::Display for MachineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for MachineState {
  type Err = ParseStateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "add" => Ok(MachineState::Add),
      "enhance" => Ok(MachineState::Enhance),
      "reverse" => Ok(MachineState::Reverse),
      "chop" => Ok(MachineState::Chop),
      "trim" => Ok(MachineState::Trim),
      "split" => Ok(MachineState::Split),
      other => Err(ParseStateError(other.to_string())),
    }
  }
}
