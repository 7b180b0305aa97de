use std::path::Path;

use millwright_transport::{MaintenanceRecord, ResultRecord};
use serde::{Deserialize, Serialize};

use crate::error::CoordinatorError;

/// The final, deterministically ordered output of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
  /// Ascending by cycle.
  pub results: Vec<ResultRecord>,
  /// Ascending by `(node_id, cycle, cost)`.
  pub maintenance: Vec<MaintenanceRecord>,
}

impl Report {
  /// Sort records collected in arrival order into report order.
  pub fn from_records(
    mut results: Vec<ResultRecord>,
    mut maintenance: Vec<MaintenanceRecord>,
  ) -> Self {
    results.sort_by_key(|r| r.cycle);
    maintenance.sort_by_key(MaintenanceRecord::sort_key);
    Self {
      results,
      maintenance,
    }
  }

  /// Render the report text.
  ///
  /// Every product line ends with a newline; maintenance lines
  /// (`<node>-<cost>-<cycle>`) are newline-separated with none after the
  /// last one.
  pub fn render(&self) -> String {
    let mut out = String::new();
    for result in &self.results {
      out.push_str(&result.product);
      out.push('\n');
    }

    let maintenance: Vec<String> = self
      .maintenance
      .iter()
      .map(|m| format!("{}-{}-{}", m.node_id, m.cost, m.cycle))
      .collect();
    out.push_str(&maintenance.join("\n"));
    out
  }

  /// Render and write the report to `path`.
  pub async fn write_to(&self, path: &Path) -> Result<(), CoordinatorError> {
    tokio::fs::write(path, self.render())
      .await
      .map_err(|source| CoordinatorError::Io {
        path: path.to_path_buf(),
        source,
      })
  }
}
