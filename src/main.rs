use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use millwright_coordinator::{Coordinator, CoordinatorConfig};
use millwright_topology::Topology;

/// Millwright - simulate a tree of production machines
#[derive(Parser)]
#[command(name = "millwright")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the topology description
  input: PathBuf,

  /// Path the report is written to
  output: PathBuf,

  /// Back-off between empty polls of the worker channels, in milliseconds
  #[arg(long, default_value_t = 1)]
  poll_interval_ms: u64,

  /// Abort if no worker reports anything for this many milliseconds
  #[arg(long)]
  stall_timeout_ms: Option<u64>,
}

impl Cli {
  fn coordinator_config(&self) -> CoordinatorConfig {
    CoordinatorConfig {
      poll_interval: Duration::from_millis(self.poll_interval_ms),
      stall_timeout: self.stall_timeout_ms.map(Duration::from_millis),
    }
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,millwright=info")),
    )
    .with_writer(std::io::stderr)
    .init();

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
  let topology = load_topology(&cli.input).await?;
  info!(
    machines = topology.len(),
    cycles = topology.settings().cycles,
    "topology_loaded"
  );

  let coordinator = Coordinator::new(cli.coordinator_config());
  let report = coordinator
    .run(&topology)
    .await
    .context("production run failed")?;

  report
    .write_to(&cli.output)
    .await
    .context("failed to write report")?;
  info!(
    output = %cli.output.display(),
    results = report.results.len(),
    maintenance = report.maintenance.len(),
    "report_written"
  );

  Ok(())
}

async fn load_topology(path: &Path) -> Result<Topology> {
  let text = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read topology file: {}", path.display()))?;
  Topology::parse(&text)
    .with_context(|| format!("failed to parse topology file: {}", path.display()))
}
