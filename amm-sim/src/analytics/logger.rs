//! Structured logging for simulation results

use crate::simulation::SimulationResults;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Handles logging of simulation results to files
pub struct SimulationLogger {
    output_dir: PathBuf,
}

impl SimulationLogger {
    /// Create a new logger with the specified output directory
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.output_dir.join("logs")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.output_dir.join("reports")
    }

    /// Ensure output directories exist
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.logs_dir()).context("Failed to create logs directory")?;
        fs::create_dir_all(self.reports_dir()).context("Failed to create reports directory")?;
        Ok(())
    }

    /// Save simulation results to JSON file
    pub fn save_results(&self, results: &SimulationResults) -> Result<PathBuf> {
        self.ensure_dirs()?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = self
            .logs_dir()
            .join(format!("simulation_{}_seed{}.json", timestamp, results.config.seed));

        let json = serde_json::to_string_pretty(results).context("Failed to serialize results")?;

        let mut file = File::create(&path).context("Failed to create log file")?;
        file.write_all(json.as_bytes())
            .context("Failed to write log file")?;

        info!("Results saved to: {}", path.display());
        Ok(path)
    }

    /// Load results from a JSON file
    pub fn load_results(path: &Path) -> Result<SimulationResults> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read results file {}", path.display()))?;

        serde_json::from_str(&contents).context("Failed to parse results file")
    }

    /// Save a summary text file
    pub fn save_summary(&self, results: &SimulationResults) -> Result<PathBuf> {
        self.ensure_dirs()?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.logs_dir().join(format!("summary_{}.txt", timestamp));

        let mut file = File::create(&path).context("Failed to create summary file")?;
        file.write_all(format_summary(results).as_bytes())
            .context("Failed to write summary file")?;

        info!("Summary saved to: {}", path.display());
        Ok(path)
    }
}

/// Format results as a text summary
pub fn format_summary(results: &SimulationResults) -> String {
    let s = &results.summary;
    let c = &results.config;

    let mut out = format!(
        r#"
╔══════════════════════════════════════════════════════════════════╗
║            AMM SIMULATION RESULTS                                ║
╚══════════════════════════════════════════════════════════════════╝

  CONFIGURATION
  ─────────────
  Steps:                 {:>12}
  Seed:                  {:>12}
  Tokens / Pools:        {:>7} / {:<4}
  Swap Range:            {} - {}
  Action Mix:            {:.0}% swap, {:.0}% add, {:.0}% remove
  Slippage Tolerance:    {:>12} bps

  ACTIVITY
  ────────
  Accepted:              {:>12}  ({:.1}%)
  Rejected:              {:>12}
  Swaps:                 {:>12}
  Deposits:              {:>12}
  Withdrawals:           {:>12}
  Total Volume:          {:>12}
  Total Swap Fees:       {:>12}

  TREASURY
  ────────
  Collected:             {:>12}
  Withdrawn:             {:>12}
  Journal Events:        {:>12}
"#,
        c.steps,
        c.seed,
        c.num_tokens,
        s.pools_created,
        c.min_swap,
        c.max_swap,
        c.swap_probability * 100.0,
        c.add_probability * 100.0,
        (1.0 - c.swap_probability - c.add_probability).max(0.0) * 100.0,
        c.slippage_bps,
        s.accepted,
        s.acceptance_rate,
        s.rejected,
        s.swaps,
        s.deposits,
        s.withdrawals,
        s.total_volume,
        s.total_fees,
        s.treasury_collected,
        s.treasury_withdrawn,
        s.events_recorded,
    );

    out.push_str("\n  POOLS\n  ─────\n");
    for pool in &results.pools {
        out.push_str(&format!(
            "  {} @ {:>3} bps  reserves ({}, {})  swaps {}  k +{:.4}%\n",
            pool.id, pool.fee_bps, pool.reserve0, pool.reserve1, pool.swaps, pool.k_growth_pct
        ));
    }

    if !results.rejections.is_empty() {
        out.push_str("\n  REJECTIONS\n  ──────────\n");
        for (kind, count) in &results.rejections {
            out.push_str(&format!("  {:<30} {:>8}\n", kind, count));
        }
    }

    if results.invariant_violations.is_empty() {
        out.push_str("\n  ✓ All invariants held\n");
    } else {
        out.push_str(&format!(
            "\n  ✗ {} INVARIANT VIOLATIONS\n",
            results.invariant_violations.len()
        ));
        for violation in &results.invariant_violations {
            out.push_str(&format!("    {}\n", violation));
        }
    }

    out.push_str(&format!(
        "\nGenerated: {}\n",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out
}

/// Print summary to terminal
pub fn print_summary(results: &SimulationResults) {
    println!("{}", format_summary(results));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::simulation::Orchestrator;

    fn results() -> SimulationResults {
        let config = SimulationConfig {
            steps: 20,
            ..SimulationConfig::quick_test()
        };
        Orchestrator::new(config).unwrap().run().unwrap()
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let logger = SimulationLogger::new(dir.path());
        let results = results();

        let path = logger.save_results(&results).unwrap();
        assert!(path.starts_with(dir.path().join("logs")));

        let loaded = SimulationLogger::load_results(&path).unwrap();
        assert_eq!(loaded.summary.accepted, results.summary.accepted);
        assert_eq!(loaded.summary.total_volume, results.summary.total_volume);
        assert_eq!(loaded.trades, results.trades);
        assert_eq!(loaded.rejections, results.rejections);

        let ks = |r: &SimulationResults| r.pool_history.iter().map(|h| h.k).collect::<Vec<_>>();
        assert_eq!(ks(&loaded), ks(&results));
    }

    #[test]
    fn test_save_summary() {
        let dir = tempfile::tempdir().unwrap();
        let logger = SimulationLogger::new(dir.path());

        let path = logger.save_summary(&results()).unwrap();
        let text = fs::read_to_string(path).unwrap();

        assert!(text.contains("AMM SIMULATION RESULTS"));
        assert!(text.contains("pool#1"));
        assert!(text.contains("All invariants held"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SimulationLogger::load_results(&dir.path().join("nope.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read results file"));
    }
}
