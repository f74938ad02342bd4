//! AMM Simulation CLI
//!
//! Command-line interface for the randomized AMM market simulation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use amm::{DEFAULT_CREATION_FEE, FEE_DENOMINATOR, MINIMUM_LIQUIDITY, SUPPORTED_FEE_TIERS};
use amm_sim::{
    analytics::{
        logger::{print_summary, SimulationLogger},
        report::generate_report,
    },
    config::SimulationConfig,
    simulation::Orchestrator,
};

#[derive(Parser)]
#[command(name = "amm-sim")]
#[command(version = "0.1.0")]
#[command(about = "Randomized market simulation for the constant-product AMM engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON configuration file; command-line flags override its values
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run {
        /// Number of random steps to simulate
        #[arg(short, long)]
        steps: Option<u32>,

        /// RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of tokens (one pool per consecutive pair)
        #[arg(long)]
        tokens: Option<u32>,

        /// Probability a step is a swap (0.0 - 1.0)
        #[arg(long)]
        swap_probability: Option<f64>,

        /// Probability a step is a deposit (0.0 - 1.0)
        #[arg(long)]
        add_probability: Option<f64>,

        /// Output directory for results
        #[arg(short, long)]
        output: Option<String>,

        /// Skip HTML report generation
        #[arg(long)]
        no_report: bool,
    },

    /// Generate report from existing simulation results
    Report {
        /// Input JSON file with simulation results
        #[arg(short, long)]
        input: PathBuf,

        /// Output HTML file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show quick simulation stats without saving anything
    Quick {
        /// Number of steps for quick test
        #[arg(short, long, default_value = "100")]
        steps: u32,
    },

    /// Print configuration info
    Info,
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over --verbose when set
    if std::env::var_os("RUST_LOG").is_some() {
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .compact()
            .init();
    } else {
        let log_level = if verbose { Level::DEBUG } else { Level::INFO };
        FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    match path {
        Some(path) => SimulationConfig::from_file(path),
        None => Ok(SimulationConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            steps,
            seed,
            tokens,
            swap_probability,
            add_probability,
            output,
            no_report,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(steps) = steps {
                config.steps = steps;
            }
            if let Some(seed) = seed {
                config.seed = seed;
            }
            if let Some(tokens) = tokens {
                config.num_tokens = tokens;
            }
            if let Some(p) = swap_probability {
                config.swap_probability = p;
            }
            if let Some(p) = add_probability {
                config.add_probability = p;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            config.validate()?;

            run_simulation(config, !no_report)?;
        }

        Commands::Report { input, output } => {
            generate_report_from_file(&input, output.as_deref())?;
        }

        Commands::Quick { steps } => {
            let config = match cli.config.as_deref() {
                Some(path) => SimulationConfig::from_file(path)?,
                None => SimulationConfig::quick_test(),
            };
            run_quick_simulation(SimulationConfig { steps, ..config })?;
        }

        Commands::Info => {
            print_info(&load_config(cli.config.as_deref())?);
        }
    }

    Ok(())
}

fn run_simulation(config: SimulationConfig, generate_html: bool) -> Result<()> {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║       Constant-Product AMM Simulation                    ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    info!("Configuration:");
    info!("  Steps:           {}", config.steps);
    info!("  Seed:            {}", config.seed);
    info!("  Pools:           {}", config.num_pools());
    info!("  Fee tiers:       {:?} bps", config.fee_tiers);
    info!("  Swap range:      {} - {}", config.min_swap, config.max_swap);
    println!();

    let output_dir = config.output_dir.clone();
    let mut orchestrator = Orchestrator::new(config)?;
    let results = orchestrator.run()?;

    print_summary(&results);

    let logger = SimulationLogger::new(&output_dir);
    let json_path = logger.save_results(&results)?;
    logger.save_summary(&results)?;

    if generate_html {
        let report_path = logger.reports_dir().join("report.html");
        generate_report(&results, &report_path)?;

        println!();
        println!("📊 Report generated: {}", report_path.display());
        println!("   Open in browser to view interactive charts");
    }

    println!();
    println!("📁 Results saved to: {}", json_path.display());
    println!();

    if !results.invariant_violations.is_empty() {
        warn!(
            "Run finished with {} invariant violations",
            results.invariant_violations.len()
        );
        anyhow::bail!("invariant violations detected");
    }

    Ok(())
}

fn generate_report_from_file(input: &Path, output: Option<&Path>) -> Result<()> {
    info!("Loading results from: {}", input.display());

    let results = SimulationLogger::load_results(input)?;

    let output_path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("output/reports/report.html"));

    generate_report(&results, &output_path)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    println!("📊 Report generated: {}", output_path.display());

    Ok(())
}

fn run_quick_simulation(config: SimulationConfig) -> Result<()> {
    println!();
    println!("🚀 Running quick simulation ({} steps)...", config.steps);
    println!();

    let mut orchestrator = Orchestrator::new(config)?;
    let results = orchestrator.run()?;

    print_summary(&results);

    Ok(())
}

fn print_info(config: &SimulationConfig) {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║       AMM Simulation - Info                              ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
    println!("Drives random swaps, deposits and withdrawals through the");
    println!("constant-product engine and checks its invariants after every step.");
    println!();
    println!("ENGINE:");
    println!("  Fee denominator:      {}", FEE_DENOMINATOR);
    println!("  Supported fee tiers:  {:?} bps", SUPPORTED_FEE_TIERS);
    println!("  Minimum liquidity:    {} (locked at genesis)", MINIMUM_LIQUIDITY);
    println!("  Default creation fee: {}", DEFAULT_CREATION_FEE);
    println!();
    println!("COMPONENTS:");
    println!("  • Trader                - Quoted swaps with a slippage limit");
    println!("  • Liquidity Provider    - Ratio deposits and partial withdrawals");
    println!("  • Orchestrator          - Seeded run with per-step invariant checks");
    println!("  • Analytics             - JSON logs, text summary, HTML charts");
    println!();
    println!("ACTIVE CONFIG:");
    println!(
        "  Steps {} | Seed {} | Tokens {} | Traders {} | Providers {}",
        config.steps, config.seed, config.num_tokens, config.num_traders, config.num_providers
    );
    println!();
    println!("USAGE:");
    println!("  amm-sim run --steps 1000 --seed 7   # Run full simulation");
    println!("  amm-sim quick                       # Quick 100 step test");
    println!("  amm-sim report -i results.json      # Generate report");
    println!("  amm-sim --config sim.json run       # Run from a config file");
    println!();
}
