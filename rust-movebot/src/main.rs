use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use rust_movebot::benchmark::{resolve_scenarios, run_benchmark, BenchmarkConfig};
use rust_movebot::config::PlannerConfig;
use rust_movebot::runner::run_scenario;
use rust_movebot::scenario::SCENARIO_NAMES;
use rust_movebot::strategies::describe_strategies;
use rust_movebot::util::{parse_seed, parse_seed_csv, seed_to_hex};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "rust-movebot")]
#[command(about = "Movement prediction planner lab: run and benchmark bot locomotion scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the movement strategies the planner dispatches between
    ListStrategies,
    /// List the built-in scenarios
    ListScenarios,
    /// Run one scenario with one seed and print the metrics
    Run {
        #[arg(long, default_value = "corridor")]
        scenario: String,
        #[arg(long, default_value = "0xC0FFEE")]
        seed: String,
        #[arg(long, default_value_t = 2_000)]
        max_frames: u32,
        /// JSON planner tuning profile; defaults ship in the binary
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write the full metrics JSON here as well
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the multi-seed benchmark across scenarios
    Benchmark {
        /// Comma-separated scenario names; all of them when omitted
        #[arg(long)]
        scenarios: Option<String>,
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long)]
        seed_start: Option<String>,
        #[arg(long, default_value_t = 8)]
        seed_count: u32,
        #[arg(long, default_value_t = 2_000)]
        max_frames: u32,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ListStrategies => {
            for (name, description) in describe_strategies() {
                println!("{name:<28} {description}");
            }
            Ok(())
        }
        Commands::ListScenarios => {
            for name in SCENARIO_NAMES {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Run {
            scenario,
            seed,
            max_frames,
            config,
            output,
        } => {
            let planner_config = load_config(config)?;
            let seed = parse_seed(&seed)?;
            let artifact = run_scenario(&scenario, planner_config, seed, max_frames)?;
            let metrics = &artifact.metrics;
            println!(
                "scenario={} seed={} frames={} reached={} sessions={} rollbacks={} reuse={}",
                metrics.scenario,
                seed_to_hex(metrics.seed),
                metrics.frames,
                metrics
                    .reached_at_frame
                    .map(|frame| frame.to_string())
                    .unwrap_or_else(|| "no".to_string()),
                metrics.sessions,
                metrics.rollbacks,
                metrics.reuse_hits,
            );
            if let Some(path) = output {
                fs::write(&path, serde_json::to_vec_pretty(metrics)?)?;
                println!("metrics written to {}", path.display());
            }
            Ok(())
        }
        Commands::Benchmark {
            scenarios,
            seeds,
            seed_start,
            seed_count,
            max_frames,
            config,
            out_dir,
            jobs,
        } => {
            let planner_config = load_config(config)?;
            let scenario_names = resolve_scenarios(scenarios.as_deref())?;
            let seed_list = resolve_seeds(seeds.as_deref(), seed_start.as_deref(), seed_count)?;
            let out_dir = out_dir.unwrap_or_else(|| PathBuf::from("benchmark-out"));

            let report = run_benchmark(BenchmarkConfig {
                scenarios: scenario_names,
                seeds: seed_list,
                max_frames,
                planner: planner_config,
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!(
                "{} runs across {} scenarios; artifacts in {}",
                report.run_count,
                report.scenario_rankings.len(),
                out_dir.display()
            );
            for (rank, entry) in report.scenario_rankings.iter().enumerate() {
                println!(
                    "  {}. {:<16} reach {:.0}%  avg frames {:.0}  avg rollbacks {:.1}",
                    rank + 1,
                    entry.scenario,
                    entry.reach_rate * 100.0,
                    entry.avg_frames_to_target,
                    entry.avg_rollbacks,
                );
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<PlannerConfig> {
    match path {
        Some(path) => PlannerConfig::from_file(&path),
        None => Ok(PlannerConfig::default()),
    }
}

fn resolve_seeds(
    seeds: Option<&str>,
    seed_start: Option<&str>,
    seed_count: u32,
) -> Result<Vec<u32>> {
    if let Some(raw) = seeds {
        return parse_seed_csv(raw);
    }
    let start = match seed_start {
        Some(raw) => parse_seed(raw)?,
        None => 0x5EED_0001,
    };
    if seed_count == 0 {
        return Err(anyhow!("--seed-count must be >= 1"));
    }
    Ok((0..seed_count).map(|i| start.wrapping_add(i)).collect())
}
