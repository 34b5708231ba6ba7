//! Multi-seed, multi-scenario benchmark for the movement planner. Runs fan
//! out over a rayon pool and land in `runs.csv`, `rankings.csv`, and
//! `summary.json` under the output directory.

use crate::config::PlannerConfig;
use crate::runner::{run_scenario, RunMetrics};
use crate::scenario::SCENARIO_NAMES;
use crate::util::seed_to_hex;
use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub scenarios: Vec<String>,
    pub seeds: Vec<u32>,
    pub max_frames: u32,
    pub planner: PlannerConfig,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    pub scenario: String,
    pub seed: u32,
    pub seed_hex: String,
    pub frames: u32,
    pub reached_at_frame: Option<u32>,
    pub sessions: u32,
    pub rollbacks: u32,
    pub reuse_hits: u32,
    pub overflows: u32,
    pub distance_covered: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioAggregate {
    pub scenario: String,
    pub runs: usize,
    pub reach_rate: f64,
    pub avg_frames_to_target: f64,
    pub avg_rollbacks: f64,
    pub avg_sessions: f64,
    pub avg_reuse_hits: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub max_frames: u32,
    pub jobs: Option<usize>,
    pub scenarios: Vec<String>,
    pub seeds: Vec<u32>,
    pub run_count: usize,
    pub scenario_rankings: Vec<ScenarioAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_scenarios(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(SCENARIO_NAMES.iter().map(|name| name.to_string()).collect()),
        Some(raw) => crate::util::parse_name_csv(raw),
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.seeds.is_empty() {
        return Err(anyhow!("benchmark requires at least one seed"));
    }
    if config.scenarios.is_empty() {
        return Err(anyhow!("benchmark requires at least one scenario"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let run_jobs: Vec<(String, u32)> = config
        .scenarios
        .iter()
        .flat_map(|name| config.seeds.iter().map(move |seed| (name.clone(), *seed)))
        .collect();

    let run_one = |(name, seed): &(String, u32)| -> Result<RunMetrics> {
        let artifact = run_scenario(name, config.planner, *seed, config.max_frames)
            .with_context(|| format!("benchmark run failed for scenario={name} seed={seed:#x}"))?;
        Ok(artifact.metrics)
    };

    let run_results: Vec<Result<RunMetrics>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let mut grouped: HashMap<String, Vec<&RunMetrics>> = HashMap::new();
    for run in &runs {
        grouped.entry(run.scenario.clone()).or_default().push(run);
    }

    let mut rankings = Vec::new();
    for (scenario, scenario_runs) in grouped {
        let count = scenario_runs.len();
        let reached: Vec<u32> = scenario_runs
            .iter()
            .filter_map(|run| run.reached_at_frame)
            .collect();
        let avg_frames_to_target = if reached.is_empty() {
            config.max_frames as f64
        } else {
            reached.iter().map(|frames| *frames as f64).sum::<f64>() / reached.len() as f64
        };
        rankings.push(ScenarioAggregate {
            scenario,
            runs: count,
            reach_rate: reached.len() as f64 / count as f64,
            avg_frames_to_target,
            avg_rollbacks: scenario_runs
                .iter()
                .map(|run| run.rollbacks as f64)
                .sum::<f64>()
                / count as f64,
            avg_sessions: scenario_runs
                .iter()
                .map(|run| run.sessions as f64)
                .sum::<f64>()
                / count as f64,
            avg_reuse_hits: scenario_runs
                .iter()
                .map(|run| run.reuse_hits as f64)
                .sum::<f64>()
                / count as f64,
        });
    }

    rankings.sort_by(|a, b| {
        b.reach_rate
            .total_cmp(&a.reach_rate)
            .then_with(|| a.avg_frames_to_target.total_cmp(&b.avg_frames_to_target))
            .then_with(|| a.avg_rollbacks.total_cmp(&b.avg_rollbacks))
    });

    let run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| RunRecord {
            scenario: run.scenario.clone(),
            seed: run.seed,
            seed_hex: seed_to_hex(run.seed),
            frames: run.frames,
            reached_at_frame: run.reached_at_frame,
            sessions: run.sessions,
            rollbacks: run.rollbacks,
            reuse_hits: run.reuse_hits,
            overflows: run.overflows,
            distance_covered: run.distance_covered,
        })
        .collect();

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        max_frames: config.max_frames,
        jobs: config.jobs,
        scenarios: config.scenarios,
        seeds: config.seeds,
        run_count: run_records.len(),
        scenario_rankings: rankings,
        runs: run_records,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    Ok(report)
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "scenario,seed_hex,seed,frames,reached_at_frame,sessions,rollbacks,reuse_hits,overflows,distance_covered\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{:.1}\n",
            row.scenario,
            row.seed_hex,
            row.seed,
            row.frames,
            row.reached_at_frame
                .map(|frames| frames.to_string())
                .unwrap_or_default(),
            row.sessions,
            row.rollbacks,
            row.reuse_hits,
            row.overflows,
            row.distance_covered
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[ScenarioAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,scenario,runs,reach_rate,avg_frames_to_target,avg_rollbacks,avg_sessions,avg_reuse_hits\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{:.4},{:.2},{:.2},{:.2},{:.2}\n",
            idx + 1,
            row.scenario,
            row.runs,
            row.reach_rate,
            row.avg_frames_to_target,
            row.avg_rollbacks,
            row.avg_sessions,
            row.avg_reuse_hits
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
