use rust_movebot::benchmark::{run_benchmark, BenchmarkConfig};
use rust_movebot::config::PlannerConfig;

#[test]
fn benchmark_smoke_outputs_expected_artifacts() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let report = run_benchmark(BenchmarkConfig {
        scenarios: vec!["corridor".to_string(), "ledge-gap".to_string()],
        seeds: vec![0xDEAD_BEEF, 0xC0FF_EE11],
        max_frames: 400,
        planner: PlannerConfig::default(),
        out_dir: tmp.path().to_path_buf(),
        jobs: None,
    })?;

    assert_eq!(report.run_count, 4);
    assert_eq!(report.scenario_rankings.len(), 2);
    assert!(tmp.path().join("summary.json").exists());
    assert!(tmp.path().join("runs.csv").exists());
    assert!(tmp.path().join("rankings.csv").exists());

    Ok(())
}
