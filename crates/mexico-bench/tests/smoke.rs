use std::fs;
use std::path::Path;

use mexico_bench::config::BenchmarkConfig;
use mexico_bench::tournament::{RunSummary, TournamentRunner, load_engine_state};
use mexico_bot::{DecisionEngine, EngineParams};
use mexico_core::MexicoRules;
use sha2::{Digest, Sha256};
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
rounds:
  seed: 4242
  count: 60
opponents:
  - name: "honest"
    bluff_rate: 0.1
    call_rate: 0.3
    small_raise_rate: 0.8
  - name: "liar"
    bluff_rate: 0.7
    call_rate: 0.5
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
  state_json: "{state}"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("rounds.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
        state = output_dir.join("engine_state.json").display()
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn run_in(dir: &Path) -> RunSummary {
    let config = load_config(dir);
    let outputs = config.resolved_outputs();
    let runner = TournamentRunner::new(config, outputs).expect("runner created");
    runner.run().expect("series completes")
}

fn sha256_hex(path: &Path) -> String {
    let bytes = fs::read(path).expect("output readable");
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

#[test]
fn same_seed_produces_identical_outputs() {
    let first_dir = tempdir().expect("temp dir");
    let second_dir = tempdir().expect("temp dir");

    let first = run_in(first_dir.path());
    let second = run_in(second_dir.path());

    assert_eq!(first.rounds_played, 60);
    assert_eq!(first.rows_written, 60);
    assert_eq!(first.engine_wins, second.engine_wins);
    assert_eq!(sha256_hex(&first.jsonl_path), sha256_hex(&second.jsonl_path));
    assert_eq!(sha256_hex(&first.state_path), sha256_hex(&second.state_path));
    assert!(first.summary_path.exists(), "summary markdown missing");
}

#[test]
fn rows_describe_each_round() {
    let dir = tempdir().expect("temp dir");
    let summary = run_in(dir.path());

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    let rows: Vec<serde_json::Value> = jsonl
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect();
    assert_eq!(rows.len(), 60);
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row["run_id"], "test_smoke");
        assert_eq!(row["round_index"], index);
        let expected_opponent = if index % 2 == 0 { "honest" } else { "liar" };
        assert_eq!(row["opponent"], expected_opponent);
        assert!(!row["turns"].as_array().expect("turns array").is_empty());
        let winner = row["winner"].as_str().expect("winner string");
        assert!(winner == "engine" || winner == "opponent");
    }

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("| honest |"));
    assert!(markdown.contains("| liar |"));
    assert!(markdown.contains("p-value"));
}

#[test]
fn saved_state_reloads_and_resumes() {
    let dir = tempdir().expect("temp dir");
    let summary = run_in(dir.path());

    let state = load_engine_state(&summary.state_path).expect("state parses");
    assert!(state.bandit.is_some());
    assert!(state.profiles.contains_key("honest"));
    assert!(state.profiles.contains_key("liar"));

    let mut engine =
        DecisionEngine::with_seed(EngineParams::default(), 1).with_rules(MexicoRules);
    engine.load_state(&state).expect("state loads");
    assert_eq!(engine.state(), state);

    let resume_dir = tempdir().expect("temp dir");
    let config = load_config(resume_dir.path());
    let outputs = config.resolved_outputs();
    let resumed = TournamentRunner::new(config, outputs)
        .expect("runner created")
        .with_state(state)
        .run()
        .expect("resumed series completes");
    assert_eq!(resumed.rows_written, 60);
}
