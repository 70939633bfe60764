use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use machine_learning::target::TargetData;
use ndarray::{Array, array};
use reservoir::NodeRole;
use worker::{JobSpec, SweepConfig};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("worker-bin-{name}-{}", std::process::id()))
}

fn job(output_id: &str, y: TargetData, dir: &Path) -> JobSpec {
    JobSpec {
        output_id: output_id.into(),
        w: array![[0.0, 1.0], [1.0, 0.0]],
        roles: vec![NodeRole::Input, NodeRole::Output],
        x: Array::from_shape_fn((60, 1), |(t, _)| (t as f64 * 0.4).sin()),
        y,
        sweep: SweepConfig {
            alphas: vec![0.5, 1.0],
            output_dir: dir.to_path_buf(),
            ..Default::default()
        },
    }
}

/// Runs the `worker` binary with `job` as its only input.
fn run_worker(job: &JobSpec) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_worker"))
        .env("RUST_LOG", "error")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    let input = serde_json::to_vec(job).unwrap();
    child.stdin.take().unwrap().write_all(&input).unwrap();
    child.wait_with_output().unwrap()
}

#[test]
fn the_binary_prints_the_path_of_its_table() {
    let dir = temp_dir("good");
    let y = Array::from_shape_fn(60, |t| (t as f64 * 0.4).cos());
    let job = job("pair_null_2", TargetData::from(y), &dir);

    let output = run_worker(&job);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8(output.stdout).unwrap();
    let path = PathBuf::from(stdout.trim());
    assert_eq!(path, dir.join("pair_null_2_scores.csv"));

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.iter().collect::<Vec<_>>(), ["alpha", "module", "n_nodes", "score"]);
    assert_eq!(reader.records().count(), 2);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn a_failed_job_exits_with_an_error_naming_it() {
    let dir = temp_dir("bad");
    // A single class can't be classified.
    let y = TargetData::from(Array::from_elem(60, 0i64));
    let job = job("pair_null_7", y, &dir);

    let output = run_worker(&job);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("pair_null_7"), "{stderr}");
    assert!(!dir.join("pair_null_7_scores.csv").exists());
}

#[test]
fn malformed_input_is_rejected() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_worker"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child.stdin.take().unwrap().write_all(b"{ not json").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}
