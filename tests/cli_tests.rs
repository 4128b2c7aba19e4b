//! Integration tests for the CLI application
//!
//! These tests verify that the CLI commands work correctly with real data files.

use std::io::Write;
use std::process::{Command, Output};
use tempfile::{NamedTempFile, TempDir};

/// Helper to create test data files
struct TestDataFiles {
    pub train_file: NamedTempFile,
    pub test_file: NamedTempFile,
    pub multiclass_file: NamedTempFile,
}

impl TestDataFiles {
    fn new() -> std::io::Result<Self> {
        let mut train_file = NamedTempFile::new()?;
        writeln!(train_file, "+1 1:2.0 2:1.0")?;
        writeln!(train_file, "-1 1:-2.0 2:-1.0")?;
        writeln!(train_file, "+1 1:1.5 2:0.8")?;
        writeln!(train_file, "-1 1:-1.5 2:-0.8")?;
        writeln!(train_file, "+1 1:1.8 2:0.9")?;
        writeln!(train_file, "-1 1:-1.8 2:-0.9")?;
        train_file.flush()?;

        let mut test_file = NamedTempFile::new()?;
        writeln!(test_file, "+1 1:1.6 2:0.7")?;
        writeln!(test_file, "-1 1:-1.6 2:-0.7")?;
        test_file.flush()?;

        let mut multiclass_file = NamedTempFile::new()?;
        for (label, x, y) in [(1, 0.0, 0.0), (2, 6.0, 0.0), (3, 0.0, 6.0)] {
            for (dx, dy) in [(0.0, 0.0), (0.3, 0.2), (-0.2, 0.4), (0.1, -0.3)] {
                writeln!(multiclass_file, "{label} 1:{} 2:{}", x + dx, y + dy)?;
            }
        }
        multiclass_file.flush()?;

        Ok(TestDataFiles {
            train_file,
            test_file,
            multiclass_file,
        })
    }
}

fn svmkit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_svmkit"))
        .args(args)
        .output()
        .expect("Failed to run svmkit")
}

fn path_str(path: &std::path::Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

fn assert_success(output: &Output, what: &str) {
    assert!(
        output.status.success(),
        "{what} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn train_model(data: &NamedTempFile, dir: &TempDir, extra: &[&str]) -> std::path::PathBuf {
    let model_path = dir.path().join("model.json");
    let mut args = vec![
        "train",
        "--data",
        path_str(data.path()),
        "--output",
        path_str(&model_path),
    ];
    args.extend_from_slice(extra);
    let output = svmkit(&args);
    assert_success(&output, "Train command");
    assert!(model_path.exists(), "Model file was not created");
    model_path
}

#[test]
fn test_cli_train_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(
        &test_data.train_file,
        &temp_dir,
        &["-C", "1.0", "--epsilon", "0.001", "--max-iterations", "100"],
    );

    let content = std::fs::read_to_string(model_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["format_version"], 1);
    assert_eq!(json["kernel"]["type"], "linear");
    assert_eq!(json["machines"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["metadata"]["training_params"]["c"], 1.0);
}

#[test]
fn test_cli_train_estimates_missing_parameters() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&test_data.train_file, &temp_dir, &["--kernel", "rbf"]);

    let content = std::fs::read_to_string(model_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["kernel"]["type"], "rbf");
    assert!(json["kernel"]["gamma"].as_f64().unwrap() > 0.0);
    assert!(json["metadata"]["training_params"]["c"].as_f64().unwrap() > 0.0);
}

#[test]
fn test_cli_train_kernels_and_strategies() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    for extra in [
        &["--kernel", "polynomial", "--degree", "2", "--gamma", "0.5"][..],
        &["--kernel", "sigmoid", "--gamma", "0.1"][..],
        &["--kernel", "laplacian", "--working-set-strategy", "mvp"][..],
        &["--kernel", "rbf", "--gamma", "1.0", "--working-set-strategy", "random"][..],
    ] {
        train_model(&test_data.train_file, &temp_dir, extra);
    }
}

#[test]
fn test_cli_predict_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&test_data.train_file, &temp_dir, &[]);
    let predictions_path = temp_dir.path().join("predictions.txt");

    let output = svmkit(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_file.path()),
        "--output",
        path_str(&predictions_path),
        "--scores",
    ]);
    assert_success(&output, "Predict command");

    let content = std::fs::read_to_string(&predictions_path).unwrap();
    let rows: Vec<Vec<&str>> = content
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.split_whitespace().collect())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][..2], ["0", "1"]);
    assert_eq!(rows[1][..2], ["1", "-1"]);
    assert!(rows[0][2].parse::<f64>().unwrap() > 0.0);
}

#[test]
fn test_cli_predict_to_stdout() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&test_data.train_file, &temp_dir, &[]);

    let output = svmkit(&[
        "predict",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_file.path()),
    ]);
    assert_success(&output, "Predict command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Predictions for 2 samples"));
    assert!(stdout.lines().any(|l| l == "1 -1"));
}

#[test]
fn test_cli_evaluate_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&test_data.train_file, &temp_dir, &[]);

    let output = svmkit(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.test_file.path()),
        "--detailed",
    ]);
    assert_success(&output, "Evaluate command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Accuracy: 100.00%"));
    assert!(stdout.contains("F1 Score:"));
}

#[test]
fn test_cli_multiclass_workflow() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(
        &test_data.multiclass_file,
        &temp_dir,
        &["--kernel", "rbf", "--gamma", "0.2", "--parallel"],
    );

    let output = svmkit(&["info", path_str(&model_path)]);
    assert_success(&output, "Info command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Classes: [1, 2, 3]"));
    assert!(stdout.contains("Machines: 3"));

    let output = svmkit(&[
        "evaluate",
        "--model",
        path_str(&model_path),
        "--data",
        path_str(test_data.multiclass_file.path()),
    ]);
    assert_success(&output, "Evaluate command");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Accuracy: 100.00%"));
}

#[test]
fn test_cli_info_command() {
    let test_data = TestDataFiles::new().expect("Failed to create test data");
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let model_path = train_model(&test_data.train_file, &temp_dir, &[]);

    let output = svmkit(&["info", path_str(&model_path)]);
    assert_success(&output, "Info command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== SVM Model Summary ==="));
    assert!(stdout.contains("Kernel: linear"));
    assert!(stdout.contains("Machine -1 vs 1"));
}

#[test]
fn test_cli_solve_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let a_path = temp_dir.path().join("a.txt");
    let b_path = temp_dir.path().join("b.txt");
    std::fs::write(&a_path, "3 1\n1 2\n").unwrap();
    std::fs::write(&b_path, "9\n8\n").unwrap();

    let output = svmkit(&[
        "solve",
        "--matrix",
        path_str(&a_path),
        "--rhs",
        path_str(&b_path),
    ]);
    assert_success(&output, "Solve command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Method: Lu"));
    let values: Vec<f64> = stdout
        .lines()
        .filter(|l| !l.starts_with('#'))
        .map(|l| l.trim().parse().unwrap())
        .collect();
    assert_eq!(values.len(), 2);
    assert!((values[0] - 2.0).abs() < 1e-9);
    assert!((values[1] - 3.0).abs() < 1e-9);
}

#[test]
fn test_cli_pseudo_inverse_to_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let a_path = temp_dir.path().join("a.txt");
    let out_path = temp_dir.path().join("pinv.txt");
    std::fs::write(&a_path, "2 0\n0 4\n0 0\n").unwrap();

    let output = svmkit(&[
        "solve",
        "--matrix",
        path_str(&a_path),
        "--output",
        path_str(&out_path),
    ]);
    assert_success(&output, "Solve command");

    let content = std::fs::read_to_string(&out_path).unwrap();
    let rows: Vec<Vec<f64>> = content
        .lines()
        .map(|l| l.split_whitespace().map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 3);
    assert!((rows[0][0] - 0.5).abs() < 1e-12);
    assert!((rows[1][1] - 0.25).abs() < 1e-12);
    assert!(rows[0][2].abs() < 1e-12);
}

#[test]
fn test_cli_decompose_command() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let a_path = temp_dir.path().join("a.txt");
    std::fs::write(&a_path, "1, 2\n2, 1\n").unwrap();

    let output = svmkit(&["decompose", "--matrix", path_str(&a_path), "--kind", "cholesky"]);
    assert_success(&output, "Decompose command");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Positive definite: false"));

    let output = svmkit(&["decompose", "--matrix", path_str(&a_path), "--kind", "eigen"]);
    assert_success(&output, "Decompose command");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Symmetric: true"));
}

#[test]
fn test_cli_error_handling() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let output = svmkit(&[
        "train",
        "--data",
        "nonexistent.txt",
        "--output",
        path_str(&temp_dir.path().join("model.json")),
    ]);
    assert!(!output.status.success(), "Should fail with nonexistent file");

    let output = svmkit(&["info", "nonexistent_model.json"]);
    assert!(!output.status.success(), "Should fail with nonexistent model");

    let single_class = temp_dir.path().join("single.txt");
    std::fs::write(&single_class, "+1 1:1.0\n+1 1:2.0\n").unwrap();
    let output = svmkit(&[
        "train",
        "--data",
        path_str(&single_class),
        "--output",
        path_str(&temp_dir.path().join("model.json")),
    ]);
    assert!(!output.status.success(), "Should fail with a single class");
}

#[test]
fn test_cli_help_and_version() {
    let output = svmkit(&["--help"]);
    assert_success(&output, "Help command");
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["train", "predict", "evaluate", "info", "solve", "decompose"] {
        assert!(stdout.contains(command), "help is missing {command}");
    }

    let output = svmkit(&["--version"]);
    assert_success(&output, "Version command");
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}
