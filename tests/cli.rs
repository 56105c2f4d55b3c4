use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const BIN: &str = env!("CARGO_BIN_EXE_stack-tox");
const USAGE: &str = "Usage: stack-tox 'SMILES_STRING'\n";

fn write_artifacts(dir: &Path) {
    fs::write(
        dir.join("stacking_clf_model.json"),
        r#"{"kind": "decision_tree", "nodes": [{"value": [9, 1]}]}"#,
    )
    .unwrap();
    fs::write(dir.join("scaler.json"), r#"{"kind": "standard", "mean": [40.0, 20.0]}"#).unwrap();
    fs::write(dir.join("imputer.json"), r#"{"statistics": [40.0, 20.0]}"#).unwrap();
    fs::write(dir.join("descriptor_list.txt"), "MolWt\nTPSA\n").unwrap();
}

fn stack_tox(dir: &Path, args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .env("STACK_TOX_ARTIFACT_DIR", dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn predicts_ethanol() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let output = stack_tox(dir.path(), &["CCO"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Loading model and preprocessing pipeline...\n\
         Parsing SMILES...\n\
         Calculating 2 descriptors...\n\
         All descriptors calculated successfully.\n\
         Warning: Molecule is very small (3 atoms). Prediction may be unreliable.\n\
         No missing descriptors, skipping imputation.\n\
         Scaling descriptors...\n\
         Prediction: Non-Toxic (Confidence: 0.90)\n"
    );
}

#[test]
fn reads_artifacts_from_working_directory() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    let output = Command::new(BIN)
        .arg("c1ccccc1")
        .current_dir(dir.path())
        .env_remove("STACK_TOX_ARTIFACT_DIR")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).ends_with("Prediction: Non-Toxic (Confidence: 0.90)\n"));
}

#[test]
fn invalid_smiles_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let output = stack_tox(dir.path(), &["not a smiles"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "Invalid SMILES notation.\n");
}

#[test]
fn wrong_argument_count_prints_usage() {
    let dir = TempDir::new().unwrap();
    for args in [&[][..], &["CCO", "CCN"][..]] {
        let output = stack_tox(dir.path(), args);
        assert_eq!(output.status.code(), Some(1));
        assert_eq!(stdout(&output), USAGE);
    }
}

#[test]
fn version_exits_successfully() {
    let dir = TempDir::new().unwrap();
    let output = stack_tox(dir.path(), &["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn missing_descriptor_list_is_fatal() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path());
    fs::remove_file(dir.path().join("descriptor_list.txt")).unwrap();
    let output = stack_tox(dir.path(), &["CCO"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Pipeline component missing: descriptor list"));
    assert!(stderr.contains("descriptor_list.txt"));
    assert!(!stdout(&output).contains("Prediction"));
}
