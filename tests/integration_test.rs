use std::error::Error;
use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use stack_tox::descriptors::{calculate_descriptors, descriptor_names};
use stack_tox::{
    is_valid_smiles, parse_smiles, ArtifactError, Pipeline, PipelineConfig, PipelineError,
    ToxicityLabel,
};
use tempfile::TempDir;

/// Writes a deployment whose imputer fills 1.0 and whose scaler is the identity.
fn write_artifacts(dir: &Path, names: &[&str], model_json: &str) {
    fs::write(dir.join("stacking_clf_model.json"), model_json).unwrap();
    fs::write(dir.join("scaler.json"), r#"{"kind": "standard"}"#).unwrap();
    let statistics = vec![1.0; names.len()];
    fs::write(
        dir.join("imputer.json"),
        serde_json::json!({ "strategy": "median", "statistics": statistics }).to_string(),
    )
    .unwrap();
    fs::write(dir.join("descriptor_list.txt"), names.join("\n")).unwrap();
}

fn run(dir: &Path, smiles: &str) -> (Result<stack_tox::Prediction, PipelineError>, String) {
    let pipeline = Pipeline::new(PipelineConfig::default().with_artifact_dir(dir));
    let mut out = Vec::new();
    let result = pipeline.run(smiles, &mut out);
    (result, String::from_utf8(out).unwrap())
}

const LEAF_9_1: &str = r#"{"kind": "decision_tree", "nodes": [{"value": [9, 1]}]}"#;

#[test]
fn ethanol_with_single_leaf_model() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    write_artifacts(dir.path(), &["MolWt", "TPSA", "BalabanJ"], LEAF_9_1);

    let (result, out) = run(dir.path(), "CCO");
    let prediction = result?;
    assert_eq!(prediction.label, ToxicityLabel::NonToxic);
    assert_relative_eq!(prediction.confidence.unwrap(), 0.9);
    assert_eq!(
        out,
        "Loading model and preprocessing pipeline...\n\
         Parsing SMILES...\n\
         Calculating 3 descriptors...\n\
         All descriptors calculated successfully.\n\
         Warning: Molecule is very small (3 atoms). Prediction may be unreliable.\n\
         No missing descriptors, skipping imputation.\n\
         Scaling descriptors...\n"
    );
    assert_eq!(prediction.to_string(), "Prediction: Non-Toxic (Confidence: 0.90)");
    Ok(())
}

#[test]
fn full_registry_with_stacking_model() -> Result<(), Box<dyn Error>> {
    let names: Vec<&str> = descriptor_names().collect();
    let n = names.len();
    let model = serde_json::json!({
        "kind": "stacking",
        "estimators": [
            { "kind": "logistic_regression", "coef": vec![0.01; n], "intercept": -1.0 },
            { "kind": "linear_svc", "coef": vec![-0.02; n], "intercept": 0.5 }
        ],
        "final_estimator": { "kind": "logistic_regression", "coef": [2.0, 0.3], "intercept": -0.5 },
    });
    let dir = TempDir::new()?;
    write_artifacts(dir.path(), &names, &model.to_string());

    // aspirin
    let (first, out) = run(dir.path(), "CC(=O)Oc1ccccc1C(=O)O");
    let first = first?;
    assert!(out.contains(&format!("Calculating {n} descriptors...")));
    assert!(!out.contains("very small"));

    let confidence = first.confidence.unwrap();
    assert!((0.5..=1.0).contains(&confidence));

    let (second, _) = run(dir.path(), "CC(=O)Oc1ccccc1C(=O)O");
    assert_eq!(second?, first);
    Ok(())
}

#[test]
fn toxic_label_for_class_one() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    write_artifacts(
        dir.path(),
        &["fr_halogen"],
        r#"{"kind": "decision_tree", "nodes": [
            {"feature": 0, "threshold": 0.5, "left": 1, "right": 2},
            {"value": [5, 0]},
            {"value": [1, 4]}
        ]}"#,
    );
    let (result, _) = run(dir.path(), "ClC(Cl)(Cl)Cl");
    let prediction = result?;
    assert_eq!(prediction.label, ToxicityLabel::Toxic);
    assert_relative_eq!(prediction.confidence.unwrap(), 0.8);

    let (result, _) = run(dir.path(), "CCCCCCO");
    assert_eq!(result?.label, ToxicityLabel::NonToxic);
    Ok(())
}

#[test]
fn half_missing_imputes_one_more_zero_fills() -> Result<(), Box<dyn Error>> {
    // "Bogus*" names are not descriptors and always come back missing
    let model = r#"{"kind": "logistic_regression", "coef": [0.0, 0.0, 0.0, 0.0], "intercept": 0.0}"#;

    let dir = TempDir::new()?;
    write_artifacts(dir.path(), &["MolWt", "TPSA", "BogusA", "BogusB"], model);
    let (result, out) = run(dir.path(), "c1ccccc1O");
    result?;
    assert!(out.contains("Warning: 2 descriptors could not be calculated: [2, 3]\n"));
    assert!(out.contains("Imputing missing descriptors...\n"));

    let dir = TempDir::new()?;
    write_artifacts(dir.path(), &["MolWt", "BogusA", "BogusB", "BogusC"], model);
    let (result, out) = run(dir.path(), "c1ccccc1O");
    result?;
    assert!(out.contains("Warning: 3 descriptors could not be calculated: [1, 2, 3]\n"));
    assert!(out.contains(
        "More than 50% descriptors missing — setting missing values to 0.\nScaling descriptors...\n"
    ));
    Ok(())
}

#[test]
fn disconnected_molecule_has_missing_balaban() -> Result<(), Box<dyn Error>> {
    let dir = TempDir::new()?;
    write_artifacts(dir.path(), &["BalabanJ", "MolWt", "NumHDonors"], LEAF_9_1);
    let (result, out) = run(dir.path(), "[Na+].[O-]C(=O)C");
    result?;
    assert!(out.contains("Warning: 1 descriptors could not be calculated: [0]\n"));
    assert!(out.contains("Imputing missing descriptors...\n"));
    Ok(())
}

#[test]
fn invalid_smiles_never_touches_artifacts() {
    for bad in ["not a smiles", "", "C1CC", "c1cccc1", "C(C", "[Xx]"] {
        assert!(!is_valid_smiles(bad), "{bad:?} accepted");
        let dir = TempDir::new().unwrap();
        let (result, out) = run(dir.path(), bad);
        assert!(matches!(result, Err(PipelineError::InvalidInput { .. })));
        assert!(out.is_empty());
    }
}

#[test]
fn missing_descriptor_list_names_the_file() {
    let dir = TempDir::new().unwrap();
    write_artifacts(dir.path(), &["MolWt"], LEAF_9_1);
    fs::remove_file(dir.path().join("descriptor_list.txt")).unwrap();

    let (result, _) = run(dir.path(), "CCO");
    match result {
        Err(PipelineError::Artifact(err @ ArtifactError::MissingArtifact { .. })) => {
            assert!(err.to_string().contains("descriptor_list.txt"));
        }
        other => panic!("expected a missing artifact, got {other:?}"),
    }
}

#[test]
fn descriptor_order_follows_request_order() {
    let mol = parse_smiles("CC(=O)Nc1ccc(O)cc1").unwrap();
    let forward: Vec<String> = ["MolWt", "TPSA", "NumHDonors", "fr_amide"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let backward: Vec<String> = forward.iter().rev().cloned().collect();

    let a = calculate_descriptors(&mol, &forward);
    let b = calculate_descriptors(&mol, &backward);
    assert_eq!(a.values.len(), forward.len());
    let reversed: Vec<f64> = b.values.iter().rev().copied().collect();
    assert_eq!(a.values, reversed);
    assert_eq!(a.values[2], 2.0);
    assert_eq!(a.values[3], 1.0);
}
