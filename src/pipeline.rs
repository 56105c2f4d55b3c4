//! The five-stage classification pipeline.
//!
//! `validate → load artifacts → compute descriptors → preprocess → predict`,
//! strictly in that order. Any failing stage aborts the run; only the
//! missing-descriptor and small-molecule warnings are non-fatal. Progress
//! lines go to the caller's writer, diagnostics to `tracing`.

use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, info_span};

use crate::artifacts::{load_pipeline, ArtifactBundle, ArtifactError};
use crate::config::PipelineConfig;
use crate::descriptors::{calculate_descriptors_verbose, DescriptorError};
use crate::models::{predict_toxicity, ModelError, Prediction};
use crate::preprocess::{preprocess_descriptors, PreprocessError};
use crate::smiles::is_valid_smiles;

/// Any failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input is not a valid SMILES string. Nothing else was attempted.
    #[error("Invalid SMILES notation.")]
    InvalidInput {
        /// The rejected input.
        smiles: String,
    },

    /// An artifact could not be loaded.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Descriptor calculation failed.
    #[error("descriptor calculation failed")]
    Descriptor(#[from] DescriptorError),

    /// Imputation or scaling failed.
    #[error("preprocessing failed")]
    Preprocess(#[from] PreprocessError),

    /// The classifier could not evaluate the features.
    #[error("prediction failed")]
    Model(#[from] ModelError),

    /// Progress output could not be written.
    #[error("failed to write progress output")]
    Output(#[from] io::Error),
}

/// A configured pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Pipeline reading artifacts as described by `config`.
    pub fn new(config: PipelineConfig) -> Self {
        Pipeline { config }
    }

    /// Artifact locations.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify `smiles`, writing progress lines to `out`.
    ///
    /// The input is validated before any artifact is touched.
    pub fn run<W: Write>(&self, smiles: &str, out: &mut W) -> Result<Prediction, PipelineError> {
        let _span = info_span!("run", smiles).entered();

        if !is_valid_smiles(smiles) {
            debug!("input rejected by validator");
            return Err(PipelineError::InvalidInput {
                smiles: smiles.to_string(),
            });
        }

        writeln!(out, "Loading model and preprocessing pipeline...")?;
        let bundle = load_pipeline(&self.config)?;
        classify(&bundle, smiles, out)
    }
}

/// Run the descriptor, preprocessing and prediction stages against an
/// already loaded bundle.
pub fn classify<W: Write>(
    bundle: &ArtifactBundle,
    smiles: &str,
    out: &mut W,
) -> Result<Prediction, PipelineError> {
    let report = calculate_descriptors_verbose(smiles, &bundle.descriptor_names, out)?;
    let features = preprocess_descriptors(
        &report.values,
        &report.missing,
        &bundle.imputer,
        &bundle.scaler,
        out,
    )?;
    let prediction = predict_toxicity(&features, &bundle.classifier)?;
    debug!(label = %prediction.label, confidence = ?prediction.confidence, "prediction");
    Ok(prediction)
}
