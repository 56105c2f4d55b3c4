//! Loading the pre-trained pipeline from disk.
//!
//! Four files make up a deployment: the classifier, the scaler and the
//! imputer (JSON documents) plus the plain-text descriptor list. They are
//! read once into an immutable [`ArtifactBundle`] which the later stages
//! borrow.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::models::{Classifier, ModelError, ModelSpec};
use crate::preprocess::{Imputer, Scaler};

/// The four parts of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Trained classifier.
    Classifier,
    /// Fitted scaler.
    Scaler,
    /// Fitted imputer.
    Imputer,
    /// Ordered descriptor names.
    DescriptorList,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Component::Classifier => "classifier",
            Component::Scaler => "scaler",
            Component::Imputer => "imputer",
            Component::DescriptorList => "descriptor list",
        })
    }
}

/// Errors raised while loading artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// An artifact file does not exist.
    #[error("Pipeline component missing: {component} ({path})")]
    MissingArtifact {
        /// Which artifact.
        component: Component,
        /// Where it was expected.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// An artifact file exists but could not be read.
    #[error("failed to read {component} from {path}")]
    Io {
        /// Which artifact.
        component: Component,
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// An artifact document could not be decoded.
    #[error("malformed {component} artifact at {path}")]
    MalformedArtifact {
        /// Which artifact.
        component: Component,
        /// File that failed.
        path: PathBuf,
        /// Decoder diagnosis.
        #[source]
        source: serde_json::Error,
    },

    /// The classifier document decoded but is inconsistent.
    #[error("invalid classifier at {path}")]
    InvalidClassifier {
        /// File that failed.
        path: PathBuf,
        /// Model diagnosis.
        #[source]
        source: ModelError,
    },

    /// The descriptor list names no descriptors.
    #[error("descriptor list at {0} is empty")]
    EmptyDescriptorList(PathBuf),
}

/// Everything the pipeline needs after validation, loaded once.
#[derive(Debug)]
pub struct ArtifactBundle {
    /// Compiled classifier.
    pub classifier: Classifier,
    /// Fitted scaler.
    pub scaler: Scaler,
    /// Fitted imputer.
    pub imputer: Imputer,
    /// Descriptor names in feature order.
    pub descriptor_names: Vec<String>,
}

/// Load every artifact named by `config`, classifier first.
///
/// # Errors
///
/// The first artifact that is absent, unreadable or malformed aborts the
/// load. Dimensions are not cross-checked here.
pub fn load_pipeline(config: &PipelineConfig) -> Result<ArtifactBundle, ArtifactError> {
    let model_path = config.path_of(&config.model_file);
    let spec: ModelSpec = read_json(Component::Classifier, &model_path)?;
    let classifier = Classifier::from_spec(spec).map_err(|source| ArtifactError::InvalidClassifier {
        path: model_path.clone(),
        source,
    })?;

    let scaler = read_json(Component::Scaler, &config.path_of(&config.scaler_file))?;
    let imputer = read_json(Component::Imputer, &config.path_of(&config.imputer_file))?;
    let descriptor_names =
        read_descriptor_list(&config.path_of(&config.descriptor_list_file))?;

    debug!(
        dir = %config.artifact_dir().display(),
        descriptors = descriptor_names.len(),
        probabilistic = classifier.is_probabilistic(),
        "artifacts loaded"
    );
    Ok(ArtifactBundle {
        classifier,
        scaler,
        imputer,
        descriptor_names,
    })
}

/// Read one descriptor name per line, trimmed; blank lines are skipped.
pub fn read_descriptor_list(path: &Path) -> Result<Vec<String>, ArtifactError> {
    let text = read_text(Component::DescriptorList, path)?;
    let names = parse_descriptor_list(&text);
    if names.is_empty() {
        return Err(ArtifactError::EmptyDescriptorList(path.to_path_buf()));
    }
    Ok(names)
}

fn parse_descriptor_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_text(component: Component, path: &Path) -> Result<String, ArtifactError> {
    fs::read_to_string(path).map_err(|source| {
        let path = path.to_path_buf();
        if source.kind() == io::ErrorKind::NotFound {
            ArtifactError::MissingArtifact {
                component,
                path,
                source,
            }
        } else {
            ArtifactError::Io {
                component,
                path,
                source,
            }
        }
    })
}

fn read_json<T: DeserializeOwned>(component: Component, path: &Path) -> Result<T, ArtifactError> {
    let text = read_text(component, path)?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::MalformedArtifact {
        component,
        path: path.to_path_buf(),
        source,
    })
}
