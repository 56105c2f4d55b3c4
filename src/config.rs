//! Where the pipeline finds its artifacts.
//!
//! All four artifacts live in one directory, the current working directory
//! unless `STACK_TOX_ARTIFACT_DIR` says otherwise.

use std::path::{Path, PathBuf};

/// Environment variable overriding the artifact directory.
pub const ARTIFACT_DIR_ENV: &str = "STACK_TOX_ARTIFACT_DIR";

/// Artifact locations for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Directory holding the artifacts.
    pub artifact_dir: PathBuf,
    /// Serialized classifier.
    pub model_file: String,
    /// Fitted scaler.
    pub scaler_file: String,
    /// Fitted imputer.
    pub imputer_file: String,
    /// Descriptor names, one per line.
    pub descriptor_list_file: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            artifact_dir: PathBuf::from("."),
            model_file: "stacking_clf_model.json".to_string(),
            scaler_file: "scaler.json".to_string(),
            imputer_file: "imputer.json".to_string(),
            descriptor_list_file: "descriptor_list.txt".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Defaults, with the directory taken from `STACK_TOX_ARTIFACT_DIR` when
    /// it is set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var(ARTIFACT_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self::default().with_artifact_dir(dir),
            _ => Self::default(),
        }
    }

    /// Same file names, different directory.
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    /// Full path of a file inside the artifact directory.
    pub fn path_of(&self, file: &str) -> PathBuf {
        self.artifact_dir.join(file)
    }

    /// The artifact directory.
    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_working_directory() {
        let config = PipelineConfig::default();
        assert_eq!(config.artifact_dir(), Path::new("."));
        assert_eq!(
            config.path_of(&config.descriptor_list_file),
            Path::new("./descriptor_list.txt")
        );
    }

    #[test]
    fn artifact_dir_can_be_replaced() {
        let config = PipelineConfig::default().with_artifact_dir("/opt/models");
        assert_eq!(
            config.path_of(&config.model_file),
            Path::new("/opt/models/stacking_clf_model.json")
        );
        assert_eq!(config.scaler_file, "scaler.json");
    }
}
