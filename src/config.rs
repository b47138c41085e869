use crate::errors::{AppError, AppResult};
use crate::snapshot::DEFAULT_SOURCE_TAG;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    /// When set, logs go to a daily rolling file here instead of stderr.
    pub directory: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Provenance tag written to `portfolio.source`.
    pub source_tag: String,
    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_yaml(text: &str) -> AppResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        if config.source_tag.trim().is_empty() {
            return Err(AppError::Config("source_tag must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|error| {
            AppError::Config(format!("failed reading {}: {}", path.to_string_lossy(), error))
        })?;
        Self::from_yaml(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineConfig;
    use crate::errors::AppError;
    use std::path::PathBuf;

    #[test]
    fn empty_document_uses_defaults() {
        let config = PipelineConfig::from_yaml("").expect("config");
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.source_tag, "csv_transform");
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = PipelineConfig::from_yaml("logging:\n  directory: /var/log/pulse\n  json: true\n")
            .expect("config");
        assert_eq!(config.source_tag, "csv_transform");
        assert_eq!(config.logging.directory, Some(PathBuf::from("/var/log/pulse")));
        assert!(config.logging.json);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn rejects_blank_source_tag_and_bad_yaml() {
        assert!(matches!(
            PipelineConfig::from_yaml("source_tag: \"  \"\n"),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_yaml("logging: [unclosed\n"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = PipelineConfig::load(Some(&dir.path().join("absent.yaml")));
        assert!(matches!(result, Err(AppError::Config(_))));
        assert_eq!(PipelineConfig::load(None).expect("defaults"), PipelineConfig::default());
    }
}
