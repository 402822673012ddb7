//! Pipeline configuration — root directories and output extension.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Directories a pipeline resolves relative paths against.
///
/// Paths are joined as-is; there is no traversal check or sandboxing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root for [`Pipeline::load_glob`](crate::Pipeline::load_glob) patterns.
    pub templates_dir: PathBuf,
    /// Root for [`Pipeline::set_data_yaml`](crate::Pipeline::set_data_yaml) paths.
    pub data_dir: PathBuf,
    /// Root for every render target.
    pub output_dir: PathBuf,
    /// Default output suffix. Informational only.
    pub extension: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            templates_dir: PathBuf::from("templates"),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            extension: ".html".to_string(),
        }
    }
}

impl PipelineConfig {
    /// All three directories under a single `root`.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        PipelineConfig::default().resolve_against(root)
    }

    /// Load a config from a YAML file. Missing fields take their defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Prefix every relative directory with `root`; absolute ones are kept.
    pub fn resolve_against(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        for dir in [
            &mut self.templates_dir,
            &mut self.data_dir,
            &mut self.output_dir,
        ] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_use_conventional_directories() {
        let config = PipelineConfig::default();
        assert_eq!(config.templates_dir, PathBuf::from("templates"));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.extension, ".html");
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.yaml");
        std::fs::write(&path, "output_dir: public\n").unwrap();

        let config = PipelineConfig::from_yaml_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("public"));
        assert_eq!(config.templates_dir, PathBuf::from("templates"));
    }

    #[test]
    fn missing_file_is_io_error_with_path() {
        let tmp = TempDir::new().unwrap();
        let err = PipelineConfig::from_yaml_file(tmp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("nope.yaml"));
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.yaml");
        std::fs::write(&path, "output_dir: [unclosed\n").unwrap();
        let err = PipelineConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn misspelled_key_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.yaml");
        std::fs::write(&path, "outptu_dir: public\n").unwrap();
        let err = PipelineConfig::from_yaml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    }

    #[test]
    fn resolve_against_keeps_absolute_directories() {
        let config = PipelineConfig {
            output_dir: PathBuf::from("/srv/www"),
            ..PipelineConfig::default()
        }
        .resolve_against("/site");
        assert_eq!(config.templates_dir, PathBuf::from("/site/templates"));
        assert_eq!(config.data_dir, PathBuf::from("/site/data"));
        assert_eq!(config.output_dir, PathBuf::from("/srv/www"));
    }
}
