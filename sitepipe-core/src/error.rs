//! Error types for sitepipe-core.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which file operation a [`PipelineError::FileActionFailed`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    Open,
    CreateTruncate,
    DecodeYaml,
    Close,
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileAction::Open => "OPEN",
            FileAction::CreateTruncate => "CREATE_TRUNCATE",
            FileAction::DecodeYaml => "DECODE_YAML",
            FileAction::Close => "CLOSE",
        };
        f.write_str(s)
    }
}

/// Every failure a pipeline step can record.
///
/// Steps never return these directly; they are appended to the error list
/// shared by a pipeline and its clones, and surfaced by
/// [`Pipeline::check`](crate::Pipeline::check).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The parent directory of a render target could not be created.
    #[error("failed to create target directory {path}: {source}")]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening, creating, decoding or closing a file failed.
    #[error("failed to {action} file {path}: {source}")]
    FileActionFailed {
        action: FileAction,
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Tera failed while executing a template.
    #[error("failed to execute template {template_name}: {source}")]
    TemplateExecuteFailed {
        template_name: String,
        #[source]
        source: tera::Error,
    },

    /// The glob pattern could not be parsed or walked.
    #[error("invalid template glob {pattern}: {reason}")]
    TemplateGlobInvalid { pattern: String, reason: String },

    /// The glob pattern matched no files.
    #[error("template glob {pattern} matched no files")]
    TemplateGlobEmpty { pattern: String },

    /// Tera rejected one of the matched template sources.
    #[error("failed to parse templates from {pattern}: {source}")]
    TemplateParseFailed {
        pattern: String,
        #[source]
        source: tera::Error,
    },

    /// The data mapping could not be turned into a render context.
    #[error("failed to build render context: {0}")]
    ContextFailed(#[source] tera::Error),

    /// The repeated-data key is absent or does not hold a mapping.
    #[error("repeated data key {key} not found in data, must be a mapping")]
    RepeatedDataKeyMissing { key: String },

    /// The repeated-render target path lacks the `{{KEY}}` marker.
    #[error("{{{{KEY}}}} placeholder missing in target path template {path}")]
    PathPlaceholderMissing { path: String },

    /// A data transform returned an error.
    #[error("failed to transform data: {source}")]
    TransformFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    pub(crate) fn file(
        action: FileAction,
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        PipelineError::FileActionFailed {
            action,
            path: path.into(),
            source: source.into(),
        }
    }

    /// The [`FileAction`] tag, for file errors only.
    pub fn file_action(&self) -> Option<FileAction> {
        match self {
            PipelineError::FileActionFailed { action, .. } => Some(*action),
            _ => None,
        }
    }
}

/// Returned by the checkpoint when a pipeline cannot be considered successful.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("checkpoint reached without a pipeline")]
    Absent,

    #[error("checkpoint reached with {count} error(s): {}", .messages.join("; "))]
    Failed { count: usize, messages: Vec<String> },
}

/// Errors loading a [`PipelineConfig`](crate::PipelineConfig) from disk.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_action_displays_upper_snake_tags() {
        assert_eq!(FileAction::Open.to_string(), "OPEN");
        assert_eq!(FileAction::CreateTruncate.to_string(), "CREATE_TRUNCATE");
        assert_eq!(FileAction::DecodeYaml.to_string(), "DECODE_YAML");
        assert_eq!(FileAction::Close.to_string(), "CLOSE");
    }

    #[test]
    fn file_error_message_names_action_and_path() {
        let err = PipelineError::file(
            FileAction::Open,
            "/data/posts.yaml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("OPEN"), "got: {msg}");
        assert!(msg.contains("/data/posts.yaml"), "got: {msg}");
        assert_eq!(err.file_action(), Some(FileAction::Open));
    }

    #[test]
    fn placeholder_message_contains_literal_marker() {
        let err = PipelineError::PathPlaceholderMissing {
            path: "out/post.html".to_string(),
        };
        assert!(err.to_string().starts_with("{{KEY}} placeholder missing"));
    }

    #[test]
    fn checkpoint_failure_lists_every_message() {
        let err = CheckpointError::Failed {
            count: 2,
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "checkpoint reached with 2 error(s): first; second");
    }
}
