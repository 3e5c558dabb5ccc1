use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for the batch editor.
///
/// Per-file variants (`Decode`, `Encode`, `Resize`, `Border`) are logged and skipped by
/// the transform stages. `InvalidConfig` and `ConfigFile` are raised before any
/// stage runs.
#[derive(Error, Debug)]
pub enum EditError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Configuration file error: failed to parse {path:?}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Decode error: cannot read image {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Encode error: cannot write image {path:?}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Resize error: {reason} (file: {path:?})")]
    Resize { path: PathBuf, reason: String },

    #[error("Border error: {reason} (file: {path:?})")]
    Border { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, EditError>;

impl EditError {
    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn file_system(
        path: impl Into<PathBuf>,
        operation: &str,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            path: path.into(),
            operation: operation.to_string(),
            source,
        }
    }

    /// True for errors that only affect a single file and leave the batch intact.
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. }
                | Self::Encode { .. }
                | Self::Resize { .. }
                | Self::Border { .. }
        )
    }
}
