use std::path::PathBuf;

use thiserror::Error;

pub type CocoResult<T> = Result<T, CocoError>;

#[derive(Debug, Error)]
pub enum CocoError {
    #[error("required resource not found: {}", path.display())]
    MissingResource { path: PathBuf },

    #[error("failed reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    MalformedJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} must have columns: {expected}", path.display())]
    MissingColumns { path: PathBuf, expected: String },

    #[error("invalid CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}:{line}: {reason}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("corrupt artifact {}: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    #[error("{} contains no training examples", path.display())]
    EmptyDataset { path: PathBuf },

    #[error("entity pattern {pattern:?} cannot be compiled: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl CocoError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::MissingResource { path }
        } else {
            Self::Io { path, source }
        }
    }

    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::MalformedJson {
            path: path.into(),
            source,
        }
    }

    /// True for missing or unreadable artifacts, rule files and model files.
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::MissingResource { .. }
                | Self::Io { .. }
                | Self::MalformedJson { .. }
                | Self::CorruptArtifact { .. }
        )
    }
}
