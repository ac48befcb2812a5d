use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why a single manifest line was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("expected `<path>\\t<yyyyMMddHHmmss>`, found {fields} tab-separated field(s): {line:?}")]
    FieldCount { fields: usize, line: String },

    #[error("path is empty")]
    EmptyPath,

    #[error("timestamp is empty")]
    EmptyTimestamp,

    #[error("timestamp must be 14 digits (yyyyMMddHHmmss), got length {len}: {value:?}")]
    TimestampLength { len: usize, value: String },

    #[error("timestamp must contain only digits (yyyyMMddHHmmss): {value:?}")]
    TimestampDigits { value: String },
}

#[derive(Error, Debug)]
pub enum MtimeError {
    #[error("invalid path {}: {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("manifest line {line}: {source}")]
    Format {
        line: usize,
        #[source]
        source: LineError,
    },

    #[error("manifest line {line}: {value:?} is not a valid local date-time")]
    TimestampParse { line: usize, value: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl MtimeError {
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        MtimeError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn invalid_path(path: &Path, reason: impl Into<String>) -> Self {
        MtimeError::InvalidPath {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Line number of the offending manifest line, if any
    #[cfg(test)]
    pub(crate) fn line(&self) -> Option<usize> {
        match self {
            MtimeError::Format { line, .. } | MtimeError::TimestampParse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MtimeError>;
