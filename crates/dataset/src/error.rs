//! Dataset Error Types

use std::path::PathBuf;
use thiserror::Error;

/// What went wrong on a malformed exposition line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("input is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid metric name")]
    InvalidMetricName,

    #[error("invalid label name")]
    InvalidLabelName,

    #[error("expected '{0}'")]
    Expected(char),

    #[error("unterminated label value")]
    UnterminatedValue,

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    #[error("duplicate label name {0:?}")]
    DuplicateLabel(String),

    #[error("missing sample value")]
    MissingValue,
}

/// Malformed exposition input, with the 1-based line it occurred on
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// Errors while serving label sets from the dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset file could not be opened
    #[error("Failed to open dataset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading more lines from the source failed
    #[error("Dataset read error: {0}")]
    Read(#[from] std::io::Error),

    /// Source ran out before the requested range could be served
    #[error("Dataset exhausted: requested up to index {requested}, only {available} label sets available")]
    Exhausted { requested: usize, available: usize },

    /// `from` past `to`
    #[error("Invalid dataset range [{from}, {to})")]
    InvalidRange { from: usize, to: usize },

    #[error("Dataset parse error: {0}")]
    Parse(#[from] ParseError),

    /// An earlier read or parse failure left the source out of step with
    /// the cache
    #[error("Dataset unusable after an earlier read or parse failure")]
    Unusable,

    #[error("Dataset lock poisoned")]
    LockPoisoned,
}
