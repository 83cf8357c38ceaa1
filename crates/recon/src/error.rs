use std::fmt;

use pogkit_io::LoadError;

use crate::issue::IssueKind;

/// Fatal failure of an operation. Per-row and per-document problems are
/// recorded as issues instead and never surface here.
#[derive(Debug)]
pub enum ReconError {
    /// An input table could not be read or lacks required columns.
    Table { table: &'static str, source: LoadError },
    /// The input archive could not be opened, or the output could not be built.
    Archive(LoadError),
    /// A scalar operation parameter is blank or unusable.
    InvalidParameter { name: &'static str, reason: String },
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (blank locale, bad directory name).
    ConfigValidation(String),
}

impl ReconError {
    /// Issue kind recorded when this error aborts an operation.
    pub fn issue_kind(&self) -> IssueKind {
        match self {
            Self::Table { source: LoadError::MissingColumns { .. }, .. } => IssueKind::MissingField,
            Self::Table { .. } => IssueKind::InvalidJson,
            Self::Archive(_) => IssueKind::InvalidArchive,
            Self::InvalidParameter { .. } => IssueKind::EmptyId,
            Self::ConfigParse(_) | Self::ConfigValidation(_) => IssueKind::InvalidJson,
        }
    }
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table { table, source } => write!(f, "{table}: {source}"),
            Self::Archive(source) => write!(f, "{source}"),
            Self::InvalidParameter { name, reason } => write!(f, "parameter '{name}': {reason}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Table { source, .. } => Some(source),
            Self::Archive(source) => Some(source),
            _ => None,
        }
    }
}
