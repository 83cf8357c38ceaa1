use std::fmt;

/// Failure loading a table or opening/writing an archive.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// No parser accepted the table bytes. Carries the last parser message.
    InvalidInput(String),
    /// The table parsed but lacks required columns.
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },
    /// The archive container could not be opened or an entry could not be read.
    InvalidArchive(String),
    /// Building the output archive failed.
    ArchiveWrite(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "cannot read table: {msg}"),
            Self::MissingColumns { missing, available } => write!(
                f,
                "missing column(s): {} (available: {})",
                missing.join(", "),
                available.join(", ")
            ),
            Self::InvalidArchive(msg) => write!(f, "cannot read archive: {msg}"),
            Self::ArchiveWrite(msg) => write!(f, "cannot write archive: {msg}"),
        }
    }
}

impl std::error::Error for LoadError {}
