use std::io;
use std::path::PathBuf;

use crate::archive::Mode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot {operation} archive opened in {mode} mode")]
    InvalidMode {
        operation: &'static str,
        mode: Mode,
    },

    #[error("archive not found: {}", .path.display())]
    ArchiveNotFound { path: PathBuf },

    #[error("file not found in archive: {name}")]
    MemberNotFound { name: String },

    #[error("file or directory not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    /// Filenames could not be made to fit the target filesystem.
    #[error("{message}")]
    FilenameCompatibility {
        message: String,
        problematic: Vec<String>,
        sanitized: bool,
    },

    #[error("failed to extract archive: {}", .diagnostic.trim())]
    Extraction {
        diagnostic: String,
        source: sevenzz_platform::Error,
    },

    #[error("failed to {operation}: {}", .diagnostic.trim())]
    Operation {
        operation: &'static str,
        diagnostic: String,
        source: sevenzz_platform::Error,
    },

    #[error("failed to move '{}' to '{}': {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error(transparent)]
    Platform(#[from] sevenzz_platform::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Wrap an archiver failure, keeping the process diagnostic.
    ///
    /// Lookup failures (binary missing, spawn errors) stay as [`Error::Platform`].
    pub(crate) fn operation(operation: &'static str, source: sevenzz_platform::Error) -> Self {
        match source {
            sevenzz_platform::Error::NonZeroExit { .. } => Self::Operation {
                operation,
                diagnostic: source.diagnostic(),
                source,
            },
            other => Self::Platform(other),
        }
    }

    pub fn is_filename_compatibility(&self) -> bool {
        matches!(self, Self::FilenameCompatibility { .. })
    }

    /// Names that could not be extracted as-is, if this is a compatibility error.
    pub fn problematic_names(&self) -> &[String] {
        match self {
            Self::FilenameCompatibility { problematic, .. } => problematic,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
