use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("7zz binary not found (searched: {})", display_paths(.searched))]
    BinaryNotFound { searched: Vec<PathBuf> },

    #[error("command failed: {cmd}, source: {source}")]
    CommandFailed { cmd: String, source: std::io::Error },

    #[error("command `{cmd}` exited with {}: {}", display_code(.code), .stderr.trim())]
    NonZeroExit {
        cmd: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Diagnostic text emitted by the failed process.
    ///
    /// 7-Zip reports some failures on stdout only, so stdout is used when
    /// stderr is blank.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::NonZeroExit { stdout, stderr, .. } => {
                if stderr.trim().is_empty() {
                    stdout.clone()
                } else {
                    stderr.clone()
                }
            }
            Self::CommandFailed { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
