//! Operating system detection.

use once_cell::sync::Lazy;

/// Operating system types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OS {
    Windows,
    Macos,
    Linux,
    Unknown,
}

static CURRENT: Lazy<OS> = Lazy::new(|| OS::from_name(std::env::consts::OS));

impl OS {
    /// Map a `std::env::consts::OS` style name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "windows" => OS::Windows,
            "macos" => OS::Macos,
            "linux" | "android" => OS::Linux,
            _ => OS::Unknown,
        }
    }

    /// The host operating system.
    pub fn current() -> Self {
        *CURRENT
    }

    /// Whether the native filesystem rejects names that archives may carry
    /// (reserved device names, `<>:"|?*`, trailing dots).
    pub fn restricts_filenames(self) -> bool {
        matches!(self, OS::Windows)
    }

    /// Executable file name for `program` on this OS.
    pub fn executable_name(self, program: &str) -> String {
        match self {
            OS::Windows => format!("{program}.exe"),
            _ => program.to_string(),
        }
    }
}
