//! Locating the 7-Zip executable.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::os::OS;

/// Environment variable that points at an explicit archiver binary.
pub const BINARY_ENV: &str = "SEVENZZ_BINARY";

/// Program names looked up on `PATH`, in order of preference.
const PATH_CANDIDATES: [&str; 2] = ["7zz", "7z"];

/// Find the archiver binary.
///
/// Order: `$SEVENZZ_BINARY` (when the file exists), `bin/7zz` next to the
/// running executable, then `7zz` and `7z` on `PATH`.
pub fn find_binary() -> Result<PathBuf> {
    let env_value = std::env::var_os(BINARY_ENV).map(PathBuf::from);
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));
    find_binary_in(env_value, exe_dir.as_deref(), OS::current())
}

fn find_binary_in(env_value: Option<PathBuf>, exe_dir: Option<&Path>, os: OS) -> Result<PathBuf> {
    let mut searched = Vec::new();

    if let Some(path) = env_value {
        if path.is_file() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{BINARY_ENV} does not point at a file, ignoring");
        searched.push(path);
    }

    if let Some(dir) = exe_dir {
        let bundled = dir.join("bin").join(os.executable_name("7zz"));
        if bundled.is_file() {
            return Ok(bundled);
        }
        searched.push(bundled);
    }

    for name in PATH_CANDIDATES {
        match which::which(name) {
            Ok(path) => return Ok(path),
            Err(_) => searched.push(PathBuf::from(name)),
        }
    }

    Err(Error::BinaryNotFound { searched })
}
