use std::ffi::OsString;

use anyhow::Context;
use sevenzz_platform::{Command, find_binary};

/// Run the archiver with `args` and return its exit code.
pub fn run(args: &[OsString]) -> anyhow::Result<i32> {
    let binary = find_binary().context("failed to locate 7-Zip")?;
    tracing::debug!(binary = %binary.display(), ?args, "passing through");
    let status = Command::new(&binary).args(args).status()?;
    // Killed by a signal: report a generic failure.
    Ok(status.code().unwrap_or(1))
}
