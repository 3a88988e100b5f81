//! The external archiver as seen by the rest of the crate.

use std::fmt;
use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use sevenzz_platform::{Command, Result, find_binary};

use crate::config::CompressionConfig;

/// Operations delegated to an external archiver process.
///
/// Errors carry the process diagnostic; see
/// [`sevenzz_platform::Error::diagnostic`].
pub trait Archiver: fmt::Debug {
    /// Full technical listing (`l -slt`).
    fn list_detailed(&self, archive: &Path) -> Result<String>;

    /// Extract all members, or only `members`, below `dest`.
    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        members: Option<&[String]>,
        overwrite: bool,
    ) -> Result<()>;

    /// Contents of a single member.
    fn read_member(&self, archive: &Path, member: &str) -> Result<Vec<u8>>;

    /// Add `sources` to `archive`; relative sources resolve against `cwd`.
    fn add(
        &self,
        archive: &Path,
        sources: &[PathBuf],
        config: &CompressionConfig,
        cwd: Option<&Path>,
    ) -> Result<()>;

    /// Integrity check (`t`).
    fn test(&self, archive: &Path) -> Result<()>;

    /// First line of the archiver banner.
    fn version(&self) -> Result<String>;
}

/// [`Archiver`] backed by a 7-Zip binary.
///
/// The binary is located on first use and remembered.
#[derive(Debug, Default)]
pub struct SevenZip {
    binary: OnceCell<PathBuf>,
}

impl SevenZip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binary(path: impl Into<PathBuf>) -> Self {
        Self {
            binary: OnceCell::with_value(path.into()),
        }
    }

    pub fn binary(&self) -> Result<&Path> {
        self.binary
            .get_or_try_init(find_binary)
            .map(PathBuf::as_path)
    }

    fn command(&self) -> Result<Command> {
        Ok(Command::new(self.binary()?))
    }
}

pub(crate) fn extract_args(
    archive: &Path,
    dest: &Path,
    members: Option<&[String]>,
    overwrite: bool,
) -> Vec<String> {
    let mut args = vec![
        "x".to_string(),
        archive.display().to_string(),
        format!("-o{}", dest.display()),
        "-y".to_string(),
        if overwrite { "-aoa" } else { "-aos" }.to_string(),
    ];
    if let Some(members) = members {
        // Member names are literal paths, not wildcards.
        args.push("-spd".to_string());
        args.push("--".to_string());
        args.extend(members.iter().cloned());
    }
    args
}

pub(crate) fn banner_version(banner: &str) -> Option<&str> {
    banner.lines().map(str::trim).find(|line| !line.is_empty())
}

impl Archiver for SevenZip {
    fn list_detailed(&self, archive: &Path) -> Result<String> {
        let output = self
            .command()?
            .args(["l", "-slt", "-sccUTF-8"])
            .arg(archive)
            .run()?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn extract(
        &self,
        archive: &Path,
        dest: &Path,
        members: Option<&[String]>,
        overwrite: bool,
    ) -> Result<()> {
        self.command()?
            .args(extract_args(archive, dest, members, overwrite))
            .run()?;
        Ok(())
    }

    fn read_member(&self, archive: &Path, member: &str) -> Result<Vec<u8>> {
        let output = self
            .command()?
            .arg("e")
            .arg(archive)
            .args(["-so", "-y", "-spd", "--", member])
            .run()?;
        Ok(output.stdout)
    }

    fn add(
        &self,
        archive: &Path,
        sources: &[PathBuf],
        config: &CompressionConfig,
        cwd: Option<&Path>,
    ) -> Result<()> {
        let mut cmd = self
            .command()?
            .arg("a")
            .arg(archive)
            .args(config.to_args())
            .arg("-y")
            .arg("--")
            .args(sources);
        if let Some(dir) = cwd {
            cmd = cmd.current_dir(dir);
        }
        cmd.run()?;
        Ok(())
    }

    fn test(&self, archive: &Path) -> Result<()> {
        self.command()?.arg("t").arg(archive).run()?;
        Ok(())
    }

    fn version(&self) -> Result<String> {
        // Without arguments the archiver prints its banner and usage.
        let output = self.command()?.capture()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(banner_version(&stdout).unwrap_or_default().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_args_all_members() {
        let args = extract_args(Path::new("a.7z"), Path::new("out"), None, false);
        assert_eq!(args, ["x", "a.7z", "-oout", "-y", "-aos"]);
    }

    #[test]
    fn extract_args_selected_members() {
        let members = vec!["dir/a.txt".to_string(), "-odd".to_string()];
        let args = extract_args(Path::new("a.7z"), Path::new("out"), Some(&members), true);
        assert_eq!(
            args,
            ["x", "a.7z", "-oout", "-y", "-aoa", "-spd", "--", "dir/a.txt", "-odd"]
        );
    }

    #[test]
    fn banner_first_line() {
        let banner = "\n7-Zip (z) 24.08 (x64) : Copyright (c) 1999-2024 Igor Pavlov\n\nUsage: 7zz <command>";
        assert_eq!(
            banner_version(banner),
            Some("7-Zip (z) 24.08 (x64) : Copyright (c) 1999-2024 Igor Pavlov")
        );
        assert_eq!(banner_version("\n\n"), None);
    }

    #[test]
    fn explicit_binary_is_used() {
        let zip = SevenZip::with_binary("/opt/7zz");
        assert_eq!(zip.binary().unwrap(), Path::new("/opt/7zz"));
    }

    #[test]
    fn missing_binary_reports_spawn_failure() {
        let zip = SevenZip::with_binary("/nonexistent/sevenzz-test/7zz");
        let err = zip.test(Path::new("a.7z")).unwrap_err();
        assert!(matches!(err, sevenzz_platform::Error::CommandFailed { .. }));
    }
}
