#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sevenzz_archive::{Archiver, CompressionConfig};

type PlatformResult<T> = sevenzz_platform::Result<T>;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    List(PathBuf),
    Extract {
        dest: PathBuf,
        members: Option<Vec<String>>,
        overwrite: bool,
    },
    Read(String),
    Add {
        archive: PathBuf,
        sources: Vec<PathBuf>,
        cwd: Option<PathBuf>,
    },
    Test,
}

/// Scripted stand-in for the 7-Zip binary.
///
/// Members ending in `/` are directories. Extract calls consume
/// `extract_failures` front to back; once empty, extraction succeeds and
/// writes the members below the destination.
#[derive(Debug, Default)]
pub struct FakeArchiver {
    pub members: Vec<(String, Vec<u8>)>,
    pub listing: Option<String>,
    pub extract_failures: RefCell<VecDeque<String>>,
    pub list_failure: Option<String>,
    pub read_failures: HashSet<String>,
    pub test_failure: Option<String>,
    pub calls: Rc<RefCell<Vec<Call>>>,
    /// Contents of staged files seen by `add`, keyed by source name.
    pub added: Rc<RefCell<Vec<(String, Vec<u8>)>>>,
}

pub fn failure(diagnostic: &str) -> sevenzz_platform::Error {
    sevenzz_platform::Error::NonZeroExit {
        cmd: "7zz".into(),
        code: Some(2),
        stdout: String::new(),
        stderr: diagnostic.into(),
    }
}

impl FakeArchiver {
    pub fn with_members<I, N, D>(members: I) -> Self
    where
        I: IntoIterator<Item = (N, D)>,
        N: Into<String>,
        D: Into<Vec<u8>>,
    {
        Self {
            members: members
                .into_iter()
                .map(|(n, d)| (n.into(), d.into()))
                .collect(),
            ..Self::default()
        }
    }

    pub fn fail_extract(self, diagnostic: &str) -> Self {
        self.extract_failures
            .borrow_mut()
            .push_back(diagnostic.to_string());
        self
    }

    pub fn fail_read(mut self, member: &str) -> Self {
        self.read_failures.insert(member.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn extract_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Extract { .. }))
            .collect()
    }

    pub fn render_listing(&self) -> String {
        let mut out = String::from("7-Zip (z) 24.08 (x64)\n\n--\nPath = fake.7z\nType = 7z\n\n");
        for (name, data) in &self.members {
            let is_dir = name.ends_with('/');
            out.push_str("----------\n");
            out.push_str(&format!("Path = {}\n", name.trim_end_matches('/')));
            out.push_str(&format!("Size = {}\n", data.len()));
            out.push_str(&format!("Packed Size = {}\n", data.len() / 2));
            out.push_str("Modified = 2024-01-15 10:30:45\n");
            out.push_str(&format!("Attributes = {}\n", if is_dir { "D" } else { "A" }));
            out.push_str(if is_dir { "Method = \n" } else { "Method = LZMA2:19\n" });
            out.push('\n');
        }
        out
    }

    fn member_selected(name: &str, members: Option<&[String]>) -> bool {
        let bare = name.trim_end_matches('/');
        members.is_none_or(|m| m.iter().any(|s| s == bare || s == name))
    }
}

impl Archiver for FakeArchiver {
    fn list_detailed(&self, archive: &Path) -> PlatformResult<String> {
        self.calls.borrow_mut().push(Call::List(archive.to_path_buf()));
        if let Some(diagnostic) = &self.list_failure {
            return Err(failure(diagnostic));
        }
        Ok(self
            .listing
            .clone()
            .unwrap_or_else(|| self.render_listing()))
    }

    fn extract(
        &self,
        _archive: &Path,
        dest: &Path,
        members: Option<&[String]>,
        overwrite: bool,
    ) -> PlatformResult<()> {
        self.calls.borrow_mut().push(Call::Extract {
            dest: dest.to_path_buf(),
            members: members.map(<[String]>::to_vec),
            overwrite,
        });
        if let Some(diagnostic) = self.extract_failures.borrow_mut().pop_front() {
            return Err(failure(&diagnostic));
        }
        for (name, data) in &self.members {
            if !Self::member_selected(name, members) {
                continue;
            }
            let path = dest.join(name.trim_end_matches('/'));
            if name.ends_with('/') {
                fs::create_dir_all(&path)?;
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            if overwrite || !path.exists() {
                fs::write(&path, data)?;
            }
        }
        Ok(())
    }

    fn read_member(&self, _archive: &Path, member: &str) -> PlatformResult<Vec<u8>> {
        self.calls.borrow_mut().push(Call::Read(member.to_string()));
        if self.read_failures.contains(member) {
            return Err(failure(&format!("ERROR: Cannot open {member}")));
        }
        self.members
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| failure("No files to process"))
    }

    fn add(
        &self,
        archive: &Path,
        sources: &[PathBuf],
        _config: &CompressionConfig,
        cwd: Option<&Path>,
    ) -> PlatformResult<()> {
        self.calls.borrow_mut().push(Call::Add {
            archive: archive.to_path_buf(),
            sources: sources.to_vec(),
            cwd: cwd.map(Path::to_path_buf),
        });
        for source in sources {
            let path = cwd.map_or_else(|| source.clone(), |dir| dir.join(source));
            if path.is_file() {
                self.added
                    .borrow_mut()
                    .push((source.to_string_lossy().into_owned(), fs::read(&path)?));
            }
        }
        Ok(())
    }

    fn test(&self, _archive: &Path) -> PlatformResult<()> {
        self.calls.borrow_mut().push(Call::Test);
        match &self.test_failure {
            Some(diagnostic) => Err(sevenzz_platform::Error::NonZeroExit {
                cmd: "7zz t".into(),
                code: Some(2),
                stdout: diagnostic.clone(),
                stderr: String::new(),
            }),
            None => Ok(()),
        }
    }

    fn version(&self) -> PlatformResult<String> {
        Ok("7-Zip (z) 24.08 (x64)".to_string())
    }
}
