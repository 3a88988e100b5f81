//! Compression settings rendered as archiver switches.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CompressionLevel {
    Store,
    Fastest,
    Fast,
    #[default]
    Normal,
    Maximum,
    Ultra,
}

impl CompressionLevel {
    pub fn value(self) -> u8 {
        match self {
            Self::Store => 0,
            Self::Fastest => 1,
            Self::Fast => 3,
            Self::Normal => 5,
            Self::Maximum => 7,
            Self::Ultra => 9,
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "store" | "0" => Ok(Self::Store),
            "fastest" | "1" => Ok(Self::Fastest),
            "fast" | "3" => Ok(Self::Fast),
            "normal" | "5" => Ok(Self::Normal),
            "maximum" | "7" => Ok(Self::Maximum),
            "ultra" | "9" => Ok(Self::Ultra),
            other => Err(Error::InvalidInput(format!(
                "unknown compression level '{other}'"
            ))),
        }
    }
}

/// Named bundles of compression settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Preset {
    Fast,
    #[default]
    Balanced,
    Backup,
    Ultra,
    Secure,
    Compatibility,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Self::Fast,
        Self::Balanced,
        Self::Backup,
        Self::Ultra,
        Self::Secure,
        Self::Compatibility,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Backup => "backup",
            Self::Ultra => "ultra",
            Self::Secure => "secure",
            Self::Compatibility => "compatibility",
        }
    }

    pub fn config(self) -> CompressionConfig {
        let base = CompressionConfig::default();
        match self {
            Self::Fast => base.level(CompressionLevel::Fast).threads(0),
            Self::Balanced => base.level(CompressionLevel::Normal),
            Self::Backup => base
                .level(CompressionLevel::Maximum)
                .dictionary_size("64m"),
            Self::Ultra => base
                .level(CompressionLevel::Ultra)
                .method("lzma2")
                .dictionary_size("256m"),
            Self::Secure => base.level(CompressionLevel::Maximum).encrypt_headers(true),
            Self::Compatibility => base
                .level(CompressionLevel::Normal)
                .method("lzma")
                .solid(false),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown preset '{s}'")))
    }
}

/// Settings for the `a` command.
///
/// `threads(0)` lets the archiver pick the thread count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressionConfig {
    pub level: u8,
    pub method: Option<String>,
    pub solid: bool,
    pub threads: Option<u32>,
    pub dictionary_size: Option<String>,
    pub encrypt_headers: bool,
    pub password: Option<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: CompressionLevel::Normal.value(),
            method: None,
            solid: true,
            threads: None,
            dictionary_size: None,
            encrypt_headers: false,
            password: None,
        }
    }
}

impl From<Preset> for CompressionConfig {
    fn from(preset: Preset) -> Self {
        preset.config()
    }
}

impl CompressionConfig {
    pub fn level(mut self, level: CompressionLevel) -> Self {
        self.level = level.value();
        self
    }

    /// Set a raw 0-9 level.
    pub fn raw_level(mut self, level: u8) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidInput(format!(
                "compression level must be 0-9, got {level}"
            )));
        }
        self.level = level;
        Ok(self)
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn solid(mut self, solid: bool) -> Self {
        self.solid = solid;
        self
    }

    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn dictionary_size(mut self, size: impl Into<String>) -> Self {
        self.dictionary_size = Some(size.into());
        self
    }

    pub fn encrypt_headers(mut self, encrypt: bool) -> Self {
        self.encrypt_headers = encrypt;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Render as archiver switches.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![format!("-mx{}", self.level)];
        if let Some(method) = &self.method {
            args.push(format!("-m0={method}"));
        }
        args.push(format!("-ms={}", if self.solid { "on" } else { "off" }));
        match self.threads {
            Some(0) => args.push("-mmt".to_string()),
            Some(n) => args.push(format!("-mmt{n}")),
            None => {}
        }
        if let Some(size) = &self.dictionary_size {
            args.push(format!("-md={size}"));
        }
        if self.encrypt_headers {
            args.push("-mhe=on".to_string());
        }
        if let Some(password) = &self.password {
            args.push(format!("-p{password}"));
        }
        args
    }
}
