use anyhow::Context;
use serde::Serialize;
use sevenzz_archive::{Archiver, SevenZip};

use super::Format;

#[derive(Clone, Debug, clap::Args)]
pub struct VersionArg {
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Debug, Serialize)]
struct VersionInfo {
    sevenzz: &'static str,
    archiver: String,
    binary: String,
}

impl VersionArg {
    pub fn run(self) -> anyhow::Result<()> {
        let zip = SevenZip::new();
        let binary = zip.binary().context("failed to locate 7-Zip")?.display().to_string();
        let archiver = zip.version().context("failed to query 7-Zip version")?;
        let info = VersionInfo {
            sevenzz: env!("CARGO_PKG_VERSION"),
            archiver,
            binary,
        };

        match self.format {
            Format::Text => {
                println!("sevenzz {}", info.sevenzz);
                println!("{}", info.archiver);
                println!("binary: {}", info.binary);
            }
            Format::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        }
        Ok(())
    }
}
