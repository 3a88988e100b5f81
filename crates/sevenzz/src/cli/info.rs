use std::path::PathBuf;

use anyhow::Context;
use sevenzz_archive::simple::get_archive_info;

use super::Format;

#[derive(Clone, Debug, clap::Args)]
pub struct InfoArg {
    pub archive: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

impl InfoArg {
    pub fn run(self) -> anyhow::Result<()> {
        let info = get_archive_info(&self.archive)
            .with_context(|| format!("failed to read {}", self.archive.display()))?;

        match self.format {
            Format::Json => println!("{}", serde_json::to_string_pretty(&info)?),
            Format::Text => {
                let s = &info.summary;
                println!("{}", info.path.display());
                println!("  size:        {} bytes", info.archive_size);
                println!(
                    "  entries:     {} ({} files, {} dirs, {} links)",
                    s.total_entry_count, s.file_count, s.directory_count, s.symlink_count
                );
                println!("  unpacked:    {} bytes", s.total_uncompressed_size);
                println!("  packed:      {} bytes", s.total_compressed_size);
                println!("  ratio:       {:.1}%", s.compression_percentage());
                println!("  method:      {}", s.dominant_method);
                println!("  solid:       {}", s.solid);
                println!("  encrypted:   {}", s.encrypted);
            }
        }
        Ok(())
    }
}
