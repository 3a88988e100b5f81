pub mod app;
pub mod info;
pub mod passthrough;
pub mod version;

/// Output format shared by the inspection commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}
