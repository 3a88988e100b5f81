use std::ffi::OsString;

use clap::{Parser, Subcommand};

use super::info::InfoArg;
use super::version::VersionArg;

/// Anything that is not a sevenzz subcommand is handed to 7-Zip unchanged.
#[derive(Clone, Debug, Parser)]
#[command(name = "sevenzz", version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct App {
    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(name = "version", about = "Show sevenzz and 7-Zip versions")]
    Version(VersionArg),
    #[command(name = "info", about = "Summarize an archive")]
    Info(InfoArg),
    #[command(external_subcommand)]
    External(Vec<OsString>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;

    #[test]
    fn parses_version_json() {
        let app = App::try_parse_from(["sevenzz", "version", "--format", "json"]).unwrap();
        let Some(Commands::Version(args)) = app.cmd else {
            panic!("expected version");
        };
        assert_eq!(args.format, Format::Json);
    }

    #[test]
    fn unknown_commands_pass_through() {
        let app = App::try_parse_from(["sevenzz", "x", "a.7z", "-oout", "-y"]).unwrap();
        let Some(Commands::External(args)) = app.cmd else {
            panic!("expected pass-through");
        };
        assert_eq!(args, ["x", "a.7z", "-oout", "-y"].map(OsString::from));
    }

    #[test]
    fn verbose_flag() {
        let app = App::try_parse_from(["sevenzz", "-v", "info", "a.7z"]).unwrap();
        assert!(app.verbose);
        assert!(matches!(app.cmd, Some(Commands::Info(_))));
    }

    #[test]
    fn no_arguments() {
        let app = App::try_parse_from(["sevenzz"]).unwrap();
        assert!(app.cmd.is_none());
    }
}
