//! Platform plumbing for driving an external 7-Zip binary.
//!
//! - `os` - host operating system detection
//! - `binary` - locating the archiver executable
//! - `command` - subprocess wrapper with exit-status mapping

pub use binary::{BINARY_ENV, find_binary};
pub use command::Command;
pub use error::{Error, Result};
pub use os::OS;

pub mod binary;
pub mod command;
mod error;
pub mod os;
