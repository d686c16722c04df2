//! Repodrop Core - Core library for repodrop
//!
//! This crate replaces a deployment directory with the contents of a GitHub
//! repository archive: parse the repository URL, download the ZIP, reset the
//! destination, extract, and copy the archive's root folder into place.

pub mod archive;
pub mod config;
pub mod deploy;
pub mod error;
pub mod fetch;
pub mod fs;
pub mod lock;
pub mod reference;

pub use archive::{ArchiveHandle, ExtractionWorkspace};
pub use config::{CliOverrides, Config};
pub use deploy::{DeployOptions, DeployReport, Deployer};
pub use error::{Error, Result};
pub use fetch::ArchiveFetcher;
pub use fs::CopyStats;
pub use lock::DestinationLock;
pub use reference::RepoReference;
