//! The deploy operation: download, reset, extract, copy, clean up
//!
//! Steps run strictly in order and the first failure aborts the deploy.
//! The destination is reset before the archive is opened, so a corrupt or
//! empty archive leaves an emptied destination behind. Callers that may run
//! deploys concurrently must serialize them with
//! [`DestinationLock`](crate::DestinationLock).

use std::path::{Path, PathBuf};

use tracing::info;
use url::Url;

use crate::archive::{ArchiveHandle, ExtractionWorkspace};
use crate::fetch::ArchiveFetcher;
use crate::fs::{copy_tree, reset_destination, CopyStats};
use crate::reference::{RepoReference, DEFAULT_BRANCH, DEFAULT_GITHUB_URL};
use crate::{Config, Result};

/// Options controlling a [`Deployer`]
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Base URL archives are fetched from
    pub github_url: Url,
    /// Branch used when the reference names none
    pub default_branch: String,
    /// Directory for temporary files, platform default when `None`
    pub temp_dir: Option<PathBuf>,
}

impl DeployOptions {
    /// Build options from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            github_url: config.github_url()?,
            default_branch: config.deploy.default_branch.clone(),
            temp_dir: config.deploy.temp_dir.clone(),
        })
    }
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            github_url: Url::parse(DEFAULT_GITHUB_URL).expect("default GitHub URL is valid"),
            default_branch: DEFAULT_BRANCH.to_string(),
            temp_dir: None,
        }
    }
}

/// Summary of a successful deploy
#[derive(Debug, Clone)]
pub struct DeployReport {
    /// The parsed reference that was deployed
    pub reference: RepoReference,
    /// URL the archive was downloaded from
    pub archive_url: Url,
    /// Size of the downloaded archive in bytes
    pub archive_bytes: u64,
    /// Directory the contents were deployed to
    pub destination: PathBuf,
    /// What was copied into the destination
    pub copied: CopyStats,
}

/// Replaces a destination directory with a GitHub repository archive
#[derive(Debug)]
pub struct Deployer<F> {
    fetcher: F,
    options: DeployOptions,
}

impl<F: ArchiveFetcher> Deployer<F> {
    /// Create a deployer with default options
    pub fn new(fetcher: F) -> Self {
        Self::with_options(fetcher, DeployOptions::default())
    }

    /// Create a deployer with explicit options
    pub fn with_options(fetcher: F, options: DeployOptions) -> Self {
        Self { fetcher, options }
    }

    /// Get the deployer options
    pub fn options(&self) -> &DeployOptions {
        &self.options
    }

    /// Parse a reference string using the configured default branch
    pub fn resolve(&self, input: &str) -> Result<(RepoReference, Url)> {
        let reference = RepoReference::parse_with_default(input, &self.options.default_branch)?;
        let archive_url = reference.archive_url(&self.options.github_url)?;
        Ok((reference, archive_url))
    }

    /// Deploy the repository named by `input` into `dest`
    ///
    /// `dest` is deleted and recreated. Temporary files are removed on
    /// every exit path.
    pub async fn deploy(&self, input: &str, dest: &Path) -> Result<DeployReport> {
        let (reference, archive_url) = self.resolve(input)?;
        let temp_dir = self.options.temp_dir.as_deref();

        info!(
            reference = %reference,
            url = %archive_url,
            fetcher = self.fetcher.name(),
            "Downloading archive"
        );
        let mut archive = ArchiveHandle::create(temp_dir)?;
        let archive_bytes = self.fetcher.fetch(&archive_url, &mut archive).await?;

        info!(dest = %dest.display(), "Resetting destination");
        reset_destination(dest)?;

        info!(bytes = archive_bytes, "Extracting archive");
        let extracted = ExtractionWorkspace::extract(&archive, temp_dir);
        // The archive is not needed past this point, whatever the outcome
        drop(archive);
        let workspace = extracted?;

        let root = workspace.root()?;
        info!(root = %root.display(), entries = workspace.entries(), "Copying extracted tree");
        let copied = copy_tree(&root, dest)?;

        workspace.close();

        info!(
            dest = %dest.display(),
            files = copied.files,
            dirs = copied.dirs,
            "Deploy complete"
        );

        Ok(DeployReport {
            reference,
            archive_url,
            archive_bytes,
            destination: dest.to_path_buf(),
            copied,
        })
    }
}
