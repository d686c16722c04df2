//! Deploy command - replace a directory with a GitHub repository archive

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use repodrop_core::{Config, DeployOptions, Deployer, DestinationLock};
use repodrop_github::ArchiveClient;

/// Arguments for the deploy command
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// GitHub repository URL, e.g. https://github.com/owner/repo[/tree/branch]
    #[arg(required = true)]
    pub url: String,

    /// Directory to replace (defaults to deploy.destination from config)
    #[arg(short, long, env = "REPODROP_DEST")]
    pub dest: Option<PathBuf>,

    /// Branch to deploy when the URL does not name one
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Fail instead of waiting when another deploy holds the destination
    #[arg(long)]
    pub no_wait: bool,
}

impl DeployArgs {
    /// Execute the deploy command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let dest = config.deploy.destination.clone().with_context(|| {
            match Config::default_config_path() {
                Some(path) => format!(
                    "No destination given. Pass --dest or set deploy.destination in {}",
                    path.display()
                ),
                None => "No destination given. Pass --dest".to_string(),
            }
        })?;

        // Resolve to absolute path
        let dest = if dest.is_absolute() {
            dest
        } else {
            std::env::current_dir()?.join(dest)
        };

        let options = DeployOptions::from_config(config)?;
        let deployer = Deployer::with_options(ArchiveClient::from_config(config)?, options);

        // Fail on a bad URL before touching the lock
        let (reference, archive_url) = deployer.resolve(&self.url)?;

        if verbose {
            tracing::info!(
                reference = %reference,
                archive_url = %archive_url,
                dest = %dest.display(),
                "Starting deploy"
            );
        }

        let _lock = if self.no_wait {
            DestinationLock::try_acquire(&dest)?
        } else {
            DestinationLock::acquire(&dest)?
        };

        println!("Deploying {}/{} ({})", reference.owner, reference.repo, reference.branch);
        println!("  from: {}", archive_url);
        println!("  to:   {}", dest.display());
        println!();

        let report = deployer.deploy(&self.url, &dest).await?;

        println!(
            "Success! Deployed {} file(s) in {} folder(s) to {}",
            report.copied.files,
            report.copied.dirs,
            report.destination.display()
        );
        if verbose {
            println!(
                "  archive: {} bytes, copied: {} bytes",
                report.archive_bytes, report.copied.bytes
            );
        }

        Ok(())
    }
}
