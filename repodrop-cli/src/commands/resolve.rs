//! Resolve command - show what a repository URL would deploy

use clap::Args;
use repodrop_core::{Config, RepoReference};

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// GitHub repository URL to parse
    #[arg(required = true)]
    pub url: String,
}

impl ResolveArgs {
    /// Execute the resolve command
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let reference = RepoReference::parse_with_default(&self.url, &config.deploy.default_branch)?;
        let archive_url = reference.archive_url(&config.github_url()?)?;

        println!("Owner:   {}", reference.owner);
        println!("Repo:    {}", reference.repo);
        println!("Branch:  {}", reference.branch);
        println!("Archive: {}", archive_url);

        if self.url.contains("/blob/") || reference.branch.contains('/') {
            println!();
            println!(
                "Note: everything after tree/ or blob/ is used as the branch name, \
                 including any file path."
            );
        }

        Ok(())
    }
}
