//! Repodrop CLI - Command line interface for repodrop
//!
//! Replaces a deployment directory with the contents of a GitHub repository.

mod commands;

use clap::{Parser, Subcommand};
use repodrop_core::{CliOverrides, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{DeployArgs, ResolveArgs};

/// Repodrop: deploy a GitHub repository archive into a directory
#[derive(Parser, Debug)]
#[command(name = "repodrop")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// User-Agent sent when downloading archives (overrides config and env)
    #[arg(long, global = true, env = "REPODROP_USER_AGENT")]
    user_agent: Option<String>,

    /// Base URL archives are downloaded from (overrides config and env)
    #[arg(long, global = true, env = "REPODROP_GITHUB_URL")]
    github_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Download a repository and replace the destination with it
    #[command(visible_alias = "d")]
    Deploy(DeployArgs),

    /// Show the branch and archive URL a repository URL resolves to
    Resolve(ResolveArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let mut overrides = CliOverrides {
        user_agent: cli.user_agent.clone(),
        github_url: cli.github_url.clone(),
        ..CliOverrides::default()
    };
    if let Some(Commands::Deploy(args)) = &cli.command {
        overrides.destination = args.dest.clone();
        overrides.default_branch = args.branch.clone();
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(overrides)?;

    if cli.verbose {
        tracing::info!(
            user_agent = %config.http.user_agent,
            github_url = %config.http.github_url,
            default_branch = %config.deploy.default_branch,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("repodrop {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Deploy(args)) => {
            args.execute(cli.verbose, &config).await?;
        }
        Some(Commands::Resolve(args)) => {
            args.execute(&config)?;
        }
        Some(Commands::Config) => {
            println!("Repodrop Configuration");
            println!("======================");
            println!();
            println!("Deploy Settings:");
            println!(
                "  destination: {}",
                config
                    .deploy
                    .destination
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  default_branch: {}", config.deploy.default_branch);
            println!(
                "  temp_dir: {}",
                config
                    .deploy
                    .temp_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(system default)".to_string())
            );
            println!();
            println!("HTTP Settings:");
            println!("  user_agent: {}", config.http.user_agent);
            println!("  github_url: {}", config.http.github_url);
            println!();
            if let Some(path) = Config::default_config_path() {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            println!("Repodrop - deploy a GitHub repository into a directory");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_deploy() {
        let cli = Cli::try_parse_from([
            "repodrop",
            "deploy",
            "https://github.com/owner/repo/tree/dev",
            "--dest",
            "/srv/www/bot",
            "--no-wait",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Deploy(args)) => {
                assert_eq!(args.url, "https://github.com/owner/repo/tree/dev");
                assert_eq!(args.dest, Some(std::path::PathBuf::from("/srv/www/bot")));
                assert!(args.no_wait);
                assert!(args.branch.is_none());
            }
            other => panic!("expected deploy command, got {:?}", other),
        }
    }

    #[test]
    fn test_deploy_requires_url() {
        assert!(Cli::try_parse_from(["repodrop", "deploy"]).is_err());
    }
}
