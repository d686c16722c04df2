//! Configuration management for repodrop
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (REPODROP_*)
//! 3. Config file (~/.config/repodrop/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::reference::{DEFAULT_BRANCH, DEFAULT_GITHUB_URL};
use crate::{Error, Result};

/// Deployment-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Destination used when none is given on the command line
    pub destination: Option<PathBuf>,

    /// Branch deployed when the URL does not name one
    pub default_branch: String,

    /// Directory for the downloaded archive and extraction workspace
    pub temp_dir: Option<PathBuf>,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            destination: None,
            default_branch: DEFAULT_BRANCH.to_string(),
            temp_dir: None, // Platform temp directory
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with archive downloads
    pub user_agent: String,

    /// Base URL archives are fetched from
    pub github_url: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            github_url: DEFAULT_GITHUB_URL.to_string(),
        }
    }
}

/// Default User-Agent, `repodrop/<version>`
pub fn default_user_agent() -> String {
    format!("repodrop/{}", env!("CARGO_PKG_VERSION"))
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Deployment configuration
    pub deploy: DeployConfig,

    /// HTTP configuration
    pub http: HttpConfig,
}

/// Overrides collected from command line flags
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub destination: Option<PathBuf>,
    pub default_branch: Option<String>,
    pub user_agent: Option<String>,
    pub github_url: Option<String>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/repodrop/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("repodrop").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - REPODROP_DEST: Default destination directory
    /// - REPODROP_BRANCH: Default branch
    /// - REPODROP_TEMP_DIR: Directory for temporary files
    /// - REPODROP_USER_AGENT: User-Agent header
    /// - REPODROP_GITHUB_URL: Base URL for archive downloads
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dest) = std::env::var("REPODROP_DEST") {
            self.deploy.destination = Some(PathBuf::from(dest));
        }

        if let Ok(branch) = std::env::var("REPODROP_BRANCH") {
            self.deploy.default_branch = branch;
        }

        if let Ok(temp_dir) = std::env::var("REPODROP_TEMP_DIR") {
            self.deploy.temp_dir = Some(PathBuf::from(temp_dir));
        }

        if let Ok(user_agent) = std::env::var("REPODROP_USER_AGENT") {
            self.http.user_agent = user_agent;
        }

        if let Ok(github_url) = std::env::var("REPODROP_GITHUB_URL") {
            self.http.github_url = github_url;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(dest) = overrides.destination {
            self.deploy.destination = Some(dest);
        }

        if let Some(branch) = overrides.default_branch {
            self.deploy.default_branch = branch;
        }

        if let Some(ua) = overrides.user_agent {
            self.http.user_agent = ua;
        }

        if let Some(url) = overrides.github_url {
            self.http.github_url = url;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(overrides: CliOverrides) -> Result<Self> {
        let config = Self::load()?
            .with_env_overrides()
            .with_cli_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Check values that would otherwise fail mid-deploy
    pub fn validate(&self) -> Result<()> {
        if self.deploy.default_branch.trim().is_empty() {
            return Err(Error::Config("default_branch must not be empty".to_string()));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(Error::Config("user_agent must not be empty".to_string()));
        }
        self.github_url().map(|_| ())
    }

    /// Parsed archive base URL
    pub fn github_url(&self) -> Result<Url> {
        let url = Url::parse(&self.http.github_url).map_err(|e| {
            Error::Config(format!("Invalid github_url '{}': {}", self.http.github_url, e))
        })?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "github_url '{}' cannot be used as a base URL",
                self.http.github_url
            )));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.deploy.default_branch, "main");
        assert!(config.deploy.destination.is_none());
        assert!(config.deploy.temp_dir.is_none());
        assert_eq!(config.http.github_url, "https://github.com");
        assert!(config.http.user_agent.starts_with("repodrop/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(CliOverrides {
            destination: Some(PathBuf::from("/srv/www/bot")),
            default_branch: Some("master".to_string()),
            user_agent: Some("my-deployer".to_string()),
            github_url: None,
        });

        assert_eq!(config.deploy.destination, Some(PathBuf::from("/srv/www/bot")));
        assert_eq!(config.deploy.default_branch, "master");
        assert_eq!(config.http.user_agent, "my-deployer");
        assert_eq!(config.http.github_url, "https://github.com");
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[deploy]
destination = "/var/www/bot"
default_branch = "production"
temp_dir = "/var/tmp/repodrop"

[http]
user_agent = "cPanel-GitHub-Deploy-Script"
github_url = "https://github.example.com"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.deploy.destination, Some(PathBuf::from("/var/www/bot")));
        assert_eq!(config.deploy.default_branch, "production");
        assert_eq!(config.deploy.temp_dir, Some(PathBuf::from("/var/tmp/repodrop")));
        assert_eq!(config.http.user_agent, "cPanel-GitHub-Deploy-Script");
        assert_eq!(
            config.github_url().unwrap().as_str(),
            "https://github.example.com/"
        );
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[deploy]
destination = "/var/www/bot"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // Everything else falls back to defaults
        assert_eq!(config.deploy.default_branch, "main");
        assert_eq!(config.http.github_url, "https://github.com");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deploy]\ndefault_branch = \"trunk\"\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.deploy.default_branch, "trunk");
    }

    #[test]
    fn test_load_from_file_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[deploy\n").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.http.github_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.http.github_url = "mailto:someone@example.com".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.deploy.default_branch = "  ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
