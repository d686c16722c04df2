//! GitHub repository reference parsing and archive URL construction

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::{Error, Result};

/// Branch used when a reference names none
pub const DEFAULT_BRANCH: &str = "main";

/// Default GitHub web host
pub const DEFAULT_GITHUB_URL: &str = "https://github.com";

static GITHUB_REPO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)github\.com/([^/]+)/([^/]+)(?:/(?:tree|blob)/(.+))?$")
        .expect("invalid regex")
});

/// A parsed repository reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReference {
    /// Repository owner/organization
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch to deploy
    pub branch: String,
}

impl RepoReference {
    /// Parse a GitHub URL, defaulting the branch to `main`
    ///
    /// Supports:
    /// - `https://github.com/owner/repo`
    /// - `https://github.com/owner/repo/tree/branch`
    /// - `https://github.com/owner/repo/blob/branch/path`
    ///
    /// Everything after `tree/` or `blob/` is taken as the branch, so
    /// `blob/main/src/lib.rs` yields the branch `main/src/lib.rs`.
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_default(input, DEFAULT_BRANCH)
    }

    /// Parse a GitHub URL, using `default_branch` when the URL names none
    pub fn parse_with_default(input: &str, default_branch: &str) -> Result<Self> {
        let input = input.trim();

        let caps = GITHUB_REPO.captures(input).ok_or_else(|| {
            Error::InvalidUrl(format!(
                "{}. Expected https://github.com/owner/repo[/tree/branch]",
                input
            ))
        })?;

        let owner = caps[1].to_string();
        let repo = caps[2].strip_suffix(".git").unwrap_or(&caps[2]).to_string();
        if repo.is_empty() {
            return Err(Error::InvalidUrl(format!("{}. Repository name is empty", input)));
        }
        // URL path normalization would silently drop these segments
        if [owner.as_str(), repo.as_str()].iter().any(|s| *s == "." || *s == "..") {
            return Err(Error::InvalidUrl(format!(
                "{}. Owner and repository cannot be '.' or '..'",
                input
            )));
        }

        let branch = caps
            .get(3)
            .map(|m| m.as_str())
            .filter(|b| !b.is_empty())
            .unwrap_or(default_branch)
            .to_string();

        Ok(Self {
            owner,
            repo,
            branch,
        })
    }

    /// Build the ZIP archive URL for this reference on `github_url`
    ///
    /// Only `refs/heads` is addressed; tags and commit SHAs are not resolved.
    /// The branch is encoded as a single path segment using the URL path
    /// segment set, so `/` becomes `%2F` while sub-delimiters such as
    /// `+&=;!'()` are left as-is; GitHub accepts both forms.
    pub fn archive_url(&self, github_url: &Url) -> Result<Url> {
        let mut url = github_url.clone();
        let archive_name = format!("{}.zip", self.branch);

        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("GitHub URL cannot be used as a base: {}", github_url)))?
            .pop_if_empty()
            .extend([
                self.owner.as_str(),
                self.repo.as_str(),
                "archive",
                "refs",
                "heads",
                archive_name.as_str(),
            ]);

        Ok(url)
    }

    /// Build the archive URL on the public GitHub host
    pub fn default_archive_url(&self) -> Result<Url> {
        let base = Url::parse(DEFAULT_GITHUB_URL)
            .map_err(|e| Error::Config(format!("Invalid GitHub URL: {}", e)))?;
        self.archive_url(&base)
    }
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_defaults_to_main() {
        let r = RepoReference::parse("https://github.com/owner/repo").unwrap();
        assert_eq!(r.owner, "owner");
        assert_eq!(r.repo, "repo");
        assert_eq!(r.branch, "main");
    }

    #[test]
    fn test_parse_tree_branch() {
        let r = RepoReference::parse("https://github.com/owner/repo/tree/develop").unwrap();
        assert_eq!(r.branch, "develop");
    }

    #[test]
    fn test_parse_branch_with_slash() {
        let r = RepoReference::parse("https://github.com/owner/repo/tree/release/1.0").unwrap();
        assert_eq!(r.branch, "release/1.0");
    }

    #[test]
    fn test_parse_blob_keeps_trailing_path() {
        let r = RepoReference::parse("https://github.com/owner/repo/blob/main/src/lib.rs").unwrap();
        assert_eq!(r.branch, "main/src/lib.rs");
    }

    #[test]
    fn test_parse_case_insensitive_and_trimmed() {
        let r = RepoReference::parse("  HTTPS://GitHub.COM/Owner/Repo/TREE/dev \n").unwrap();
        assert_eq!(r.owner, "Owner");
        assert_eq!(r.repo, "Repo");
        assert_eq!(r.branch, "dev");
    }

    #[test]
    fn test_parse_without_scheme() {
        let r = RepoReference::parse("github.com/owner/repo").unwrap();
        assert_eq!(r.owner, "owner");
        assert_eq!(r.repo, "repo");
    }

    #[test]
    fn test_parse_strips_git_suffix() {
        let r = RepoReference::parse("https://github.com/owner/repo.git").unwrap();
        assert_eq!(r.repo, "repo");
    }

    #[test]
    fn test_parse_strips_git_suffix_once() {
        let r = RepoReference::parse("https://github.com/owner/repo.git.git").unwrap();
        assert_eq!(r.repo, "repo.git");
    }

    #[test]
    fn test_parse_rejects_dot_segments() {
        for input in [
            "https://github.com/../repo",
            "https://github.com/owner/..",
            "https://github.com/./repo/tree/main",
            "https://github.com/owner/..git",
        ] {
            let err = RepoReference::parse(input).unwrap_err();
            assert!(matches!(err, Error::InvalidUrl(_)), "expected InvalidUrl for {:?}", input);
        }
    }

    #[test]
    fn test_archive_url_keeps_sub_delimiters() {
        let r = RepoReference::parse("https://github.com/owner/repo/tree/fix+1").unwrap();
        assert_eq!(
            r.default_archive_url().unwrap().as_str(),
            "https://github.com/owner/repo/archive/refs/heads/fix+1.zip"
        );
    }

    #[test]
    fn test_parse_custom_default_branch() {
        let r = RepoReference::parse_with_default("https://github.com/owner/repo", "master").unwrap();
        assert_eq!(r.branch, "master");

        let r = RepoReference::parse_with_default("https://github.com/owner/repo/tree/dev", "master")
            .unwrap();
        assert_eq!(r.branch, "dev");
    }

    #[test]
    fn test_parse_invalid() {
        for input in [
            "",
            "invalid",
            "owner/repo",
            "https://gitlab.com/owner/repo",
            "https://github.com/owner",
            "https://github.com/owner/repo/issues",
            "https://github.com/owner/repo/",
        ] {
            let err = RepoReference::parse(input).unwrap_err();
            assert!(matches!(err, Error::InvalidUrl(_)), "expected InvalidUrl for {:?}", input);
        }
    }

    #[test]
    fn test_archive_url() {
        let r = RepoReference::parse("https://github.com/owner/repo").unwrap();
        assert_eq!(
            r.default_archive_url().unwrap().as_str(),
            "https://github.com/owner/repo/archive/refs/heads/main.zip"
        );
    }

    #[test]
    fn test_archive_url_encodes_branch() {
        let r = RepoReference::parse("https://github.com/owner/repo/tree/release/1.0").unwrap();
        assert_eq!(
            r.default_archive_url().unwrap().as_str(),
            "https://github.com/owner/repo/archive/refs/heads/release%2F1.0.zip"
        );
    }

    #[test]
    fn test_archive_url_custom_host() {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        let r = RepoReference::parse("https://github.com/owner/repo/tree/dev").unwrap();
        assert_eq!(
            r.archive_url(&base).unwrap().as_str(),
            "http://127.0.0.1:8080/owner/repo/archive/refs/heads/dev.zip"
        );
    }

    #[test]
    fn test_display() {
        let r = RepoReference::parse("https://github.com/owner/repo").unwrap();
        assert_eq!(r.to_string(), "owner/repo@main");
    }
}
