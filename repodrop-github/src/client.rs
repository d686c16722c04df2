//! GitHub archive download client using reqwest

use async_trait::async_trait;
use repodrop_core::{ArchiveFetcher, ArchiveHandle, Config, Error, Result};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tracing::{debug, info};
use url::Url;

/// Maximum number of redirects followed (archive URLs redirect to codeload)
const MAX_REDIRECTS: usize = 10;

/// HTTP client that downloads repository archives
///
/// No request timeout is set: a large archive on a slow link is allowed to
/// take as long as it needs.
#[derive(Clone)]
pub struct ArchiveClient {
    client: reqwest::Client,
    user_agent: String,
}

impl ArchiveClient {
    /// Create a client sending the given User-Agent
    pub fn new(user_agent: impl Into<String>) -> Result<Self> {
        let user_agent = user_agent.into();

        let client = reqwest::Client::builder()
            .user_agent(user_agent.clone())
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| Error::DownloadFailed(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, user_agent))
    }

    /// Create a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.http.user_agent.clone())
    }

    /// Wrap a preconfigured reqwest client
    ///
    /// `user_agent` is only used for logging; the client must already be
    /// built with it.
    pub fn with_client(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
        }
    }

    /// Get the User-Agent this client identifies with
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl std::fmt::Debug for ArchiveClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveClient")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ArchiveFetcher for ArchiveClient {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn fetch(&self, url: &Url, archive: &mut ArchiveHandle) -> Result<u64> {
        debug!(url = %url, user_agent = %self.user_agent, "Requesting archive");

        let mut response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| Error::DownloadFailed(format!("Error downloading {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::DownloadFailed(status_message(status, url)));
        }

        if response.url() != url {
            debug!(final_url = %response.url(), "Followed redirect");
        }

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::DownloadFailed(format!("Error reading {}: {}", url, e)))?
        {
            archive.write_chunk(&chunk)?;
        }

        let total = archive.finish()?;
        info!(url = %url, bytes = total, "Archive downloaded");
        Ok(total)
    }
}

fn status_message(status: StatusCode, url: &Url) -> String {
    match status {
        StatusCode::NOT_FOUND => format!(
            "{} returned 404. Check the repository exists, is public, and the branch name is correct",
            url
        ),
        _ => format!("{} returned HTTP {}", url, status),
    }
}
