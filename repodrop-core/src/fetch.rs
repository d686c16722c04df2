//! Archive download abstraction

use async_trait::async_trait;
use url::Url;

use crate::archive::ArchiveHandle;
use crate::Result;

/// Trait for anything that can download an archive URL to disk
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Get the name of this fetcher
    fn name(&self) -> &'static str;

    /// Download `url` into `archive`, returning the number of bytes written
    ///
    /// Transport errors, non-success statuses and write failures are all
    /// reported as [`crate::Error::DownloadFailed`].
    async fn fetch(&self, url: &Url, archive: &mut ArchiveHandle) -> Result<u64>;
}
