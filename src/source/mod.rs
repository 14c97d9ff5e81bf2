//! Asset providers. The only implementation today is the mock source that
//! serves the fixture set after a fixed delay.

pub mod fixtures;

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::listing::OwnedAsset;
use crate::types::AssetRecord;

/// Supplies the full current record set, and the holdings of a wallet.
pub trait AssetSource {
    fn fetch_all(&self) -> impl Future<Output = Result<Vec<AssetRecord>>> + Send;

    fn fetch_collection(&self, owner: &str) -> impl Future<Output = Result<Vec<OwnedAsset>>> + Send;
}

pub struct MockAssetSource {
    delay: Duration,
    owner: String,
}

impl MockAssetSource {
    /// `owner` is stamped on the fixture assets held by the session wallet.
    pub fn new(delay: Duration, owner: impl Into<String>) -> Self {
        Self {
            delay,
            owner: owner.into(),
        }
    }
}

impl AssetSource for MockAssetSource {
    async fn fetch_all(&self) -> Result<Vec<AssetRecord>> {
        debug!(delay_ms = self.delay.as_millis() as u64, "Mock source: fetching catalog");
        tokio::time::sleep(self.delay).await;
        Ok(fixtures::catalog_for(&self.owner))
    }

    async fn fetch_collection(&self, owner: &str) -> Result<Vec<OwnedAsset>> {
        if owner != self.owner {
            return Ok(Vec::new());
        }
        Ok(fixtures::collection())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn mock_source_waits_then_returns_fixture() {
        let source = MockAssetSource::new(Duration::from_millis(1000), "0xowner");
        let started = tokio::time::Instant::now();
        let records = source.fetch_all().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1000));
        assert_eq!(records.len(), 6);
        assert_eq!(records[2].owner, "0xowner");
    }

    #[tokio::test]
    async fn collection_is_empty_for_other_wallets() {
        let source = MockAssetSource::new(Duration::ZERO, "0xowner");
        assert!(source.fetch_collection("0xsomeone").await.unwrap().is_empty());
        assert_eq!(source.fetch_collection("0xowner").await.unwrap().len(), 2);
    }
}
