//! Snapshot client: pulls the primary bulk 24h statistics and the secondary rates
//! source concurrently.

use crate::{
    config::FeedConfig,
    error::DataError,
    feed::{binance, tonapi},
    ticker::TickerRecord,
};
use tracing::{debug, warn};

/// One snapshot cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Filtered and normalised primary snapshot records.
    pub primary: Vec<TickerRecord>,
    /// Secondary asset records, `None` when the secondary source failed this cycle.
    pub secondary: Option<Vec<TickerRecord>>,
}

/// REST client for the primary and secondary snapshot sources.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    http: reqwest::Client,
    config: FeedConfig,
}

impl SnapshotClient {
    pub fn new(config: FeedConfig) -> Result<Self, DataError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("tickerboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    /// Fetch the primary and secondary snapshots concurrently.
    ///
    /// A primary failure fails the whole cycle so the caller keeps its previous
    /// mapping. A secondary failure degrades to `secondary: None`.
    pub async fn fetch_snapshot(&self) -> Result<Snapshot, DataError> {
        let (primary, secondary) = tokio::join!(self.fetch_primary(), self.fetch_secondary());

        let primary = primary?;
        let secondary = match secondary {
            Ok(records) => Some(records),
            Err(error) => {
                warn!(%error, symbol = %self.config.secondary_symbol, "secondary snapshot failed, continuing without it");
                None
            }
        };

        debug!(
            primary = primary.len(),
            secondary = ?secondary.as_ref().map(Vec::len),
            "fetched snapshot"
        );

        Ok(Snapshot { primary, secondary })
    }

    pub async fn fetch_primary(&self) -> Result<Vec<TickerRecord>, DataError> {
        let body = self.get_bytes(&self.config.rest_url).await?;
        binance::parse_snapshot(&body)
    }

    pub async fn fetch_secondary(&self) -> Result<Vec<TickerRecord>, DataError> {
        let body = self.get_bytes(&self.config.secondary_url).await?;
        tonapi::parse_rates(
            &body,
            &self.config.secondary_token,
            &self.config.secondary_currency,
            &self.config.secondary_symbol,
        )
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, DataError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
