//! HTTP download of the ICS feed.

use icsbridge_core::SyncWindow;
use reqwest::{Client, StatusCode};
use tracing::{Instrument, debug, info, info_span};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, FeedSource};
use crate::raw_event::RawOccurrence;

use super::config::IcsFeedConfig;
use super::parse::parse_feed;

const PROVIDER_NAME: &str = "ics";

/// Feed source reading a published iCalendar URL.
pub struct IcsFeed {
    client: Client,
    config: IcsFeedConfig,
}

impl IcsFeed {
    /// Creates a new feed source with the given configuration.
    pub fn new(config: IcsFeedConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to create HTTP client: {}", e))
                    .with_provider(PROVIDER_NAME)
            })?;

        Ok(Self { client, config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &IcsFeedConfig {
        &self.config
    }

    /// Downloads the raw feed body.
    async fn download(&self) -> ProviderResult<String> {
        let response = self
            .client
            .get(self.config.url.clone())
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("Feed request failed: {}", e))
                    .with_provider(PROVIDER_NAME)
                    .with_source(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Received feed response");

        match status {
            StatusCode::OK => response.text().await.map_err(|e| {
                ProviderError::network(format!("Failed to read feed body: {}", e))
                    .with_provider(PROVIDER_NAME)
            }),
            StatusCode::NOT_FOUND => {
                Err(ProviderError::not_found("Feed URL returned 404").with_provider(PROVIDER_NAME))
            }
            s => Err(ProviderError::feed(format!("Feed returned HTTP {}", s))
                .with_provider(PROVIDER_NAME)),
        }
    }
}

impl FeedSource for IcsFeed {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn fetch<'a>(
        &'a self,
        window: &'a SyncWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawOccurrence>>> {
        let span = info_span!("fetch_feed", url = %self.config.url);
        Box::pin(
            async move {
                let body = self.download().await?;
                let occurrences =
                    parse_feed(&body, window).map_err(|e| e.with_provider(PROVIDER_NAME))?;
                info!(count = occurrences.len(), "Fetched feed occurrences");
                Ok(occurrences)
            }
            .instrument(span),
        )
    }
}
