//! Subcommand implementations.

pub mod config;
pub mod run;
pub mod sync;

use std::sync::Arc;

use icsbridge_providers::google::GoogleCalendarClient;
use icsbridge_providers::ics::IcsFeed;
use icsbridge_sync::{Pacing, SyncEngine};
use tracing::info;

use crate::config::ClientConfig;
use crate::error::ClientResult;

/// Builds the engine for the ICS feed and Google calendar in `config`.
pub(crate) fn build_engine(config: &ClientConfig) -> ClientResult<SyncEngine> {
    config.validate()?;

    let feed = IcsFeed::new(config.feed_config()?)?;
    let target = GoogleCalendarClient::new(config.google_config())?;
    let sync_config = config.sync_config();

    info!(
        calendar = %sync_config.calendar_id,
        lookback_days = sync_config.lookback_days,
        lookahead_days = sync_config.lookahead_days,
        "Engine configured"
    );

    Ok(SyncEngine::new(
        Arc::new(feed),
        Arc::new(target),
        sync_config,
        Pacing::default(),
    ))
}
