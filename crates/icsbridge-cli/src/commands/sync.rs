//! One-shot sync command.

use icsbridge_sync::SyncResult;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Runs a single cycle and prints its counts.
pub async fn run_once(config: &ClientConfig, json: bool) -> ClientResult<()> {
    let engine = super::build_engine(config)?;
    let result = engine.try_run_cycle().await?;

    if json {
        let text = serde_json::to_string_pretty(&result)
            .map_err(|e| ClientError::Sync(format!("failed to serialize result: {}", e)))?;
        println!("{}", text);
    } else {
        println!("{}", summary(&result));
    }
    Ok(())
}

fn summary(result: &SyncResult) -> String {
    let mut line = format!(
        "{} wanted: {} created, {} updated, {} deleted, {} unchanged",
        result.wanted, result.created, result.updated, result.deleted, result.unchanged
    );
    if result.failed > 0 {
        line.push_str(&format!(", {} failed", result.failed));
    }
    line
}
