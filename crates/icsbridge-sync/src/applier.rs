//! Execution of a [`SyncPlan`] against the target calendar.
//!
//! Writes are issued one at a time: creates, then updates, then deletes.
//! A failed write costs only its own item; the rest of the plan still runs
//! and the next cycle picks the item up again. Only an authentication
//! failure stops the run, since every later call would fail the same way.

use std::time::Duration;

use icsbridge_providers::{ProviderError, ProviderErrorCode, ProviderResult, TargetCalendar};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::SyncError;
use crate::pacing::{Pacing, pause};
use crate::planner::SyncPlan;

/// Counters reported for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    /// Occurrences the feed wants mirrored.
    pub wanted: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    /// Writes that were skipped after an error or rate limit.
    pub failed: usize,
}

/// How one write ended.
#[derive(Debug)]
pub enum WriteOutcome {
    Done,
    /// The calendar asked us to back off for this long.
    RateLimited(Duration),
    Failed(ProviderError),
}

impl WriteOutcome {
    /// Classifies the result of a write.
    ///
    /// For deletes, an item that is already gone counts as done.
    pub fn classify<T>(result: ProviderResult<T>, is_delete: bool, pacing: &Pacing) -> Self {
        match result {
            Ok(_) => Self::Done,
            Err(e) if is_delete && e.code() == ProviderErrorCode::NotFound => Self::Done,
            Err(e) if e.is_rate_limited() => Self::RateLimited(pacing.retry_wait(&e)),
            Err(e) => Self::Failed(e),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WriteKind {
    Create,
    Update,
    Delete,
}

impl WriteKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Runs every write in `plan`.
///
/// # Errors
///
/// Returns [`SyncError::Authentication`] as soon as the calendar rejects
/// our credentials. Any other failure is counted in
/// [`SyncResult::failed`].
pub async fn apply(
    plan: &SyncPlan,
    target: &dyn TargetCalendar,
    pacing: &Pacing,
) -> Result<SyncResult, SyncError> {
    let mut result = SyncResult {
        unchanged: plan.unchanged,
        ..SyncResult::default()
    };

    for create in &plan.creates {
        let outcome = WriteOutcome::classify(target.insert(&create.body).await, false, pacing);
        if settle(outcome, WriteKind::Create, create.key.as_str(), pacing).await? {
            result.created += 1;
        } else {
            result.failed += 1;
        }
    }

    for update in &plan.updates {
        let outcome =
            WriteOutcome::classify(target.patch(&update.id, &update.body).await, false, pacing);
        if settle(outcome, WriteKind::Update, update.key.as_str(), pacing).await? {
            result.updated += 1;
        } else {
            result.failed += 1;
        }
    }

    for delete in &plan.deletes {
        let outcome = WriteOutcome::classify(target.delete(&delete.id).await, true, pacing);
        if settle(outcome, WriteKind::Delete, &delete.id, pacing).await? {
            debug!(id = %delete.id, reason = %delete.reason, "Deleted mirror");
            result.deleted += 1;
        } else {
            result.failed += 1;
        }
    }

    Ok(result)
}

/// Pauses as the outcome requires and reports whether the write counts.
async fn settle(
    outcome: WriteOutcome,
    kind: WriteKind,
    item: &str,
    pacing: &Pacing,
) -> Result<bool, SyncError> {
    match outcome {
        WriteOutcome::Done => {
            pacing.write_pause().await;
            Ok(true)
        }
        WriteOutcome::RateLimited(wait) => {
            warn!(
                op = kind.as_str(),
                item,
                wait_secs = wait.as_secs(),
                "Rate limited, skipping item until next cycle"
            );
            pause(wait).await;
            Ok(false)
        }
        WriteOutcome::Failed(e) if e.code().is_auth() => Err(SyncError::Authentication(e)),
        WriteOutcome::Failed(e) => {
            warn!(op = kind.as_str(), item, error = %e, "Write failed, skipping item");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_of_missing_item_is_done() {
        let pacing = Pacing::none();
        let gone: ProviderResult<()> = Err(ProviderError::not_found("gone"));
        assert!(matches!(
            WriteOutcome::classify(gone, true, &pacing),
            WriteOutcome::Done
        ));

        let gone: ProviderResult<()> = Err(ProviderError::not_found("gone"));
        assert!(matches!(
            WriteOutcome::classify(gone, false, &pacing),
            WriteOutcome::Failed(_)
        ));
    }

    #[test]
    fn rate_limit_wait() {
        let pacing = Pacing::none();
        let limited: ProviderResult<()> =
            Err(ProviderError::rate_limited("quota").with_retry_after(Duration::from_secs(7)));
        assert!(matches!(
            WriteOutcome::classify(limited, false, &pacing),
            WriteOutcome::RateLimited(d) if d == Duration::from_secs(7)
        ));
    }

    #[test]
    fn result_serializes() {
        let result = SyncResult {
            wanted: 3,
            created: 1,
            updated: 1,
            deleted: 1,
            unchanged: 1,
            failed: 0,
        };
        insta::assert_json_snapshot!(result, @r#"
        {
          "wanted": 3,
          "created": 1,
          "updated": 1,
          "deleted": 1,
          "unchanged": 1,
          "failed": 0
        }
        "#);
    }
}
