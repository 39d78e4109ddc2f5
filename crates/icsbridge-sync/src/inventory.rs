//! Listing of existing mirrors.
//!
//! The inventory is everything on the target calendar carrying our marker
//! within the window. It is read in full every cycle; nothing is cached.
//! The listing reaches past the window, then is narrowed with the same
//! overlap test the engine applies to feed occurrences, so both sides of
//! the plan agree on which boundary items are in scope.

use std::collections::BTreeMap;

use icsbridge_core::{IdentityKey, SyncWindow};
use icsbridge_providers::{MirrorItem, MirrorQuery, ProviderResult, TargetCalendar};
use tracing::{debug, warn};

use crate::pacing::{Pacing, pause};

/// Reads every marked item in `window`, page by page.
///
/// Items whose boundaries cannot be read are kept so the planner can still
/// replace or remove them.
///
/// A rate-limited page is retried with the same page token after the
/// server's `Retry-After` (or the pacing default), up to
/// [`Pacing::max_list_retries`] times per read.
///
/// # Errors
///
/// Any other error, or running out of retries, is returned as is.
pub async fn read_inventory(
    target: &dyn TargetCalendar,
    window: &SyncWindow,
    pacing: &Pacing,
) -> ProviderResult<Vec<MirrorItem>> {
    let query = MirrorQuery::for_window(window);
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut pages = 0usize;
    let mut retries = 0u32;

    loop {
        match target.list_page(&query, page_token.as_deref()).await {
            Ok(page) => {
                pages += 1;
                items.extend(page.items);
                match page.next_page_token {
                    Some(token) => {
                        page_token = Some(token);
                        pacing.page_pause().await;
                    }
                    None => break,
                }
            }
            Err(e) if e.is_rate_limited() && retries < pacing.max_list_retries => {
                retries += 1;
                let wait = pacing.retry_wait(&e);
                warn!(
                    wait_secs = wait.as_secs(),
                    attempt = retries,
                    "Rate limited while listing mirrors, backing off"
                );
                pause(wait).await;
            }
            Err(e) => return Err(e),
        }
    }

    // The server-side filter is trusted only as a prefilter.
    let listed = items.len();
    items.retain(MirrorItem::is_marked);
    if items.len() < listed {
        warn!(dropped = listed - items.len(), "Ignoring listed items without the mirror marker");
    }

    let marked = items.len();
    items.retain(|item| in_window(item, window));
    debug!(
        pages,
        items = items.len(),
        outside_window = marked - items.len(),
        "Read mirror inventory"
    );
    Ok(items)
}

fn in_window(item: &MirrorItem, window: &SyncWindow) -> bool {
    match (item.start.to_event_time(), item.end.to_event_time()) {
        (Some(start), Some(end)) => window.overlaps_event(&start, &end),
        _ => true,
    }
}

/// Existing mirrors indexed by identity key.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    /// The mirror kept for each key.
    pub by_key: BTreeMap<IdentityKey, MirrorItem>,
    /// Extra mirrors sharing a key with an earlier one.
    pub duplicates: Vec<MirrorItem>,
    /// Marked items carrying no key, left untouched.
    pub unkeyed: usize,
}

impl Inventory {
    /// Number of keyed mirrors.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    /// Returns true if no keyed mirror exists.
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Groups listed items by identity key.
///
/// The first item seen for a key is kept; later ones are duplicates, so at
/// most one mirror per occurrence survives the cycle.
pub fn index_inventory(items: Vec<MirrorItem>) -> Inventory {
    let mut inventory = Inventory::default();
    for item in items {
        let Some(key) = item.identity_key() else {
            debug!(id = %item.id, "Ignoring mirror without identity key");
            inventory.unkeyed += 1;
            continue;
        };
        if inventory.by_key.contains_key(&key) {
            debug!(id = %item.id, key = %key, "Found duplicate mirror");
            inventory.duplicates.push(item);
        } else {
            inventory.by_key.insert(key, item);
        }
    }
    inventory
}
