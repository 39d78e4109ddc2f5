//! Feed and target calendar traits.
//!
//! The sync engine talks to the outside world only through these two
//! traits: a [`FeedSource`] it reads occurrences from and a
//! [`TargetCalendar`] it writes mirrors to. Both are object-safe so the
//! engine can hold them as `Arc<dyn ...>` and tests can substitute
//! in-memory fakes.

use std::future::Future;
use std::pin::Pin;

use icsbridge_core::SyncWindow;

use crate::error::ProviderResult;
use crate::mirror::{MirrorBody, MirrorItem, MirrorPage, MirrorQuery};
use crate::raw_event::RawOccurrence;

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe for dynamic dispatch.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A read-only source of occurrences.
///
/// # Example Implementation
///
/// ```ignore
/// struct StaticFeed(Vec<RawOccurrence>);
///
/// impl FeedSource for StaticFeed {
///     fn name(&self) -> &str { "static" }
///
///     fn fetch<'a>(&'a self, _window: &'a SyncWindow)
///         -> BoxFuture<'a, ProviderResult<Vec<RawOccurrence>>>
///     {
///         Box::pin(async move { Ok(self.0.clone()) })
///     }
/// }
/// ```
pub trait FeedSource: Send + Sync {
    /// Returns the name of this source (e.g., "ics").
    fn name(&self) -> &str;

    /// Fetches every occurrence that may intersect `window`.
    ///
    /// Recurring events must be expanded into individual occurrences.
    /// Returning occurrences outside the window is allowed; the engine
    /// filters them.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the feed cannot be downloaded or parsed
    /// as a whole. Individually malformed events should be skipped instead.
    fn fetch<'a>(
        &'a self,
        window: &'a SyncWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<RawOccurrence>>>;
}

/// The mutable calendar that receives mirrors.
///
/// Implementations perform exactly one remote call per method and never
/// retry on their own; pacing and retry decisions belong to the caller.
/// Rate-limit responses must be reported with
/// [`ProviderErrorCode::RateLimited`](crate::ProviderErrorCode::RateLimited)
/// and, when the remote says so, a `retry_after` duration.
pub trait TargetCalendar: Send + Sync {
    /// Returns the name of this calendar backend (e.g., "google").
    fn name(&self) -> &str;

    /// Lists one page of items matching `query`.
    fn list_page<'a>(
        &'a self,
        query: &'a MirrorQuery,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<MirrorPage>>;

    /// Creates a new item from `body`.
    fn insert<'a>(&'a self, body: &'a MirrorBody) -> BoxFuture<'a, ProviderResult<MirrorItem>>;

    /// Overwrites the visible fields and metadata of item `id` with `body`.
    fn patch<'a>(
        &'a self,
        id: &'a str,
        body: &'a MirrorBody,
    ) -> BoxFuture<'a, ProviderResult<MirrorItem>>;

    /// Deletes item `id`.
    ///
    /// # Errors
    ///
    /// An item that no longer exists is reported as
    /// [`ProviderErrorCode::NotFound`](crate::ProviderErrorCode::NotFound).
    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ProviderResult<()>>;
}
