//! Change detection between a desired body and an existing mirror.
//!
//! Only the fields the engine writes are compared. Calendars omit default
//! values and echo instants in their own timezone, so the comparison is
//! done on normalized values rather than raw strings.

use chrono::DateTime;
use icsbridge_providers::{MirrorBody, MirrorItem, MirrorTime, Transparency, Visibility};

/// The fields of an existing mirror that matter for convergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorProjection<'a> {
    pub summary: &'a str,
    pub location: &'a str,
    pub description: &'a str,
    pub visibility: &'a str,
    pub transparency: &'a str,
    pub start: Option<&'a str>,
    pub end: Option<&'a str>,
}

impl<'a> From<&'a MirrorItem> for MirrorProjection<'a> {
    fn from(item: &'a MirrorItem) -> Self {
        Self {
            summary: item.summary.as_deref().unwrap_or_default(),
            location: item.location.as_deref().unwrap_or_default(),
            description: item.description.as_deref().unwrap_or_default(),
            visibility: item
                .visibility
                .as_deref()
                .unwrap_or(Visibility::Default.as_str()),
            transparency: item
                .transparency
                .as_deref()
                .unwrap_or(Transparency::Opaque.as_str()),
            start: item.start.effective(),
            end: item.end.effective(),
        }
    }
}

/// Returns true if writing `desired` over `existing` would change nothing
/// visible.
pub fn is_equivalent(desired: &MirrorBody, existing: &MirrorProjection<'_>) -> bool {
    desired.summary == existing.summary
        && desired.location.as_deref().unwrap_or_default() == existing.location
        && desired.description.as_deref().unwrap_or_default() == existing.description
        && desired.visibility.as_str() == existing.visibility
        && desired.transparency.as_str() == existing.transparency
        && same_time(&desired.start, existing.start)
        && same_time(&desired.end, existing.end)
}

/// Compares effective values; two date-times match when they denote the
/// same instant.
fn same_time(desired: &MirrorTime, existing: Option<&str>) -> bool {
    match (desired.effective(), existing) {
        (None, None) => true,
        (Some(a), Some(b)) if a == b => true,
        (Some(a), Some(b)) => match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        },
        _ => false,
    }
}
