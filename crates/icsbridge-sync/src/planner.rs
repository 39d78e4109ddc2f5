//! Diff between wanted mirrors and existing ones.

use std::collections::BTreeMap;
use std::fmt;

use icsbridge_core::IdentityKey;
use icsbridge_providers::MirrorBody;

use crate::equality::{MirrorProjection, is_equivalent};
use crate::inventory::Inventory;

/// A mirror to create.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCreate {
    pub key: IdentityKey,
    pub body: MirrorBody,
}

/// An existing mirror whose content drifted.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate {
    pub key: IdentityKey,
    pub id: String,
    pub body: MirrorBody,
}

/// Why a mirror is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteReason {
    /// Its occurrence is gone from the feed.
    Stale,
    /// Another mirror already holds its key.
    Duplicate,
}

impl fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stale => write!(f, "stale"),
            Self::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// A mirror to remove.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDelete {
    pub key: Option<IdentityKey>,
    pub id: String,
    pub reason: DeleteReason,
}

/// Everything one cycle will write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub creates: Vec<PlannedCreate>,
    pub updates: Vec<PlannedUpdate>,
    pub deletes: Vec<PlannedDelete>,
    /// Mirrors that already match and need no call.
    pub unchanged: usize,
}

impl SyncPlan {
    /// Returns true if the plan issues no write.
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.updates.is_empty() && self.deletes.is_empty()
    }

    /// Number of writes in the plan.
    pub fn len(&self) -> usize {
        self.creates.len() + self.updates.len() + self.deletes.len()
    }
}

/// Computes the writes that bring `inventory` in line with `wanted`.
///
/// Keys present on both sides are compared field by field and updated only
/// when they differ. Mirrors whose key is not wanted are deleted, as are
/// duplicates.
pub fn plan(wanted: BTreeMap<IdentityKey, MirrorBody>, inventory: Inventory) -> SyncPlan {
    let Inventory {
        by_key: mut existing,
        duplicates,
        ..
    } = inventory;
    let mut plan = SyncPlan::default();

    for (key, body) in wanted {
        match existing.remove(&key) {
            Some(item) => {
                if is_equivalent(&body, &MirrorProjection::from(&item)) {
                    plan.unchanged += 1;
                } else {
                    plan.updates.push(PlannedUpdate {
                        key,
                        id: item.id,
                        body,
                    });
                }
            }
            None => plan.creates.push(PlannedCreate { key, body }),
        }
    }

    plan.deletes.extend(existing.into_iter().map(|(key, item)| PlannedDelete {
        key: Some(key),
        id: item.id,
        reason: DeleteReason::Stale,
    }));
    plan.deletes.extend(duplicates.into_iter().map(|item| PlannedDelete {
        key: item.identity_key(),
        id: item.id,
        reason: DeleteReason::Duplicate,
    }));

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::index_inventory;
    use icsbridge_providers::{
        ExtendedProperties, MirrorItem, MirrorTime, Transparency, Visibility,
    };

    fn body(key: &str, summary: &str) -> MirrorBody {
        let key = IdentityKey::new(key);
        MirrorBody {
            summary: summary.to_string(),
            location: None,
            description: None,
            start: MirrorTime::date_time("2024-03-04T09:00:00+00:00"),
            end: MirrorTime::date_time("2024-03-04T10:00:00+00:00"),
            visibility: Visibility::Private,
            transparency: Transparency::Opaque,
            extended_properties: ExtendedProperties::marker(&key, key.uid()),
            source: None,
        }
    }

    fn wanted(bodies: Vec<MirrorBody>) -> BTreeMap<IdentityKey, MirrorBody> {
        bodies
            .into_iter()
            .map(|b| (b.identity_key().unwrap(), b))
            .collect()
    }

    #[test]
    fn classifies_each_key() {
        let inventory = index_inventory(vec![
            MirrorItem::from_body("m-b", &body("b|1", "Old title")),
            MirrorItem::from_body("m-c", &body("c|1", "Same")),
            MirrorItem::from_body("m-d", &body("d|1", "Gone")),
        ]);
        let plan = plan(
            wanted(vec![body("a|1", "New"), body("b|1", "New title"), body("c|1", "Same")]),
            inventory,
        );

        assert_eq!(plan.creates.len(), 1);
        assert_eq!(plan.creates[0].key.as_str(), "a|1");
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].id, "m-b");
        assert_eq!(plan.deletes.len(), 1);
        assert_eq!(plan.deletes[0].id, "m-d");
        assert_eq!(plan.deletes[0].reason, DeleteReason::Stale);
        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn duplicates_are_deleted() {
        let inventory = index_inventory(vec![
            MirrorItem::from_body("first", &body("a|1", "A")),
            MirrorItem::from_body("second", &body("a|1", "A")),
        ]);
        let plan = plan(wanted(vec![body("a|1", "A")]), inventory);

        assert!(plan.creates.is_empty());
        assert!(plan.updates.is_empty());
        assert_eq!(plan.unchanged, 1);
        assert_eq!(
            plan.deletes,
            vec![PlannedDelete {
                key: Some(IdentityKey::new("a|1")),
                id: "second".to_string(),
                reason: DeleteReason::Duplicate,
            }]
        );
    }

    #[test]
    fn empty_feed_deletes_everything() {
        let inventory = index_inventory(vec![MirrorItem::from_body("x", &body("a|1", "A"))]);
        let plan = plan(BTreeMap::new(), inventory);
        assert_eq!(plan.deletes.len(), 1);
        assert!(!plan.is_empty());
    }
}
