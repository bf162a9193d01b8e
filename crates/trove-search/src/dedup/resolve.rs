//! Survivor resolution for duplicate groups.
//!
//! Resolution proposes which member of each group to keep; it never
//! deletes anything itself.

use crate::dedup::DuplicateGroup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use tracing::warn;
use trove_core::backend::{ContentStore, FETCH_BATCH};

/// How to pick the surviving member of a duplicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Keep the lexicographically smallest id.
    First,
    /// Keep the lexicographically largest id.
    Last,
    /// Keep the most recently created document; ties break on id.
    Newest,
}

/// One document proposed for removal, with the survivor it duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedDoc {
    pub id: String,
    pub duplicate_of: String,
}

/// The resolution proposal: exactly one kept id per input group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub kept: Vec<String>,
    pub removed: Vec<RemovedDoc>,
}

/// Pick a survivor for every group under `strategy`.
///
/// `Newest` consults the content store for creation timestamps, batched to
/// the store's id-list cap; documents the store cannot produce are treated
/// as created at the epoch, so an unreachable store degrades `Newest` into
/// an id-based pick instead of failing.
#[must_use]
pub fn resolve(
    groups: &[DuplicateGroup],
    strategy: ResolutionStrategy,
    store: &dyn ContentStore,
) -> Resolution {
    let timestamps = if strategy == ResolutionStrategy::Newest {
        fetch_timestamps(groups, store)
    } else {
        BTreeMap::new()
    };

    let mut resolution = Resolution::default();
    for group in groups {
        let Some(survivor) = pick_survivor(&group.members, strategy, &timestamps) else {
            continue;
        };
        resolution.kept.push(survivor.clone());
        for member in &group.members {
            if member != &survivor {
                resolution.removed.push(RemovedDoc {
                    id: member.clone(),
                    duplicate_of: survivor.clone(),
                });
            }
        }
    }
    resolution
}

fn pick_survivor(
    members: &[String],
    strategy: ResolutionStrategy,
    timestamps: &BTreeMap<String, DateTime<Utc>>,
) -> Option<String> {
    match strategy {
        ResolutionStrategy::First => members.iter().min().cloned(),
        ResolutionStrategy::Last => members.iter().max().cloned(),
        ResolutionStrategy::Newest => members
            .iter()
            .max_by_key(|id| {
                (
                    timestamps
                        .get(*id)
                        .copied()
                        .unwrap_or(DateTime::UNIX_EPOCH),
                    (*id).clone(),
                )
            })
            .cloned(),
    }
}

fn fetch_timestamps(
    groups: &[DuplicateGroup],
    store: &dyn ContentStore,
) -> BTreeMap<String, DateTime<Utc>> {
    let ids: Vec<String> = groups
        .iter()
        .flat_map(|group| group.members.iter().cloned())
        .collect();

    let mut timestamps = BTreeMap::new();
    for batch in ids.chunks(FETCH_BATCH) {
        match store.fetch(batch) {
            Ok(docs) => {
                for doc in docs {
                    timestamps.insert(doc.id, doc.created_at);
                }
            }
            Err(err) => {
                warn!("timestamp lookup failed, falling back to id order: {err}");
                break;
            }
        }
    }
    timestamps
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
