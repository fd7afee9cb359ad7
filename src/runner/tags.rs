//! Batch-wide tag deduplication.
//!
//! Tag names are collapsed across every task of the batch before the store
//! is touched, so each distinct (name, partner) pair is looked up or created
//! exactly once per run.

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::config::RetryConfig;
use crate::error::StoreError;
use crate::model::NewTag;
use crate::runner::retry_read;
use crate::store::ActionPlanStore;

use super::persist::WriteLedger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTag {
    pub id: String,
    /// False when an existing row was reused
    pub created: bool,
}

/// Tag name -> resolved identifier
pub type TagMap = BTreeMap<String, ResolvedTag>;

/// Distinct tag names across all lists, first-seen order, case-sensitive
pub fn distinct_tag_names<'a, I>(tag_lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen: HashSet<&String> = HashSet::new();
    tag_lists
        .into_iter()
        .flatten()
        .filter(|name| seen.insert(*name))
        .cloned()
        .collect()
}

pub struct TagResolver<'a> {
    store: &'a dyn ActionPlanStore,
    retry: &'a RetryConfig,
}

impl<'a> TagResolver<'a> {
    pub fn new(store: &'a dyn ActionPlanStore, retry: &'a RetryConfig) -> Self {
        Self { store, retry }
    }

    /// Resolve every name concurrently; all lookups settle before the first
    /// error is returned.
    pub async fn resolve_tags(
        &self,
        names: &[String],
        partner_id: &str,
        ledger: &WriteLedger,
    ) -> Result<TagMap, StoreError> {
        let mut pending: FuturesUnordered<_> = names
            .iter()
            .map(|name| async move {
                let resolved = self.resolve_one(name, partner_id, ledger).await;
                (name, resolved)
            })
            .collect();

        let mut tags = TagMap::new();
        let mut first_error = None;
        while let Some((name, resolved)) = pending.next().await {
            match resolved {
                Ok(tag) => {
                    tags.insert(name.clone(), tag);
                }
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(tags),
        }
    }

    async fn resolve_one(
        &self,
        name: &str,
        partner_id: &str,
        ledger: &WriteLedger,
    ) -> Result<ResolvedTag, StoreError> {
        if let Some(id) = self.lookup(name, partner_id).await? {
            debug!("Reusing tag '{}' ({})", name, id);
            return Ok(ResolvedTag { id, created: false });
        }

        let tag = NewTag {
            name: name.to_string(),
            partner_id: partner_id.to_string(),
        };
        match self.store.create_tag(&tag).await {
            Ok(id) => {
                ledger.record_tag(&id);
                debug!("Created tag '{}' ({})", name, id);
                Ok(ResolvedTag { id, created: true })
            }
            // Another writer created the same pair between lookup and insert
            Err(StoreError::Conflict(reason)) => match self.lookup(name, partner_id).await? {
                Some(id) => {
                    debug!("Tag '{}' created concurrently; reusing {}", name, id);
                    Ok(ResolvedTag { id, created: false })
                }
                None => Err(StoreError::Conflict(reason)),
            },
            Err(e) => Err(e),
        }
    }

    async fn lookup(&self, name: &str, partner_id: &str) -> Result<Option<String>, StoreError> {
        let store = self.store;
        retry_read(self.retry, move || store.find_tag(name, partner_id)).await
    }
}
