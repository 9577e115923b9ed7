//! Invalidation after writes.
//!
//! Call the dispatcher only after the write to the source of truth has
//! committed. Invalidating first leaves a window in which a concurrent read
//! repopulates the cache with pre-write data.

use crate::ResourceClass;
use crate::backend::CacheError;
use crate::keys::{CacheKey, KeyBuilder, KeyError, KeyParams};
use crate::store::CacheStore;
use crate::versions::ResourceVersionTable;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// What a single invalidation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Exact keys removed from the store.
    pub deleted_keys: Vec<CacheKey>,
    /// Classes whose version was advanced, with the new version.
    pub bumped: Vec<(ResourceClass, i64)>,
    /// Entries removed by an administrative pattern purge.
    pub purged: u64,
}

#[derive(Debug)]
pub struct InvalidationDispatcher {
    store: CacheStore,
    keys: KeyBuilder,
    versions: Arc<ResourceVersionTable>,
}

impl InvalidationDispatcher {
    pub fn new(store: CacheStore, keys: KeyBuilder, versions: Arc<ResourceVersionTable>) -> Self {
        Self {
            store,
            keys,
            versions,
        }
    }

    /// Invalidates after a committed write to `class`.
    ///
    /// With `affected_ids`, the exact entity keys are deleted for the class
    /// and its entity companions; a class whose delete fails is bumped
    /// instead. Without them the mutation is treated as
    /// bulk and the class version is bumped. Either way the filter-dependent
    /// classes that embed this one get a version bump, since their keys
    /// cannot be enumerated.
    #[instrument(skip(self, affected_ids), fields(cache.class = %class))]
    pub async fn on_mutation(
        &self,
        class: ResourceClass,
        affected_ids: Option<&[String]>,
    ) -> Result<InvalidationReport, KeyError> {
        let mut report = InvalidationReport::default();

        match affected_ids {
            Some(ids) => {
                let mut targets = vec![class];
                targets.extend_from_slice(class.entity_companions());

                // Build every key first so a malformed id aborts before any
                // deletion happens.
                let mut keys = Vec::with_capacity(ids.len() * targets.len());
                for &target in &targets {
                    let version = self.versions.get_version(target).await;
                    for id in ids {
                        let key = self.keys.build_key(target, version, &KeyParams::Id(id.clone()))?;
                        keys.push((target, key));
                    }
                }

                for &target in &targets {
                    self.versions.note_write(target);
                }

                // A key that could not be deleted may still be served, so its
                // whole class moves to a new version instead.
                let mut undeleted: Vec<ResourceClass> = Vec::new();
                for (target, key) in keys {
                    match self.store.delete(&key).await {
                        Ok(_) => report.deleted_keys.push(key),
                        Err(_) if !undeleted.contains(&target) => undeleted.push(target),
                        Err(_) => {}
                    }
                }

                for target in undeleted {
                    let version = self.versions.bump_version(target).await;
                    warn!(cache.class = %target, version, "Exact invalidation failed, bumped class version");
                    report.bumped.push((target, version));
                }
            }
            None => {
                let version = self.versions.bump_version(class).await;
                report.bumped.push((class, version));
            }
        }

        for dependent in class.cascade() {
            let version = self.versions.bump_version(*dependent).await;
            report.bumped.push((*dependent, version));
        }

        info!(
            deleted = report.deleted_keys.len(),
            bumped = report.bumped.len(),
            "Cache invalidated after mutation"
        );
        Ok(report)
    }

    /// Bumps the version of one class without touching its cascade.
    pub async fn bump_class(&self, class: ResourceClass) -> InvalidationReport {
        let version = self.versions.bump_version(class).await;
        InvalidationReport {
            bumped: vec![(class, version)],
            ..Default::default()
        }
    }

    /// Deletes every entry of a class. Administrative escape hatch: cost grows
    /// with the keyspace, so writes should use [`Self::on_mutation`].
    #[instrument(skip(self), fields(cache.class = %class))]
    pub async fn purge_class(&self, class: ResourceClass) -> Result<InvalidationReport, CacheError> {
        let purged = self
            .store
            .delete_pattern(&self.keys.class_pattern(class))
            .await
            .inspect_err(|e| warn!(error = %e, "Class purge failed"))?;

        info!(purged, "Purged cache class");
        Ok(InvalidationReport {
            purged,
            ..Default::default()
        })
    }

    /// Deletes every entry in the namespace. Version counters survive.
    #[instrument(skip(self))]
    pub async fn purge_all(&self) -> Result<InvalidationReport, CacheError> {
        let purged = self
            .store
            .delete_pattern(&self.keys.namespace_pattern())
            .await
            .inspect_err(|e| warn!(error = %e, "Namespace purge failed"))?;

        info!(purged, "Purged cache namespace");
        Ok(InvalidationReport {
            purged,
            ..Default::default()
        })
    }
}
