//! Per-class version counters.
//!
//! Every key embeds the current version of its class. Bumping the version
//! orphans all earlier keys of the class at once; they are never read again
//! and expire through their TTL.
//!
//! Counters live in the cache store and advance with its atomic INCR. When
//! the store cannot be reached the table keeps serving a process-local copy,
//! and bumps made during the outage are replayed against the store once it
//! answers again. The local copy is also a floor: a counter that comes
//! back lower than a version this process already handed out (evicted or
//! flushed) is advanced back up before it is trusted, so retired keys are
//! never addressed again.
//!
//! The table also counts exact-key invalidations per class. A reader that
//! computed a value while such a write landed uses the count to tell that
//! its result may predate the write.

use crate::ResourceClass;
use crate::keys::KeyBuilder;
use crate::store::CacheStore;
use dashmap::DashMap;
use tracing::{debug, warn};

#[derive(Debug, Default, Clone, Copy)]
struct Slot {
    /// Last version seen in the store plus local bumps since.
    local: i64,
    /// Bumps that have not reached the store yet.
    pending: u32,
}

#[derive(Debug)]
pub struct ResourceVersionTable {
    store: CacheStore,
    keys: KeyBuilder,
    slots: DashMap<ResourceClass, Slot>,
    write_epochs: DashMap<ResourceClass, u64>,
}

impl ResourceVersionTable {
    pub fn new(store: CacheStore, keys: KeyBuilder) -> Self {
        Self {
            store,
            keys,
            slots: DashMap::new(),
            write_epochs: DashMap::new(),
        }
    }

    /// Records that entries of `class` were invalidated by key.
    pub fn note_write(&self, class: ResourceClass) {
        *self.write_epochs.entry(class).or_default() += 1;
    }

    /// Number of key invalidations seen for `class` by this process.
    pub fn write_epoch(&self, class: ResourceClass) -> u64 {
        self.write_epochs.get(&class).map(|epoch| *epoch).unwrap_or(0)
    }

    fn local(&self, class: ResourceClass) -> i64 {
        self.slots.get(&class).map(|slot| slot.local).unwrap_or(0)
    }

    fn record_store_version(&self, class: ResourceClass, version: i64) -> i64 {
        let mut slot = self.slots.entry(class).or_default();
        slot.local = slot.local.max(version);
        slot.local
    }

    /// Advances a counter that fell behind the local floor until it reaches
    /// `target`. Returns `None` if the store stops answering first.
    async fn restore_counter(
        &self,
        class: ResourceClass,
        mut version: i64,
        target: i64,
    ) -> Option<i64> {
        warn!(
            cache.class = %class,
            store = version,
            target,
            "Version counter behind local copy, restoring"
        );

        let key = self.keys.version_key(class);
        while version < target {
            match self.store.incr(&key).await {
                Ok(next) => version = next,
                Err(e) => {
                    warn!(cache.class = %class, error = %e, "Failed to restore version counter");
                    return None;
                }
            }
        }
        self.record_store_version(class, version);
        Some(version)
    }

    fn bump_locally(&self, class: ResourceClass) -> i64 {
        let mut slot = self.slots.entry(class).or_default();
        slot.local += 1;
        slot.pending += 1;
        slot.local
    }

    /// Replays bumps recorded during an outage. Returns `false` while some
    /// remain unapplied.
    async fn flush_pending(&self, class: ResourceClass) -> bool {
        let pending = match self.slots.get_mut(&class) {
            Some(mut slot) if slot.pending > 0 => std::mem::take(&mut slot.pending),
            _ => return true,
        };

        let key = self.keys.version_key(class);
        for applied in 0..pending {
            match self.store.incr(&key).await {
                Ok(version) => {
                    self.record_store_version(class, version);
                }
                Err(e) => {
                    warn!(cache.class = %class, error = %e, "Failed to replay version bump");
                    self.slots.entry(class).or_default().pending += pending - applied;
                    return false;
                }
            }
        }

        debug!(cache.class = %class, replayed = pending, "Replayed pending version bumps");
        true
    }

    /// Current version of a class.
    pub async fn get_version(&self, class: ResourceClass) -> i64 {
        if !self.store.is_enabled() {
            return self.local(class);
        }
        if !self.flush_pending(class).await {
            return self.local(class);
        }

        match self.store.get_counter(&self.keys.version_key(class)).await {
            Ok(version) => {
                let version = version.unwrap_or(0);
                let floor = self.local(class);
                if version < floor {
                    return self.restore_counter(class, version, floor).await.unwrap_or(floor);
                }
                self.record_store_version(class, version)
            }
            Err(e) => {
                warn!(cache.class = %class, error = %e, "Version lookup failed, using local copy");
                self.local(class)
            }
        }
    }

    /// Advances the version of a class and returns the new value.
    ///
    /// The increment happens in the store (fetch-and-add), so concurrent
    /// bumps from any number of processes each get a distinct version.
    pub async fn bump_version(&self, class: ResourceClass) -> i64 {
        if !self.store.is_enabled() {
            let mut slot = self.slots.entry(class).or_default();
            slot.local += 1;
            return slot.local;
        }
        if !self.flush_pending(class).await {
            return self.bump_locally(class);
        }

        let floor = self.local(class);
        match self.store.incr(&self.keys.version_key(class)).await {
            Ok(version) if version <= floor => {
                match self.restore_counter(class, version, floor + 1).await {
                    Some(version) => version,
                    None => self.bump_locally(class),
                }
            }
            Ok(version) => {
                self.record_store_version(class, version);
                debug!(cache.class = %class, version, "Version bumped");
                version
            }
            Err(e) => {
                let version = self.bump_locally(class);
                warn!(cache.class = %class, error = %e, version, "Version bump failed, recorded locally");
                version
            }
        }
    }
}
