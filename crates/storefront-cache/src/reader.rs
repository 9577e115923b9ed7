//! Cache-aside reads with request coalescing.
//!
//! On a miss only one caller per key runs the source-of-truth query; other
//! callers for the same key wait for its result instead of issuing their own.
//! The in-flight registry is keyed by cache key, so unrelated keys never wait
//! on each other.
//!
//! A leader whose class saw a key invalidation while it was computing
//! returns its value but takes it back out of the store, since the value may
//! have been read before that write committed.

use crate::class::TtlPolicy;
use crate::keys::{CacheKey, KeyBuilder, KeyError, KeyParams};
use crate::store::{CacheStatus, CacheStore, Lookup, decode_entry, encode_entry};
use crate::versions::ResourceVersionTable;
use crate::ResourceClass;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
enum FlightState {
    Pending,
    /// Serialized cache envelope of the computed value.
    Ready(Arc<str>),
    /// The leader failed or produced nothing cacheable; waiters retry.
    Failed,
}

type Registry = DashMap<String, watch::Receiver<FlightState>>;

/// Removes the leader's registry entry however the leader exits, including
/// cancellation.
struct FlightGuard<'a> {
    registry: &'a Registry,
    key: &'a str,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.key);
    }
}

/// Point-in-time reader counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
    pub in_flight: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

#[derive(Debug)]
pub struct CacheAsideReader {
    store: CacheStore,
    keys: KeyBuilder,
    versions: Arc<ResourceVersionTable>,
    policy: TtlPolicy,
    in_flight: Registry,
    counters: Counters,
}

impl CacheAsideReader {
    pub fn new(
        store: CacheStore,
        keys: KeyBuilder,
        versions: Arc<ResourceVersionTable>,
        policy: TtlPolicy,
    ) -> Self {
        Self {
            store,
            keys,
            versions,
            policy,
            in_flight: DashMap::new(),
            counters: Counters::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            coalesced: self.counters.coalesced.load(Ordering::Relaxed),
            in_flight: self.in_flight.len() as u64,
        }
    }

    fn record(&self, key: &CacheKey, status: CacheStatus, coalesced: bool) {
        let kind = key.kind().to_string();
        match (status, coalesced) {
            (CacheStatus::Hit, _) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                counter!("cache_hits_total", "kind" => kind).increment(1);
            }
            (CacheStatus::Miss, false) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                counter!("cache_misses_total", "kind" => kind).increment(1);
            }
            (CacheStatus::Miss, true) => {
                self.counters.coalesced.fetch_add(1, Ordering::Relaxed);
                counter!("cache_coalesced_total", "kind" => kind).increment(1);
            }
        }
    }

    /// Builds the key for `params` under the current version of `class`,
    /// then reads through it with the class TTL.
    ///
    /// Malformed parameters are returned as an error before the cache or the
    /// source is touched.
    pub async fn read_class<T, E, F, Fut>(
        &self,
        class: ResourceClass,
        params: &KeyParams,
        compute: F,
    ) -> Result<Lookup<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<KeyError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let version = self.versions.get_version(class).await;
        let key = self.keys.build_key(class, version, params)?;
        self.read_through(&key, self.policy.ttl(class), compute).await
    }

    /// Returns the cached value for `key`, or runs `compute`, caches its
    /// result for `ttl` and returns it.
    ///
    /// Errors from `compute` are returned unchanged and are never cached.
    #[instrument(skip(self, key, compute), fields(cache.key = %key))]
    pub async fn read_through<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<Lookup<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some((value, remaining)) = self.store.get::<T>(key).await {
            self.record(key, CacheStatus::Hit, false);
            return Ok(Lookup::hit(value, remaining));
        }

        let leader = loop {
            let mut waiting = match self.in_flight.entry(key.to_string()) {
                Entry::Occupied(flight) => flight.get().clone(),
                Entry::Vacant(slot) => {
                    let (tx, rx) = watch::channel(FlightState::Pending);
                    slot.insert(rx);
                    break tx;
                }
            };

            let outcome = waiting
                .wait_for(|state| !matches!(state, FlightState::Pending))
                .await
                .map(|state| state.clone());

            if let Ok(FlightState::Ready(raw)) = outcome
                && let Some((value, remaining)) = decode_entry::<T>(key, &raw)
            {
                debug!("Coalesced onto in-flight computation");
                self.record(key, CacheStatus::Miss, true);
                return Ok(Lookup {
                    value,
                    status: CacheStatus::Miss,
                    remaining,
                });
            }

            // Leader failed or went away; let its entry clear and compete again.
            tokio::task::yield_now().await;
        };

        let _guard = FlightGuard {
            registry: &self.in_flight,
            key: key.as_str(),
        };
        let class = key.kind().parse::<ResourceClass>().ok();
        let epoch = class.map(|class| self.versions.write_epoch(class));

        // A previous leader may have populated the entry between our first
        // lookup and taking the lead.
        if let Some(raw) = self.store.get_raw(key).await
            && let Some((value, remaining)) = decode_entry::<T>(key, &raw)
        {
            leader.send_replace(FlightState::Ready(raw.into()));
            self.record(key, CacheStatus::Hit, false);
            return Ok(Lookup::hit(value, remaining));
        }

        match compute().await {
            Ok(value) => {
                match encode_entry(key, &value, ttl) {
                    Some(raw) => {
                        self.store.set_raw(key, raw.clone(), ttl).await;
                        if class.map(|class| self.versions.write_epoch(class)) != epoch {
                            debug!("Invalidated while computing, not caching result");
                            let _ = self.store.delete(key).await;
                            leader.send_replace(FlightState::Failed);
                            self.record(key, CacheStatus::Miss, false);
                            return Ok(Lookup::miss(value, Duration::ZERO));
                        }
                        leader.send_replace(FlightState::Ready(raw.into()));
                    }
                    None => {
                        leader.send_replace(FlightState::Failed);
                    }
                }
                self.record(key, CacheStatus::Miss, false);
                Ok(Lookup::miss(value, ttl))
            }
            Err(e) => {
                leader.send_replace(FlightState::Failed);
                Err(e)
            }
        }
    }
}
