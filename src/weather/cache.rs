use std::collections::HashMap;
use std::time::Duration;

use super::WeatherSnapshot;

pub const WEATHER_TTL: Duration = Duration::from_secs(30 * 60);
/// Fallback answers are retried sooner, matching their `max-age=300`.
pub const FALLBACK_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
struct CachedWeather {
    snapshot: WeatherSnapshot,
    fetched_at_ms: u64,
    ttl_ms: u64,
}

impl CachedWeather {
    fn is_fresh(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.fetched_at_ms) < self.ttl_ms
    }
}

/// Weather snapshots keyed by grid cell. Real readings live for the full TTL,
/// fallback snapshots for the shorter of it and [`FALLBACK_TTL`].
///
/// Expired entries are dropped whenever a new entry is stored, and the map
/// never grows past `capacity`: the oldest fetch is evicted first.
#[derive(Debug, Clone)]
pub struct WeatherCache {
    entries: HashMap<String, CachedWeather>,
    ttl_ms: u64,
    fallback_ttl_ms: u64,
    capacity: usize,
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::with_limits(WEATHER_TTL, DEFAULT_CAPACITY)
    }

    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        let ttl_ms = ttl.as_millis() as u64;
        Self {
            entries: HashMap::new(),
            ttl_ms,
            fallback_ttl_ms: ttl_ms.min(FALLBACK_TTL.as_millis() as u64),
            capacity: capacity.max(1),
        }
    }

    fn ttl_for(&self, snapshot: &WeatherSnapshot) -> u64 {
        if snapshot.fallback {
            self.fallback_ttl_ms
        } else {
            self.ttl_ms
        }
    }

    /// Fresh snapshot for `key`, if any. Stale entries are treated as absent.
    pub fn get(&self, key: &str, now_ms: u64) -> Option<&WeatherSnapshot> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now_ms))
            .map(|entry| &entry.snapshot)
    }

    pub fn insert(&mut self, key: String, snapshot: WeatherSnapshot, now_ms: u64) {
        self.purge_expired(now_ms);

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.fetched_at_ms)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                self.entries.remove(&oldest);
            }
        }

        let ttl_ms = self.ttl_for(&snapshot);
        self.entries.insert(
            key,
            CachedWeather {
                snapshot,
                fetched_at_ms: now_ms,
                ttl_ms,
            },
        );
    }

    /// Drops every stale entry and returns how many were removed.
    pub fn purge_expired(&mut self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now_ms));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
