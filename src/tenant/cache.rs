// tenant/cache.rs - Process-local TTL cache of tenant verdicts

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use moka::future::Cache;

use super::TenantIdentity;

/// Default lifetime of a cached verdict (one hour)
pub const DEFAULT_TENANT_TTL: Duration = Duration::from_secs(3600);
/// Default upper bound on cached subdomains
pub const DEFAULT_TENANT_CAPACITY: usize = 10_000;

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same offset.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.origin + offset
    }
}

/// Verdict stored for a subdomain. Soft failures are never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedVerdict {
    Valid(TenantIdentity),
    Invalid,
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub verdict: CachedVerdict,
    pub stored_at: Instant,
}

/// Subdomain -> verdict cache with a fixed TTL and a bound on the number of
/// entries.
///
/// Freshness is judged against the injected clock; moka's own TTL and
/// capacity eviction reclaim memory. Concurrent misses for the same
/// subdomain may both store a verdict; the last write wins.
pub struct TenantCache {
    entries: Cache<String, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TenantCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self::with_clock(ttl, max_entries, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries as u64)
            .time_to_live(ttl)
            .build();

        Self { entries, ttl, clock }
    }

    /// Fresh verdict for `subdomain`, if any. A stale entry is evicted.
    pub async fn get(&self, subdomain: &str) -> Option<CachedVerdict> {
        let entry = self.entries.get(subdomain).await?;
        if self.clock.now().saturating_duration_since(entry.stored_at) < self.ttl {
            return Some(entry.verdict);
        }

        self.entries.invalidate(subdomain).await;
        None
    }

    pub async fn insert(&self, subdomain: &str, verdict: CachedVerdict) {
        let entry = CacheEntry {
            verdict,
            stored_at: self.clock.now(),
        };
        self.entries.insert(subdomain.to_string(), entry).await;
    }

    /// Drop the entry for `subdomain`. Returns whether one was present.
    pub async fn invalidate(&self, subdomain: &str) -> bool {
        self.entries.remove(subdomain).await.is_some()
    }

    /// Number of live entries, after pending evictions have been applied
    pub async fn len(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for TenantCache {
    fn default() -> Self {
        Self::new(DEFAULT_TENANT_TTL, DEFAULT_TENANT_CAPACITY)
    }
}
