//! In-process host cache.
//!
//! Memoizes hostname → address resolutions, hands out round-robin picks
//! among a host's addresses, and (optionally) re-resolves entries that were
//! used since the last sweep on a fixed interval.
//!
//! Entry lifecycle:
//! - created by a resolution (cache miss, explicit [`HostCache::lookup`], or a
//!   refresh sweep) or seeded with [`HostCache::insert`];
//! - replaced wholesale by every later resolution of the same host;
//! - dropped only when the whole cache is cleared with [`HostCache::remove`].
//!
//! Failed resolutions never touch the cache, so a host that stops resolving
//! keeps serving its last known addresses.

use super::refresh::RefreshTask;
use super::{Addrs, GaiResolver, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use dashmap::DashMap;
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Default pause between two re-resolutions inside one refresh sweep.
pub const DEFAULT_REFRESH_SPACING: Duration = Duration::from_secs(2);

/// Resolved state for one hostname.
///
/// Entries are shared: every caller fetching the same host gets the same
/// `Arc<CacheEntry>`, so the round-robin cursor and the accessed flag are
/// common to all of them.
#[derive(Debug)]
pub struct CacheEntry {
    addresses: Vec<IpAddr>,
    cursor: AtomicUsize,
    accessed: AtomicBool,
    resolved_at: Instant,
}

impl CacheEntry {
    fn new(addresses: Vec<IpAddr>, accessed: bool) -> Self {
        Self {
            addresses,
            cursor: AtomicUsize::new(0),
            accessed: AtomicBool::new(accessed),
            resolved_at: Instant::now(),
        }
    }

    /// Addresses in the order the resolver returned them.
    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    /// Advances the shared cursor and returns the address it now points at.
    ///
    /// The cursor moves before the read, so the first pick on a fresh entry
    /// is the second address. Returns `None` for an entry with no addresses.
    pub fn next_address(&self) -> Option<IpAddr> {
        self.advance().map(|i| self.addresses[i])
    }

    fn advance(&self) -> Option<usize> {
        let len = self.addresses.len();
        if len == 0 {
            return None;
        }
        let prev = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |c| Some((c + 1) % len))
            .unwrap_or_else(|c| c);
        Some((prev + 1) % len)
    }

    /// Whether the entry was read since it was created.
    pub fn is_accessed(&self) -> bool {
        self.accessed.load(Ordering::Relaxed)
    }

    fn mark_accessed(&self) {
        self.accessed.store(true, Ordering::Relaxed);
    }

    /// When the addresses were resolved (or seeded).
    pub fn resolved_at(&self) -> Instant {
        self.resolved_at
    }

    /// Number of cached addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// True if the resolver returned no addresses.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

/// Host cache configuration.
#[derive(Debug, Clone)]
pub struct HostCacheConfig {
    /// Time between refresh sweeps. Zero disables background refresh.
    pub refresh_interval: Duration,
    /// Pause after each re-resolution inside a sweep.
    pub refresh_spacing: Duration,
}

impl Default for HostCacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::ZERO,
            refresh_spacing: DEFAULT_REFRESH_SPACING,
        }
    }
}

impl HostCacheConfig {
    /// Create a new config with defaults (no background refresh).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval between refresh sweeps.
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the pause between re-resolutions within a sweep.
    pub fn refresh_spacing(mut self, spacing: Duration) -> Self {
        self.refresh_spacing = spacing;
        self
    }
}

/// Outcome of one refresh sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Entries re-resolved and replaced.
    pub refreshed: usize,
    /// Entries whose re-resolution failed; they keep their old addresses.
    pub failed: usize,
    /// Entries not accessed since their last resolution.
    pub skipped: usize,
}

/// State shared between the cache handle and its refresh task.
pub(crate) struct CacheInner {
    entries: DashMap<String, Arc<CacheEntry>>,
    resolver: Arc<dyn Resolve>,
    refresh_spacing: Duration,
}

impl CacheInner {
    async fn fetch(&self, host: &str) -> Result<Arc<CacheEntry>, NetError> {
        // Clone out of the map so no shard lock is held across the lookup
        let hit = self.entries.get(host).map(|e| Arc::clone(e.value()));
        if let Some(entry) = hit {
            entry.mark_accessed();
            return Ok(entry);
        }
        tracing::debug!(domain = %host, "host cache miss");
        self.lookup(host, true).await
    }

    async fn lookup(&self, host: &str, mark_accessed: bool) -> Result<Arc<CacheEntry>, NetError> {
        let addrs = self.resolver.resolve(Name::new(host)).await?;
        let addresses: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
        tracing::debug!(domain = %host, count = addresses.len(), "host cache updated");

        let entry = Arc::new(CacheEntry::new(addresses, mark_accessed));
        self.entries.insert(host.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    pub(crate) async fn refresh(&self) -> RefreshSummary {
        let snapshot: Vec<(String, Arc<CacheEntry>)> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        let mut summary = RefreshSummary::default();
        for (host, entry) in snapshot {
            if !entry.is_accessed() {
                summary.skipped += 1;
                continue;
            }
            match self.lookup(&host, false).await {
                Ok(_) => summary.refreshed += 1,
                Err(e) => {
                    tracing::warn!(domain = %host, error = %e, "refresh failed, keeping stale entry");
                    summary.failed += 1;
                }
            }
            tokio::time::sleep(self.refresh_spacing).await;
        }

        tracing::debug!(
            refreshed = summary.refreshed,
            failed = summary.failed,
            skipped = summary.skipped,
            "host cache refresh sweep complete"
        );
        summary
    }
}

/// Caching front for a [`Resolve`] backend.
///
/// # Example
///
/// ```rust,ignore
/// use hostcache::dns::HostCache;
/// use std::time::Duration;
///
/// let cache = HostCache::new(Duration::from_secs(60));
/// let ip = cache.fetch_one("example.com").await?;
/// ```
pub struct HostCache {
    inner: Arc<CacheInner>,
    refresh_task: Option<RefreshTask>,
}

impl HostCache {
    /// Creates a cache over the system resolver.
    ///
    /// A non-zero `refresh_interval` starts the background refresh task,
    /// which requires a running tokio runtime.
    pub fn new(refresh_interval: Duration) -> Self {
        Self::with_resolver(
            HostCacheConfig::new().refresh_interval(refresh_interval),
            Arc::new(GaiResolver::new()),
        )
    }

    /// Creates a cache over an arbitrary resolver backend.
    pub fn with_resolver(config: HostCacheConfig, resolver: Arc<dyn Resolve>) -> Self {
        let inner = Arc::new(CacheInner {
            entries: DashMap::with_capacity(64),
            resolver,
            refresh_spacing: config.refresh_spacing,
        });

        let refresh_task = if config.refresh_interval.is_zero() {
            None
        } else {
            Some(RefreshTask::spawn(&inner, config.refresh_interval))
        };

        Self {
            inner,
            refresh_task,
        }
    }

    /// Returns the cached entry for `host`, resolving it on a miss.
    ///
    /// Either way the entry ends up marked as accessed, making it eligible
    /// for the next refresh sweep.
    pub async fn fetch(&self, host: &str) -> Result<Arc<CacheEntry>, NetError> {
        self.inner.fetch(host).await
    }

    /// Returns the next address for `host` in round-robin order.
    ///
    /// `Ok(None)` means the host resolved to zero addresses, which is not an
    /// error.
    pub async fn fetch_one(&self, host: &str) -> Result<Option<IpAddr>, NetError> {
        let entry = self.fetch(host).await?;
        Ok(entry.next_address())
    }

    /// Like [`fetch_one`](Self::fetch_one), formatted as text.
    ///
    /// An empty string stands for "no address".
    pub async fn fetch_one_string(&self, host: &str) -> Result<String, NetError> {
        Ok(self
            .fetch_one(host)
            .await?
            .map(|ip| ip.to_string())
            .unwrap_or_default())
    }

    /// Resolves `host` and stores the result, overwriting any previous entry.
    ///
    /// On failure the cache is left as it was.
    pub async fn lookup(
        &self,
        host: &str,
        mark_accessed: bool,
    ) -> Result<Arc<CacheEntry>, NetError> {
        self.inner.lookup(host, mark_accessed).await
    }

    /// Re-resolves every entry accessed since its last resolution.
    ///
    /// Works on a snapshot of the cache and pauses for the configured spacing
    /// after each re-resolution. Refreshed entries start out un-accessed, so
    /// an entry nobody reads between two sweeps stops being refreshed.
    /// Failures are logged and leave the stale entry in place.
    pub async fn refresh(&self) -> RefreshSummary {
        self.inner.refresh().await
    }

    /// Drops every cached entry. The refresh task, if any, keeps running.
    pub fn remove(&self) {
        self.inner.entries.clear();
    }

    /// Seeds `host` with fixed addresses without resolving.
    ///
    /// The entry starts un-accessed, like one written by a refresh sweep.
    pub fn insert(
        &self,
        host: impl Into<String>,
        addresses: impl IntoIterator<Item = IpAddr>,
    ) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry::new(addresses.into_iter().collect(), false));
        self.inner.entries.insert(host.into(), Arc::clone(&entry));
        entry
    }

    /// Reads the cached entry for `host` without marking it accessed.
    pub fn peek(&self, host: &str) -> Option<Arc<CacheEntry>> {
        self.inner.entries.get(host).map(|e| Arc::clone(e.value()))
    }

    /// Whether `host` has a cached entry.
    pub fn contains(&self, host: &str) -> bool {
        self.inner.entries.contains_key(host)
    }

    /// Number of cached hosts.
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Whether a background refresh task is attached to this cache.
    pub fn is_refreshing(&self) -> bool {
        self.refresh_task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the background refresh task and waits for it to exit.
    ///
    /// A sweep in progress is abandoned. No-op without a refresh task.
    pub async fn shutdown(&mut self) {
        if let Some(task) = self.refresh_task.take() {
            task.stop().await;
        }
    }
}

impl Resolve for HostCache {
    /// Resolves through the cache, starting at the host's next round-robin
    /// address and wrapping around.
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let entry = inner.fetch(name.as_str()).await?;
            let len = entry.len();
            let start = entry.advance().unwrap_or(0);
            let ordered: Vec<SocketAddr> = (0..len)
                .map(|i| SocketAddr::new(entry.addresses()[(start + i) % len], 0))
                .collect();
            Ok(Box::new(ordered.into_iter()) as Addrs)
        })
    }
}

impl fmt::Debug for HostCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCache")
            .field("entries", &self.inner.entries.len())
            .field("refreshing", &self.refresh_task.is_some())
            .finish_non_exhaustive()
    }
}
