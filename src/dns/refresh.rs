//! Background refresh loop for the host cache.

use super::cache::CacheInner;
use std::{
    sync::{Arc, Weak},
    time::Duration,
};
use tokio::{sync::oneshot, task::JoinHandle};

/// Handle to the periodic refresh task of one cache.
///
/// The task only holds a weak reference to the cache state: once the cache
/// is gone the loop exits at its next wakeup. Dropping the handle aborts the
/// task outright.
pub(crate) struct RefreshTask {
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RefreshTask {
    /// Spawns the loop: sleep `interval`, sweep, repeat.
    ///
    /// Panics outside a tokio runtime.
    pub(crate) fn spawn(inner: &Arc<CacheInner>, interval: Duration) -> Self {
        let (tx, mut rx) = oneshot::channel::<()>();
        let cache: Weak<CacheInner> = Arc::downgrade(inner);

        let handle = tokio::spawn(async move {
            tracing::debug!(
                interval_ms = interval.as_millis() as u64,
                "host cache refresh task started"
            );
            loop {
                tokio::select! {
                    _ = &mut rx => break,
                    _ = tokio::time::sleep(interval) => {}
                }

                let Some(inner) = cache.upgrade() else {
                    break;
                };
                tokio::select! {
                    _ = &mut rx => break,
                    _ = inner.refresh() => {}
                }
            }
            tracing::debug!("host cache refresh task stopped");
        });

        Self {
            shutdown: Some(tx),
            handle: Some(handle),
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Signals the loop to exit and waits for it.
    pub(crate) async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = handle.await {
            if !e.is_cancelled() {
                tracing::error!(error = %e, "host cache refresh task panicked");
            }
        }
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::dns::{Addrs, HostCache, HostCacheConfig, Name, Resolve, Resolving};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct CountingResolver {
        calls: AtomicUsize,
    }

    impl Resolve for CountingResolver {
        fn resolve(&self, _name: Name) -> Resolving {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), 0);
            Box::pin(async move { Ok(Box::new(std::iter::once(addr)) as Addrs) })
        }
    }

    fn cache(interval: Duration) -> (HostCache, Arc<CountingResolver>) {
        let backend = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });
        let config = HostCacheConfig::new()
            .refresh_interval(interval)
            .refresh_spacing(Duration::from_millis(10));
        (HostCache::with_resolver(config, backend.clone()), backend)
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_sweeps() {
        let (mut cache, backend) = cache(Duration::from_secs(1));
        assert!(cache.is_refreshing());

        cache.fetch("a.example").await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        cache.shutdown().await;
        assert!(!cache.is_refreshing());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_without_task_is_noop() {
        let (mut cache, _) = cache(Duration::ZERO);
        assert!(!cache.is_refreshing());
        cache.shutdown().await;
        assert!(!cache.is_refreshing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_does_not_stop_task() {
        let (cache, backend) = cache(Duration::from_secs(1));
        cache.fetch("a.example").await.unwrap();
        cache.remove();
        assert!(cache.is_refreshing());

        // Re-populate after the clear; the running task picks it up
        cache.fetch("b.example").await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }
}
