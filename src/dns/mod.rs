//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution and an in-process host cache:
//! - System resolver (getaddrinfo via thread pool), the cache's default
//! - Async hickory-dns resolver (DoH/DoT capable)
//! - Hostname-to-IP override table
//! - [`HostCache`]: lookup-or-fetch caching, round-robin address selection,
//!   and periodic refresh of entries in active use
//!
//! # Example
//!
//! ```rust,ignore
//! use hostcache::dns::HostCache;
//! use std::time::Duration;
//!
//! let cache = HostCache::new(Duration::from_secs(300));
//! let entry = cache.fetch("example.com").await?;
//! for ip in entry.addresses() {
//!     println!("Resolved: {}", ip);
//! }
//! ```

mod cache;
mod gai;
mod hickory;
mod refresh;
mod resolve;

pub use cache::{CacheEntry, HostCache, HostCacheConfig, RefreshSummary, DEFAULT_REFRESH_SPACING};
pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
