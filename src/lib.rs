//! # hostcache
//!
//! An in-process DNS host cache for Rust services.
//!
//! `hostcache` memoizes hostname resolutions, serves repeated lookups from
//! memory, and spreads connections over a host's addresses with shared
//! round-robin selection. An optional background task periodically
//! re-resolves the entries that are actually being used.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hostcache::dns::HostCache;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let cache = HostCache::new(Duration::from_secs(60));
//!     let ip = cache.fetch_one_string("example.com").await.unwrap();
//!     println!("Connecting to {}", ip);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error definitions and context helpers
//! - [`dns`] - Resolver backends and the host cache

pub mod base;
pub mod dns;
