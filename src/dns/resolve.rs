//! Core DNS resolution types and traits.
//!
//! The `Resolve` trait is the seam between the host cache and whatever
//! actually turns names into addresses. Swapping the implementation (for
//! tests, pinning, or a different backend) never touches cache logic.

use crate::base::neterror::NetError;
use std::{
    collections::HashMap,
    fmt,
    future::Future,
    net::{IpAddr, SocketAddr},
    pin::Pin,
    sync::Arc,
};

/// A hostname to resolve into IP addresses.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    /// Creates a new [`Name`] from any string-like type.
    #[inline]
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    /// View the hostname as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Alias for an `Iterator` trait object over `SocketAddr`.
pub type Addrs = Box<dyn Iterator<Item = SocketAddr> + Send>;

/// Alias for the `Future` type returned by a DNS resolver.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, NetError>> + Send>>;

/// Trait for DNS resolution.
///
/// Implementations must be thread-safe. Returned addresses carry port 0 and
/// keep the order the backend produced them in; the host cache relies on
/// that order for round-robin selection.
pub trait Resolve: Send + Sync {
    /// Resolves a hostname to IP addresses.
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Resolver wrapper that answers some hostnames from a fixed table.
///
/// Overridden names never reach the inner resolver. Matching ignores ASCII
/// case.
///
/// # Example
///
/// ```rust,ignore
/// use hostcache::dns::{DnsResolverWithOverrides, GaiResolver};
/// use std::sync::Arc;
///
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()))
///     .with_override("api.local", ["127.0.0.1".parse().unwrap()]);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: HashMap<String, Arc<[IpAddr]>>,
}

impl DnsResolverWithOverrides {
    /// Wraps `inner` with an empty override table.
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        Self {
            inner,
            overrides: HashMap::new(),
        }
    }

    /// Pins `host` to `addrs`.
    pub fn with_override(
        mut self,
        host: impl AsRef<str>,
        addrs: impl IntoIterator<Item = IpAddr>,
    ) -> Self {
        self.overrides
            .insert(host.as_ref().to_ascii_lowercase(), addrs.into_iter().collect());
        self
    }

    /// Returns the number of configured overrides.
    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(ips) = self.overrides.get(&name.as_str().to_ascii_lowercase()) {
            let ips = Arc::clone(ips);
            tracing::debug!(domain = %name, count = ips.len(), "resolved from override table");
            let addrs: Addrs = Box::new((0..ips.len()).map(move |i| SocketAddr::new(ips[i], 0)));
            return Box::pin(std::future::ready(Ok(addrs)));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}
