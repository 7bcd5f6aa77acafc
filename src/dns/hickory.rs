//! Async DNS resolver using hickory-dns.
//!
//! An alternative backend for the host cache when blocking-pool resolution
//! is undesirable, or when custom upstream servers (DoH/DoT) are needed.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{
    io,
    net::SocketAddr,
    sync::{Arc, LazyLock},
};

/// Async DNS resolver backed by hickory-dns.
///
/// [`HickoryResolver::new`] shares one lazily built, system-configured
/// resolver across the process. [`HickoryResolver::with_config`] builds a
/// private one against explicit upstreams.
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: Arc<TokioResolver>,
}

impl HickoryResolver {
    /// Returns a handle to the shared system-configured resolver.
    ///
    /// Falls back to hickory's defaults if the system configuration cannot
    /// be read.
    pub fn new() -> Self {
        static RESOLVER: LazyLock<Arc<TokioResolver>> = LazyLock::new(|| {
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };
            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;
            Arc::new(builder.build())
        });

        Self {
            resolver: Arc::clone(&RESOLVER),
        }
    }

    /// Builds a dedicated resolver for `config`.
    pub fn with_config(config: ResolverConfig, strategy: LookupIpStrategy) -> Self {
        let mut builder =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default());
        builder.options_mut().ip_strategy = strategy;
        Self {
            resolver: Arc::new(builder.build()),
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.resolver);
        Box::pin(async move {
            let domain = name.as_str();
            tracing::debug!(domain = %domain, "resolving via hickory-dns");

            let lookup = resolver.lookup_ip(domain).await.map_err(|e| {
                tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
                NetError::dns_failed(domain, io::Error::new(io::ErrorKind::NotFound, e.to_string()))
            })?;

            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    domain,
                    io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
                ));
            }

            tracing::debug!(
                domain = %domain,
                count = addrs.len(),
                "hickory-dns resolution complete"
            );
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shared_resolver_is_reused() {
        let r1 = HickoryResolver::new();
        let r2 = HickoryResolver::new();
        assert!(Arc::ptr_eq(&r1.resolver, &r2.resolver));
    }

    #[tokio::test]
    async fn test_with_config_is_private() {
        let shared = HickoryResolver::new();
        let custom =
            HickoryResolver::with_config(ResolverConfig::cloudflare(), LookupIpStrategy::Ipv4Only);
        assert!(!Arc::ptr_eq(&shared.resolver, &custom.resolver));
    }

    #[tokio::test]
    async fn test_hickory_resolver_invalid_domain() {
        let resolver = HickoryResolver::new();
        let result = resolver
            .resolve(Name::new("this-domain-definitely-does-not-exist.invalid"))
            .await;

        let err = result.err().expect("Should have error");
        assert_eq!(
            err.domain(),
            Some("this-domain-definitely-does-not-exist.invalid")
        );
    }
}
