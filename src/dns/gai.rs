//! System DNS resolver using getaddrinfo.
//!
//! This is the host cache's default backend. Resolution goes through the
//! operating system (honouring /etc/hosts, nsswitch, resolv.conf) and runs in
//! tokio's blocking pool so callers never stall the async runtime.

use super::{Addrs, Name, Resolve, Resolving};
use crate::base::{context::IoResultExt, neterror::NetError};
use std::{
    io,
    net::{IpAddr, SocketAddr, ToSocketAddrs},
};

/// System DNS resolver using `getaddrinfo` in a thread pool.
///
/// Each resolution of a real hostname spawns a blocking task. IP literals
/// are answered inline.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

/// Parses `host` as an IPv4 or IPv6 literal.
///
/// Bracketed IPv6 (`[::1]`) is accepted as well.
pub(crate) fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    let trimmed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    trimmed.parse().ok()
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(ip) = parse_ip_literal(name.as_str()) {
            let addrs: Addrs = Box::new(std::iter::once(SocketAddr::new(ip, 0)));
            return Box::pin(std::future::ready(Ok(addrs)));
        }

        Box::pin(async move {
            let host = name.as_str().to_string();
            let domain = host.clone();

            let result = tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.collect::<Vec<_>>())
            })
            .await;

            // Join error means the blocking task panicked or was cancelled
            let addrs = result
                .map_err(|e| {
                    tracing::error!(error = %e, "DNS resolution task failed");
                    NetError::NameResolutionFailed
                })?
                .dns_context(&domain)
                .inspect_err(|e| {
                    tracing::debug!(domain = %domain, error = %e, "DNS resolution failed");
                })?;

            if addrs.is_empty() {
                return Err(NetError::dns_failed(
                    domain,
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        "No addresses returned by getaddrinfo",
                    ),
                ));
            }

            tracing::debug!(domain = %domain, count = addrs.len(), "DNS resolution complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}
