//! Hostname canonicalization
//!
//! Hostnames are resolved to an IPv4 address so that two records pointing
//! at the same machine compare equal regardless of which name was typed.
//! A failed lookup is never fatal: the original string is kept.

use std::net::{IpAddr, ToSocketAddrs};
use std::sync::LazyLock;

use regex::Regex;

/// Anything that looks like a host part of `http://<term>`
static HOST_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.?$")
        .expect("host pattern is valid")
});

/// DNS "A" record lookup
pub trait Resolve {
    /// First IPv4 address for `hostname`, if any
    fn lookup_a(&self, hostname: &str) -> Option<IpAddr>;
}

/// Resolver backed by the operating system (getaddrinfo)
///
/// Blocks for as long as the system resolver does; there is no timeout of
/// our own.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn lookup_a(&self, hostname: &str) -> Option<IpAddr> {
        let addrs = match (hostname, 0).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                tracing::debug!("DNS lookup for {hostname} failed: {e}");
                return None;
            }
        };
        addrs
            .map(|addr| addr.ip())
            .find(|ip| ip.is_ipv4())
    }
}

/// Result of canonicalizing one hostname
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonical {
    /// The IP address, or the input unchanged
    pub hostname: String,
    /// Set when a lookup the caller was certain about failed
    pub warning: Option<String>,
}

impl Canonical {
    fn unchanged(hostname: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            warning: None,
        }
    }
}

/// Whether `value` is already an IPv4 or IPv6 literal
pub fn is_ip(value: &str) -> bool {
    value.parse::<IpAddr>().is_ok()
}

/// Whether `value` would be accepted as the host of a URL
pub fn is_host_like(value: &str) -> bool {
    HOST_LIKE.is_match(value)
}

/// Resolve `hostname` to an IP address when allowed
///
/// - IP literals and disabled lookups come back unchanged.
/// - With `certain` the value is always looked up and a failure produces a
///   warning; without it the value must look like a host first and
///   failures stay silent (used for free-text search terms).
pub fn canonicalize(
    resolver: &dyn Resolve,
    hostname: &str,
    lookup_enabled: bool,
    certain: bool,
) -> Canonical {
    if hostname.is_empty() || !lookup_enabled || is_ip(hostname) {
        return Canonical::unchanged(hostname);
    }

    if !certain && !is_host_like(hostname) {
        return Canonical::unchanged(hostname);
    }

    match resolver.lookup_a(hostname) {
        Some(ip) => {
            tracing::debug!("Resolved {hostname} to {ip}");
            Canonical {
                hostname: ip.to_string(),
                warning: None,
            }
        }
        None => Canonical {
            hostname: hostname.to_string(),
            warning: certain.then(|| {
                format!(
                    "Failed lookup - {hostname}.  Set pssh:lookup to 'no' if this is normal for this host."
                )
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::test_support::StaticResolver;

    #[test]
    fn test_ip_literals_are_kept() {
        let resolver = StaticResolver::new().with("10.0.0.1", "192.168.1.1");
        assert_eq!(
            canonicalize(&resolver, "10.0.0.1", true, true),
            Canonical::unchanged("10.0.0.1")
        );
        assert_eq!(canonicalize(&resolver, "::1", true, true).hostname, "::1");
    }

    #[test]
    fn test_lookup_disabled() {
        let resolver = StaticResolver::new().with("web.example.com", "10.1.1.1");
        let result = canonicalize(&resolver, "web.example.com", false, true);
        assert_eq!(result.hostname, "web.example.com");
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_certain_lookup_resolves() {
        let resolver = StaticResolver::new().with("web.example.com", "10.1.1.1");
        let result = canonicalize(&resolver, "web.example.com", true, true);
        assert_eq!(result.hostname, "10.1.1.1");
        assert!(result.warning.is_none());
    }

    #[test]
    fn test_certain_failure_warns() {
        let resolver = StaticResolver::new();
        let result = canonicalize(&resolver, "gone.example.com", true, true);
        assert_eq!(result.hostname, "gone.example.com");
        assert!(result.warning.unwrap().contains("pssh:lookup"));
    }

    #[test]
    fn test_uncertain_failure_is_silent() {
        let resolver = StaticResolver::new();
        let result = canonicalize(&resolver, "gone.example.com", true, false);
        assert_eq!(result, Canonical::unchanged("gone.example.com"));
    }

    #[test]
    fn test_uncertain_skips_non_hosts() {
        let resolver = StaticResolver::new().with("bob smith", "10.9.9.9");
        let result = canonicalize(&resolver, "bob smith", true, false);
        assert_eq!(result.hostname, "bob smith");
    }

    #[test]
    fn test_host_like() {
        assert!(is_host_like("web"));
        assert!(is_host_like("web-1.example.com"));
        assert!(!is_host_like("-web"));
        assert!(!is_host_like("user@web"));
        assert!(!is_host_like(""));
    }
}
