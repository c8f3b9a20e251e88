//! Access policy for mutating operations.
//!
//! A single trusted client address may upload and manage folders. The
//! caller is the socket peer address. `X-Forwarded-For` is only read when
//! that peer is one of the configured trusted proxies.

use std::net::{IpAddr, SocketAddr};

use galleria_shared::{AccessConfig, AppError};

/// Single-address allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: Option<IpAddr>,
    trusted_proxies: Vec<IpAddr>,
}

impl AccessPolicy {
    /// Create a policy that only looks at the socket peer. `None` denies
    /// every caller.
    #[must_use]
    pub fn new(allowed: Option<IpAddr>) -> Self {
        Self {
            allowed: allowed.map(|ip| ip.to_canonical()),
            trusted_proxies: Vec::new(),
        }
    }

    /// Believe `X-Forwarded-For` on requests coming from these proxies.
    #[must_use]
    pub fn with_trusted_proxies(mut self, proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        self.trusted_proxies = proxies.into_iter().map(|ip| ip.to_canonical()).collect();
        self
    }

    /// Build the policy from settings.
    ///
    /// Trusted proxies are ignored unless `trust_forwarded_header` is set.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured address is not an IP address.
    pub fn from_settings(settings: &AccessConfig) -> Result<Self, AppError> {
        let allowed = settings
            .allowed_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|raw| parse_setting("access.allowed_address", raw))
            .transpose()?;

        let mut policy = Self::new(allowed);
        if settings.trust_forwarded_header {
            let proxies = settings
                .trusted_proxies
                .iter()
                .map(|raw| parse_setting("access.trusted_proxies", raw.trim()))
                .collect::<Result<Vec<_>, _>>()?;
            policy = policy.with_trusted_proxies(proxies);
        }
        Ok(policy)
    }

    /// Whether an allowed address is configured at all.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.allowed.is_some()
    }

    /// Caller address as the policy sees it.
    ///
    /// A peer that is not a trusted proxy is the caller, whatever headers it
    /// sends. Behind a trusted proxy the `X-Forwarded-For` chain is walked
    /// from the right, skipping trusted proxies, and the first other entry is
    /// the caller. Without a peer there is no caller.
    #[must_use]
    pub fn resolve_caller(&self, forwarded: Option<&str>, peer: Option<SocketAddr>) -> Option<String> {
        let peer = peer?.ip().to_canonical();
        if !self.is_trusted_proxy(peer) {
            return Some(peer.to_string());
        }

        let mut nearest_proxy = None;
        for hop in forwarded.unwrap_or_default().rsplit(',').map(str::trim) {
            if hop.is_empty() {
                continue;
            }
            match hop.parse::<IpAddr>() {
                Ok(ip) if self.is_trusted_proxy(ip.to_canonical()) => nearest_proxy = Some(hop),
                _ => return Some(hop.to_string()),
            }
        }
        Some(nearest_proxy.map_or_else(|| peer.to_string(), str::to_string))
    }

    /// Whether `caller` equals the allowed address.
    ///
    /// Missing or malformed callers are denied.
    #[must_use]
    pub fn is_allowed(&self, caller: Option<&str>) -> bool {
        let Some(allowed) = self.allowed else {
            return false;
        };
        caller
            .and_then(|raw| raw.trim().parse::<IpAddr>().ok())
            .is_some_and(|ip| ip.to_canonical() == allowed)
    }

    fn is_trusted_proxy(&self, ip: IpAddr) -> bool {
        self.trusted_proxies.contains(&ip)
    }
}

fn parse_setting(key: &str, raw: &str) -> Result<IpAddr, AppError> {
    raw.parse::<IpAddr>()
        .map_err(|_| AppError::Internal(format!("invalid {key} '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PROXY: &str = "172.17.0.1";

    fn policy() -> AccessPolicy {
        AccessPolicy::new(Some("192.168.1.10".parse().unwrap()))
    }

    fn behind_proxy() -> AccessPolicy {
        policy().with_trusted_proxies([PROXY.parse().unwrap(), "10.0.0.2".parse().unwrap()])
    }

    fn peer(ip: &str) -> Option<SocketAddr> {
        Some(SocketAddr::new(ip.parse().unwrap(), 50000))
    }

    #[rstest]
    #[case(Some("192.168.1.10"), true)]
    #[case(Some(" 192.168.1.10 "), true)]
    #[case(Some("::ffff:192.168.1.10"), true)]
    #[case(Some("192.168.1.11"), false)]
    #[case(Some("not-an-ip"), false)]
    #[case(Some(""), false)]
    #[case(None, false)]
    fn test_is_allowed(#[case] caller: Option<&str>, #[case] expected: bool) {
        assert_eq!(policy().is_allowed(caller), expected);
    }

    #[test]
    fn test_unconfigured_denies_everyone() {
        let policy = AccessPolicy::new(None);
        assert!(!policy.is_configured());
        assert!(!policy.is_allowed(Some("127.0.0.1")));
    }

    #[rstest]
    #[case::no_header(None, "10.0.0.5")]
    #[case::spoofed_header(Some("192.168.1.10"), "10.0.0.5")]
    fn test_direct_peer_ignores_forwarded_header(
        #[case] forwarded: Option<&str>,
        #[case] expected: &str,
    ) {
        let caller = behind_proxy().resolve_caller(forwarded, peer("10.0.0.5"));
        assert_eq!(caller.as_deref(), Some(expected));
        assert!(!behind_proxy().is_allowed(caller.as_deref()));
    }

    #[rstest]
    #[case::single_hop(Some("192.168.1.10"), "192.168.1.10")]
    #[case::client_spoofs_leftmost(Some("192.168.1.10, 203.0.113.7"), "203.0.113.7")]
    #[case::proxy_chain(Some("192.168.1.10, 10.0.0.2"), "192.168.1.10")]
    #[case::only_proxies(Some("10.0.0.2"), "10.0.0.2")]
    #[case::malformed_hop(Some("192.168.1.10, bogus"), "bogus")]
    #[case::blank_header(Some(" "), PROXY)]
    #[case::no_header(None, PROXY)]
    fn test_resolve_caller_behind_trusted_proxy(
        #[case] forwarded: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(
            behind_proxy().resolve_caller(forwarded, peer(PROXY)).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_resolve_caller_without_peer() {
        assert_eq!(behind_proxy().resolve_caller(Some("192.168.1.10"), None), None);
    }

    #[test]
    fn test_mapped_proxy_address_is_trusted() {
        let caller = behind_proxy().resolve_caller(Some("192.168.1.10"), peer("::ffff:172.17.0.1"));
        assert_eq!(caller.as_deref(), Some("192.168.1.10"));
    }

    #[test]
    fn test_from_settings() {
        let settings = AccessConfig {
            allowed_address: Some("::ffff:127.0.0.1".to_string()),
            ..AccessConfig::default()
        };
        let policy = AccessPolicy::from_settings(&settings).unwrap();
        assert!(policy.is_allowed(Some("127.0.0.1")));

        let invalid = AccessConfig {
            allowed_address: Some("localhost".to_string()),
            ..AccessConfig::default()
        };
        assert!(AccessPolicy::from_settings(&invalid).is_err());

        assert!(!AccessPolicy::from_settings(&AccessConfig::default()).unwrap().is_configured());
    }

    #[test]
    fn test_from_settings_trusted_proxies() {
        let settings = AccessConfig {
            allowed_address: Some("192.168.1.10".to_string()),
            trust_forwarded_header: true,
            trusted_proxies: vec![PROXY.to_string()],
        };
        let policy = AccessPolicy::from_settings(&settings).unwrap();
        assert_eq!(
            policy.resolve_caller(Some("192.168.1.10"), peer(PROXY)).as_deref(),
            Some("192.168.1.10")
        );

        let disabled = AccessConfig {
            trust_forwarded_header: false,
            ..settings.clone()
        };
        let policy = AccessPolicy::from_settings(&disabled).unwrap();
        assert_eq!(
            policy.resolve_caller(Some("192.168.1.10"), peer(PROXY)).as_deref(),
            Some(PROXY)
        );

        let invalid = AccessConfig {
            trusted_proxies: vec!["proxy.local".to_string()],
            ..settings
        };
        assert!(AccessPolicy::from_settings(&invalid).is_err());
    }
}
