//! Link target parsing and host classification
//!
//! Targets are parsed with the WHATWG rules browsers apply, so numeric,
//! shortened, octal and percent-encoded hosts arrive here already
//! normalized.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use url::{Host, Url};

/// Relative targets resolve against a host that is never internal
static LINK_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://storyshelf.invalid/").unwrap());

/// Parse a link target as a browser would, resolving relative targets
pub fn parse_target(target: &str) -> Option<Url> {
    match Url::parse(target) {
        Ok(url) => Some(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => LINK_BASE.join(target).ok(),
        Err(_) => None,
    }
}

/// True when `url` points at this machine or a private/link-local network
pub fn is_internal_url(url: &Url) -> bool {
    url.host().is_some_and(|host| is_internal_host(&host))
}

pub fn is_internal_host(host: &Host<&str>) -> bool {
    match host {
        Host::Ipv4(ip) => is_internal_v4(*ip),
        Host::Ipv6(ip) => is_internal_v6(*ip),
        Host::Domain(domain) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if domain == "localhost" || domain.ends_with(".localhost") {
                return true;
            }
            // Non-special schemes keep IP literals as opaque domains
            match domain.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
                Ok(IpAddr::V4(ip)) => is_internal_v4(ip),
                Ok(IpAddr::V6(ip)) => is_internal_v6(ip),
                Err(_) => false,
            }
        }
    }
}

fn is_internal_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local() || ip.is_unspecified()
}

fn is_internal_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_internal_v4(v4);
    }
    let first = ip.segments()[0];
    ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}
