//! Network-origin policy for WebSocket upgrades.
//!
//! A connection is accepted when it comes from a local network address or
//! when the client declared `Host: localhost`. This is coarse filtering, not
//! authentication.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Decide whether a connection may be upgraded
pub fn is_allowed(remote: Option<SocketAddr>, host: Option<&str>) -> bool {
    if remote.is_some_and(|addr| is_local_ip(addr.ip())) {
        return true;
    }
    host.is_some_and(is_localhost)
}

/// Loopback, private or link-local address
pub fn is_local_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_local_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_local_v4(v4),
            None => is_local_v6(v6),
        },
    }
}

fn is_local_v4(ip: Ipv4Addr) -> bool {
    ip.is_loopback() || ip.is_private() || ip.is_link_local()
}

fn is_local_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    // fc00::/7 unique local, fe80::/10 link local
    ip.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
}

/// `localhost` or `localhost:<port>`, case-insensitive
fn is_localhost(host: &str) -> bool {
    let host = host.trim();
    let (name, port) = match host.split_once(':') {
        Some((name, port)) => (name, Some(port)),
        None => (host, None),
    };
    name.eq_ignore_ascii_case("localhost")
        && port.map_or(true, |p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("127.0.0.1", true)]
    #[case("10.1.2.3", true)]
    #[case("172.16.0.9", true)]
    #[case("172.31.255.255", true)]
    #[case("192.168.1.20", true)]
    #[case("169.254.3.4", true)]
    #[case("::1", true)]
    #[case("fd12:3456::1", true)]
    #[case("fe80::1", true)]
    #[case("::ffff:192.168.0.5", true)]
    #[case("172.32.0.1", false)]
    #[case("8.8.8.8", false)]
    #[case("2001:4860:4860::8888", false)]
    #[case("::ffff:8.8.8.8", false)]
    fn test_local_ip(#[case] ip: &str, #[case] expected: bool) {
        assert_eq!(is_local_ip(ip.parse().unwrap()), expected, "{ip}");
    }

    #[rstest]
    #[case("localhost", true)]
    #[case("LOCALHOST:8448", true)]
    #[case("localhost:", false)]
    #[case("localhost.evil.com", false)]
    #[case("localhostx:80", false)]
    #[case("example.com", false)]
    fn test_localhost_header(#[case] host: &str, #[case] expected: bool) {
        assert_eq!(is_localhost(host), expected, "{host}");
    }

    #[test]
    fn test_policy() {
        let public: SocketAddr = "8.8.8.8:5000".parse().unwrap();
        let lan: SocketAddr = "192.168.0.2:5000".parse().unwrap();

        assert!(is_allowed(Some(lan), None));
        assert!(is_allowed(Some(public), Some("localhost:8448")));
        assert!(!is_allowed(Some(public), Some("example.com")));
        assert!(!is_allowed(Some(public), None));
        assert!(!is_allowed(None, None));
        assert!(is_allowed(None, Some("localhost")));
    }
}
