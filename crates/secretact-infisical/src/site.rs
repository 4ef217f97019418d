//! Backend base URL normalization

use url::{Host, Url};

/// Canonical `https://host[:port][/prefix]` form of a configured backend url.
///
/// The scheme is stripped and re-applied as `https`. An explicit `http://`
/// survives only for loopback hosts.
pub fn normalize_site_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let (plain_http, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
        (false, rest)
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        (true, rest)
    } else {
        (false, trimmed)
    };
    let host = rest.trim_end_matches('/');
    let scheme = if plain_http && is_loopback(host) { "http" } else { "https" };
    format!("{}://{}", scheme, host)
}

fn is_loopback(host: &str) -> bool {
    let Ok(url) = Url::parse(&format!("http://{}", host)) else {
        return false;
    };
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => ip.is_loopback(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reapplies_https() {
        assert_eq!(normalize_site_url("app.infisical.com"), "https://app.infisical.com");
        assert_eq!(normalize_site_url("https://app.infisical.com/"), "https://app.infisical.com");
        assert_eq!(normalize_site_url("http://vault.internal:8080"), "https://vault.internal:8080");
        assert_eq!(normalize_site_url(" https://eu.infisical.com/api/ "), "https://eu.infisical.com/api");
    }

    #[test]
    fn keeps_plain_http_for_loopback() {
        assert_eq!(normalize_site_url("http://127.0.0.1:4010"), "http://127.0.0.1:4010");
        assert_eq!(normalize_site_url("http://localhost:4010/"), "http://localhost:4010");
        assert_eq!(normalize_site_url("localhost:4010"), "https://localhost:4010");
    }
}
