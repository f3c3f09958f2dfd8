//! Hostname matching against certificate names.
//!
//! Comparison is exact and case-sensitive. A wildcard pattern `*.example.com`
//! covers `example.com` itself and any name exactly one label below it.

use crate::certificate::Certificate;
use tracing::debug;

const WILDCARD_PREFIX: &str = "*.";

/// Returns true when `pattern`, taken from a certificate, covers `hostname`.
///
/// Only a single label is substituted for the wildcard, so `a.b.example.com`
/// is not covered by `*.example.com`.
///
/// ```
/// use tlsnamecheck::matcher::matches;
///
/// assert!(matches("www.example.com", "*.example.com"));
/// assert!(matches("example.com", "*.example.com"));
/// assert!(!matches("a.b.example.com", "*.example.com"));
/// ```
pub fn matches(hostname: &str, pattern: &str) -> bool {
    if hostname == pattern {
        return true;
    }

    let root = match pattern.strip_prefix(WILDCARD_PREFIX) {
        Some(root) => root,
        None => return false,
    };

    if hostname == root {
        return true;
    }

    match hostname.split_once('.') {
        Some((_, parent)) => parent == root,
        None => false,
    }
}

/// Returns true when any of the certificate's valid host names covers `url_host`.
pub fn is_certificate_valid_for_hostname(url_host: &str, certificate: &Certificate) -> bool {
    let found = certificate
        .valid_host_names
        .iter()
        .find(|name| matches(url_host, name));

    match found {
        Some(name) => {
            debug!(host = url_host, name = %name, "certificate name covers host");
            true
        }
        None => {
            debug!(
                host = url_host,
                names = ?certificate.valid_host_names,
                "no certificate name covers host"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        for host in ["example.com", "a", "www.example.com", "*.example.com"] {
            assert!(matches(host, host), "{} should match itself", host);
        }
    }

    #[test]
    fn test_wildcard_single_label() {
        assert!(matches("a.example.com", "*.example.com"));
        assert!(matches("test.example.com", "*.example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_root() {
        assert!(matches("example.com", "*.example.com"));
    }

    #[test]
    fn test_wildcard_does_not_span_labels() {
        assert!(!matches("b.a.example.com", "*.example.com"));
    }

    #[test]
    fn test_different_domain() {
        assert!(!matches("example.com", "example.org"));
        assert!(!matches("evil.com", "*.example.com"));
    }

    #[test]
    fn test_wildcard_requires_dot_prefix() {
        assert!(!matches("foo.com", "*foo.com"));
        assert!(!matches("xfoo.com", "*foo.com"));
    }

    #[test]
    fn test_single_label_host_against_wildcard() {
        assert!(!matches("localhost", "*.localhost.com"));
        assert!(matches("localhost", "*.localhost"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!matches("Example.com", "example.com"));
        assert!(!matches("www.Example.com", "*.example.com"));
    }

    #[test]
    fn test_wildcard_in_hostname_is_not_special() {
        assert!(!matches("*.example.com", "www.example.com"));
    }
}
