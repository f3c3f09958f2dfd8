//! Endpoints parsed from URL strings.

use crate::error::TLSValidationError;
use std::path::{Path, PathBuf};
use url::Url;

const HTTPS: &str = "https";

/// A remote endpoint identified by an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    raw_url: String,
    scheme: String,
    host: String,
    port: Option<u16>,
    trusted_ca_file: Option<PathBuf>,
}

impl Endpoint {
    /// Parses `url`, which must be absolute and carry a host.
    pub fn parse(url: &str) -> Result<Endpoint, TLSValidationError> {
        let unparsable = |reason: String| TLSValidationError::UnparsableUrl {
            url: url.to_string(),
            reason,
        };

        let parsed = Url::parse(url.trim()).map_err(|e| unparsable(e.to_string()))?;
        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host_as_written(url.trim(), host),
            _ => return Err(unparsable("URL has no host".to_string())),
        };

        Ok(Endpoint {
            raw_url: url.to_string(),
            scheme: parsed.scheme().to_ascii_lowercase(),
            host,
            port: parsed.port_or_known_default(),
            trusted_ca_file: None,
        })
    }

    pub fn url(&self) -> &str {
        &self.raw_url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Explicit URL port, or the default port of the scheme when known.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn is_https(&self) -> bool {
        self.scheme.eq_ignore_ascii_case(HTTPS)
    }

    pub fn trusted_ca_file(&self) -> Option<&Path> {
        self.trusted_ca_file.as_deref()
    }

    /// Sets the trust anchor used by the next connection attempt.
    pub fn set_trusted_ca_file<P: Into<PathBuf>>(&mut self, file: P) -> &mut Self {
        self.trusted_ca_file = Some(file.into());
        self
    }

    /// Fails with [`TLSValidationError::NotHttps`] unless the scheme is https.
    pub fn require_https(&self) -> Result<(), TLSValidationError> {
        if self.is_https() {
            Ok(())
        } else {
            Err(TLSValidationError::NotHttps {
                url: self.raw_url.clone(),
                scheme: self.scheme.clone(),
            })
        }
    }
}

/// The host exactly as it appears in `raw`, keeping its case.
///
/// `Url` lower-cases hosts of special schemes. The authority is sliced out of
/// the input instead, without userinfo and port. Falls back to `parsed` when
/// the written form is not the same host, e.g. percent-encoded or IDN input.
fn host_as_written(raw: &str, parsed: &str) -> String {
    let authority = raw
        .split_once("://")
        .map(|(_, rest)| rest)
        .and_then(|rest| rest.split(|c: char| c == '/' || c == '?' || c == '#').next())
        .unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();

    let host = if host_port.starts_with('[') {
        match host_port.find(']') {
            Some(end) => &host_port[..=end],
            None => host_port,
        }
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) if port.bytes().all(|b| b.is_ascii_digit()) => host,
            _ => host_port,
        }
    };

    if host.eq_ignore_ascii_case(parsed) {
        host.to_string()
    } else {
        parsed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_url() {
        let endpoint = Endpoint::parse("https://test.example.com/path?q=1").unwrap();
        assert_eq!(endpoint.url(), "https://test.example.com/path?q=1");
        assert_eq!(endpoint.scheme(), "https");
        assert_eq!(endpoint.host(), "test.example.com");
        assert_eq!(endpoint.port(), Some(443));
        assert!(endpoint.is_https());
        assert!(endpoint.trusted_ca_file().is_none());
    }

    #[test]
    fn test_explicit_port() {
        let endpoint = Endpoint::parse("https://example.com:8443").unwrap();
        assert_eq!(endpoint.port(), Some(8443));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let endpoint = Endpoint::parse("HTTPS://example.com").unwrap();
        assert_eq!(endpoint.scheme(), "https");
        assert!(endpoint.is_https());
    }

    #[test]
    fn test_host_keeps_written_case() {
        let endpoint = Endpoint::parse("https://WWW.Example.com/Path").unwrap();
        assert_eq!(endpoint.host(), "WWW.Example.com");

        let endpoint = Endpoint::parse("https://user:pw@Mixed.Example.com:8443?q=1").unwrap();
        assert_eq!(endpoint.host(), "Mixed.Example.com");
        assert_eq!(endpoint.port(), Some(8443));

        let endpoint = Endpoint::parse("https://Api.Example.com#top").unwrap();
        assert_eq!(endpoint.host(), "Api.Example.com");
    }

    #[test]
    fn test_bracketed_and_encoded_hosts() {
        let endpoint = Endpoint::parse("https://[::1]:8443/").unwrap();
        assert_eq!(endpoint.host(), "[::1]");

        let endpoint = Endpoint::parse("https://b%C3%BCcher.example").unwrap();
        assert_eq!(endpoint.host(), "xn--bcher-kva.example");
    }

    #[test]
    fn test_not_a_url() {
        let err = Endpoint::parse("not a url").unwrap_err();
        assert!(matches!(err, TLSValidationError::UnparsableUrl { .. }));
    }

    #[test]
    fn test_url_without_host() {
        let err = Endpoint::parse("mailto:someone@example.com").unwrap_err();
        assert!(matches!(err, TLSValidationError::UnparsableUrl { .. }));
    }

    #[test]
    fn test_http_is_rejected_for_checks() {
        let endpoint = Endpoint::parse("http://example.com").unwrap();
        assert!(!endpoint.is_https());
        assert!(matches!(
            endpoint.require_https(),
            Err(TLSValidationError::NotHttps { .. })
        ));
    }

    #[test]
    fn test_set_trusted_ca_file() {
        let mut endpoint = Endpoint::parse("https://example.com").unwrap();
        endpoint.set_trusted_ca_file("/etc/ssl/ca.pem");
        assert_eq!(endpoint.trusted_ca_file(), Some(Path::new("/etc/ssl/ca.pem")));
    }
}
