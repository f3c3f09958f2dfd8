//! TLS sessions and the connectors that open them.
//!
//! A [`Connector`] performs exactly one handshake per call and returns the
//! certificates the peer presented. The network connection never outlives
//! the call.

use crate::error::TLSValidationError;
use crate::extract::{extract_certificates, join_certificates, pem_certificates};
use openssl::ssl::{Ssl, SslContext, SslMethod, SslVerifyMode};
use openssl::x509::X509VerifyResult;
use serde::Serialize;
use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Default connect/read timeout in seconds.
pub const DEFAULT_TIMEOUT: u64 = 30;

/// The negotiated cipher suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cipher {
    pub name: String,
    pub version: String,
}

/// The outcome of one completed handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TlsSession {
    pub host: String,
    pub port: u16,
    /// PEM blocks exactly as presented by the peer, leaf first
    #[serde(skip_serializing)]
    pub peer_certificates: Vec<String>,
    pub cipher: Option<Cipher>,
    /// Whether the TLS library trusted the presented chain
    pub trusted: bool,
    /// Human readable verify result from the TLS library
    pub verify_result: String,
}

impl TlsSession {
    /// PEM of the leaf certificate, when the peer sent any.
    pub fn leaf_pem(&self) -> Option<&str> {
        self.peer_certificates.first().map(String::as_str)
    }

    /// The presented certificates as a `---` delimited dump.
    pub fn peer_output(&self) -> String {
        join_certificates(&self.peer_certificates)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Performs a TLS handshake and captures the peer certificates.
pub trait Connector {
    /// Opens one handshake to `host:port`.
    ///
    /// `trusted_ca_file` only influences [`TlsSession::trusted`]; the
    /// certificates are captured either way.
    fn handshake(
        &self,
        host: &str,
        port: u16,
        trusted_ca_file: Option<&Path>,
    ) -> Result<TlsSession, TLSValidationError>;
}

impl<C: Connector + ?Sized> Connector for &C {
    fn handshake(
        &self,
        host: &str,
        port: u16,
        trusted_ca_file: Option<&Path>,
    ) -> Result<TlsSession, TLSValidationError> {
        (**self).handshake(host, port, trusted_ca_file)
    }
}

/// Native handshake over TCP with OpenSSL.
#[derive(Debug, Clone)]
pub struct OpenSslConnector {
    timeout: Duration,
}

impl Default for OpenSslConnector {
    fn default() -> Self {
        OpenSslConnector::new(Duration::from_secs(DEFAULT_TIMEOUT))
    }
}

impl OpenSslConnector {
    pub fn new(timeout: Duration) -> Self {
        OpenSslConnector { timeout }
    }

    fn context(&self, trusted_ca_file: Option<&Path>) -> Result<SslContext, TLSValidationError> {
        let mut context = SslContext::builder(SslMethod::tls())?;
        // The chain is always captured; the verify result is read afterwards.
        context.set_verify(SslVerifyMode::NONE);
        match trusted_ca_file {
            Some(path) => {
                context
                    .set_ca_file(path)
                    .map_err(|e| TLSValidationError::InvalidInput {
                        field: "trusted_ca_file".to_string(),
                        reason: format!("cannot load '{}': {}", path.display(), e),
                    })?;
            }
            None => context.set_default_verify_paths()?,
        }
        Ok(context.build())
    }
}

impl Connector for OpenSslConnector {
    fn handshake(
        &self,
        host: &str,
        port: u16,
        trusted_ca_file: Option<&Path>,
    ) -> Result<TlsSession, TLSValidationError> {
        let context = self.context(trusted_ca_file)?;
        let mut ssl = Ssl::new(&context)?;
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        if bare_host.parse::<IpAddr>().is_err() {
            ssl.set_hostname(bare_host)?;
        }

        let address = format!("{}:{}", host, port);
        let connection_failed = |reason: String| TLSValidationError::ConnectionFailed {
            address: address.clone(),
            reason,
        };

        let socket_addr = address
            .to_socket_addrs()
            .map_err(|e| connection_failed(format!("couldn't resolve host address: {}", e)))?
            .next()
            .ok_or_else(|| connection_failed("host resolved to no address".to_string()))?;

        debug!(%address, %socket_addr, timeout = ?self.timeout, "connecting");
        let tcp_stream = TcpStream::connect_timeout(&socket_addr, self.timeout)
            .map_err(|e| connection_failed(e.to_string()))?;
        tcp_stream.set_read_timeout(Some(self.timeout))?;
        tcp_stream.set_write_timeout(Some(self.timeout))?;

        let mut stream = ssl.connect(tcp_stream).map_err(|e| {
            warn!(%address, error = %e, "TLS handshake failed");
            connection_failed(format!("TLS handshake failed: {}", e))
        })?;

        let ssl = stream.ssl();
        let mut peer_certificates = Vec::new();
        if let Some(chain) = ssl.peer_cert_chain() {
            for certificate in chain.iter() {
                peer_certificates.push(pem_string(certificate.to_pem()?)?);
            }
        }
        if peer_certificates.is_empty() {
            if let Some(certificate) = ssl.peer_certificate() {
                peer_certificates.push(pem_string(certificate.to_pem()?)?);
            }
        }

        let verify = ssl.verify_result();
        let cipher = ssl.current_cipher().map(|c| Cipher {
            name: c.name().to_string(),
            version: c.version().to_string(),
        });
        let session = TlsSession {
            host: host.to_string(),
            port,
            peer_certificates,
            cipher,
            trusted: verify == X509VerifyResult::OK,
            verify_result: verify.error_string().to_string(),
        };

        if let Err(e) = stream.shutdown() {
            debug!(%address, error = %e, "close_notify not delivered");
        }
        debug!(
            %address,
            certificates = session.peer_certificates.len(),
            trusted = session.trusted,
            "handshake complete"
        );
        Ok(session)
    }
}

fn pem_string(pem: Vec<u8>) -> Result<String, TLSValidationError> {
    String::from_utf8(pem).map_err(|e| TLSValidationError::MalformedCertificate {
        reason: format!("PEM output is not UTF-8: {}", e),
    })
}

/// Replays a captured peer-output dump instead of connecting.
///
/// Every certificate armor found in the dump is presented in order, with
/// exact duplicates dropped. Such a session is never trusted since no
/// handshake took place.
#[derive(Debug, Clone)]
pub struct PeerOutputConnector {
    output: String,
}

impl PeerOutputConnector {
    pub fn new<S: Into<String>>(output: S) -> Self {
        PeerOutputConnector {
            output: output.into(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TLSValidationError> {
        let output = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            TLSValidationError::InvalidInput {
                field: "peer_output".to_string(),
                reason: format!("cannot read '{}': {}", path.as_ref().display(), e),
            }
        })?;
        Ok(PeerOutputConnector::new(output))
    }
}

impl Connector for PeerOutputConnector {
    fn handshake(
        &self,
        host: &str,
        port: u16,
        _trusted_ca_file: Option<&Path>,
    ) -> Result<TlsSession, TLSValidationError> {
        let mut peer_certificates: Vec<String> = Vec::new();
        for block in extract_certificates(&self.output) {
            for pem in pem_certificates(&block) {
                if !peer_certificates.contains(&pem) {
                    peer_certificates.push(pem);
                }
            }
        }
        if peer_certificates.is_empty() {
            return Err(TLSValidationError::ConnectionFailed {
                address: format!("{}:{}", host, port),
                reason: "captured peer output contains no certificate".to_string(),
            });
        }

        Ok(TlsSession {
            host: host.to_string(),
            port,
            peer_certificates,
            cipher: None,
            trusted: false,
            verify_result: "not verified, replayed from captured output".to_string(),
        })
    }
}
