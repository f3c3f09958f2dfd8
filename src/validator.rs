//! Hostname validation of the certificate served by an HTTPS endpoint.
//!
//! A [`Validator`] owns one endpoint and at most one TLS session. The first
//! certificate request connects lazily; after a failed attempt certificates
//! are unavailable until [`Validator::connect`] is called again.

use crate::certificate::Certificate;
use crate::chain::{AsPresented, CertificateChain, ChainBuilder};
use crate::endpoint::Endpoint;
use crate::error::TLSValidationError;
use crate::matcher::is_certificate_valid_for_hostname;
use crate::session::{Cipher, Connector, OpenSslConnector, TlsSession};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Where the endpoint's session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected(TlsSession),
    Failed(String),
}

/// Everything learned about one endpoint, ready for output.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub url: String,
    pub hostname: String,
    pub port: u16,
    pub valid_for_hostname: bool,
    pub trusted: bool,
    pub verify_result: String,
    pub cipher: Option<Cipher>,
    pub certificate: Certificate,
    pub chain: Vec<Certificate>,
}

/// Checks whether an endpoint's certificate covers the endpoint's hostname.
#[derive(Debug)]
pub struct Validator<C = OpenSslConnector> {
    endpoint: Endpoint,
    connector: C,
    state: SessionState,
}

impl Validator<OpenSslConnector> {
    /// Builds a validator that connects with OpenSSL and default timeouts.
    pub fn new(url: &str) -> Result<Self, TLSValidationError> {
        Self::with_connector(url, OpenSslConnector::default())
    }
}

impl<C: Connector> Validator<C> {
    pub fn with_connector(url: &str, connector: C) -> Result<Self, TLSValidationError> {
        Ok(Validator {
            endpoint: Endpoint::parse(url)?,
            connector,
            state: SessionState::Unconnected,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Sets the trust anchor for the next connection attempt.
    pub fn set_trusted_ca_file<P: Into<PathBuf>>(&mut self, file: P) -> &mut Self {
        self.endpoint.set_trusted_ca_file(file);
        self
    }

    /// Opens a fresh session, replacing any previous one.
    ///
    /// On failure the state becomes [`SessionState::Failed`] and the error is
    /// returned to the caller; nothing is retried.
    pub fn connect(&mut self) -> Result<&TlsSession, TLSValidationError> {
        self.endpoint.require_https()?;
        let port = self.endpoint.port().unwrap_or(443);
        debug!(url = self.endpoint.url(), port, "opening TLS session");

        match self.connector.handshake(
            self.endpoint.host(),
            port,
            self.endpoint.trusted_ca_file(),
        ) {
            Ok(session) => {
                self.state = SessionState::Connected(session);
                self.session()
            }
            Err(e) => {
                self.state = SessionState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// The current session, without connecting.
    pub fn session(&self) -> Result<&TlsSession, TLSValidationError> {
        match &self.state {
            SessionState::Connected(session) => Ok(session),
            SessionState::Unconnected | SessionState::Failed(_) => {
                Err(TLSValidationError::NoActiveSession {
                    url: self.endpoint.url().to_string(),
                })
            }
        }
    }

    /// Parses the leaf certificate, connecting first if no attempt was made yet.
    pub fn server_certificate(&mut self) -> Result<Certificate, TLSValidationError> {
        if matches!(self.state, SessionState::Unconnected) {
            self.connect()?;
        }
        let session = self.session()?;
        let pem = session
            .leaf_pem()
            .ok_or_else(|| TLSValidationError::MalformedCertificate {
                reason: format!("{} presented no certificate", session.address()),
            })?;
        Certificate::parse(pem)
    }

    /// The presented chain in presentation order. Never connects.
    pub fn server_certificate_chain(&self) -> Result<CertificateChain, TLSValidationError> {
        self.server_certificate_chain_with(&AsPresented)
    }

    /// The presented chain ordered by `builder`. Never connects.
    pub fn server_certificate_chain_with<B: ChainBuilder + ?Sized>(
        &self,
        builder: &B,
    ) -> Result<CertificateChain, TLSValidationError> {
        let session = self.session()?;
        CertificateChain::from_pem_blocks(&session.peer_certificates, builder)
    }

    /// True when the leaf certificate covers the endpoint's hostname.
    ///
    /// A certificate that does not cover the host is `Ok(false)`; errors are
    /// reserved for non-https endpoints, connection and parsing failures.
    pub fn is_certificate_valid_for_url_hostname(&mut self) -> Result<bool, TLSValidationError> {
        self.endpoint.require_https()?;
        let certificate = self.server_certificate()?;
        Ok(is_certificate_valid_for_hostname(
            self.endpoint.host(),
            &certificate,
        ))
    }

    /// Validates the hostname and collects certificate and session details.
    pub fn report<B: ChainBuilder + ?Sized>(
        &mut self,
        builder: &B,
    ) -> Result<ValidationReport, TLSValidationError> {
        self.endpoint.require_https()?;
        let certificate = self.server_certificate()?;
        let valid_for_hostname =
            is_certificate_valid_for_hostname(self.endpoint.host(), &certificate);
        let chain = self.server_certificate_chain_with(builder)?;
        let session = self.session()?;

        Ok(ValidationReport {
            url: self.endpoint.url().to_string(),
            hostname: self.endpoint.host().to_string(),
            port: session.port,
            valid_for_hostname,
            trusted: session.trusted,
            verify_result: session.verify_result.clone(),
            cipher: session.cipher.clone(),
            certificate,
            chain: chain.into_vec(),
        })
    }
}
