//! Error types for TLS hostname validation.
//!
//! Every failure is returned to the immediate caller. Nothing in the library
//! retries, and a certificate that does not cover the hostname is a normal
//! `false` result rather than an error.

use std::fmt;
use std::io;

/// Error type for endpoint, session and certificate failures.
#[derive(Debug)]
pub enum TLSValidationError {
    /// The input string is not a usable absolute URL
    UnparsableUrl {
        /// The rejected input
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// A hostname check was requested for an endpoint that is not https
    NotHttps {
        /// The endpoint URL
        url: String,
        /// The scheme found in the URL
        scheme: String,
    },

    /// The TLS handshake could not be completed
    ConnectionFailed {
        /// The address (host:port) the handshake was attempted against
        address: String,
        /// Resolution, TCP, timeout or TLS negotiation failure details
        reason: String,
    },

    /// A PEM block could not be decoded into a certificate
    MalformedCertificate {
        /// Description of what went wrong
        reason: String,
    },

    /// Certificates were requested without a successful connection
    NoActiveSession {
        /// The endpoint URL
        url: String,
    },

    /// Invalid input provided to the API
    InvalidInput {
        /// Which field/parameter was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },

    /// OpenSSL error occurred
    OpenSSLError {
        /// The underlying OpenSSL error
        details: String,
    },

    /// Generic I/O error
    IoError {
        /// The underlying I/O error
        source: io::Error,
    },
}

impl fmt::Display for TLSValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnparsableUrl { url, reason } => {
                write!(f, "Url '{}' is not a valid URL: {}", url, reason)
            }
            Self::NotHttps { url, scheme } => {
                write!(
                    f,
                    "Url '{}' uses scheme '{}', only https endpoints can be checked",
                    url, scheme
                )
            }
            Self::ConnectionFailed { address, reason } => {
                write!(f, "Connection failed to: {}. {}", address, reason)
            }
            Self::MalformedCertificate { reason } => {
                write!(f, "Malformed certificate: {}", reason)
            }
            Self::NoActiveSession { url } => {
                write!(
                    f,
                    "No active TLS session for '{}'. Connect successfully before requesting certificates.",
                    url
                )
            }
            Self::InvalidInput { field, reason } => {
                write!(f, "Invalid input for '{}': {}", field, reason)
            }
            Self::OpenSSLError { details } => {
                write!(f, "OpenSSL error: {}", details)
            }
            Self::IoError { source } => {
                write!(f, "I/O error: {}", source)
            }
        }
    }
}

impl std::error::Error for TLSValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError { source } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for TLSValidationError {
    fn from(e: io::Error) -> Self {
        Self::IoError { source: e }
    }
}

impl From<openssl::error::ErrorStack> for TLSValidationError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSLError {
            details: e.to_string(),
        }
    }
}
