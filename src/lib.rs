//! Checks whether the TLS certificate served by an HTTPS endpoint is valid
//! for the endpoint's hostname.
//!
//! ```no_run
//! use tlsnamecheck::Validator;
//!
//! let mut validator = Validator::new("https://www.example.com")?;
//! if validator.is_certificate_valid_for_url_hostname()? {
//!     println!("certificate covers {}", validator.endpoint().host());
//! }
//! # Ok::<(), tlsnamecheck::TLSValidationError>(())
//! ```

pub mod certificate;
pub mod chain;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod session;
pub mod validator;

pub use certificate::Certificate;
pub use chain::{AsPresented, CertificateChain, ChainBuilder, IssuerOrdered};
pub use endpoint::Endpoint;
pub use error::TLSValidationError;
pub use extract::{extract_certificates, pem_certificates};
pub use matcher::{is_certificate_valid_for_hostname, matches};
pub use session::{Cipher, Connector, OpenSslConnector, PeerOutputConnector, TlsSession};
pub use validator::{SessionState, ValidationReport, Validator};
