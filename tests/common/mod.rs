//! Certificate minting and in-memory connectors shared by the integration tests.
#![allow(dead_code)]

use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use tlsnamecheck::{Connector, TLSValidationError, TlsSession};

pub struct Issued {
    pub cert: X509,
    pub key: PKey<Private>,
}

impl Issued {
    pub fn pem(&self) -> String {
        String::from_utf8(self.cert.to_pem().unwrap()).unwrap()
    }
}

fn new_key() -> PKey<Private> {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap()
}

fn build(
    cn: Option<&str>,
    sans: &[&str],
    issuer: Option<&Issued>,
    ca: bool,
    not_before: Asn1Time,
    not_after: Asn1Time,
) -> Issued {
    let key = new_key();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Test Org")
        .unwrap();
    if let Some(cn) = cn {
        name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    }
    let name = name.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_version(2).unwrap();
    let mut serial = BigNum::new().unwrap();
    serial.rand(64, MsbOption::MAYBE_ZERO, false).unwrap();
    builder
        .set_serial_number(&serial.to_asn1_integer().unwrap())
        .unwrap();
    builder.set_subject_name(&name).unwrap();
    match issuer {
        Some(issuer) => builder.set_issuer_name(issuer.cert.subject_name()).unwrap(),
        None => builder.set_issuer_name(&name).unwrap(),
    }
    builder.set_pubkey(&key).unwrap();
    builder.set_not_before(&not_before).unwrap();
    builder.set_not_after(&not_after).unwrap();

    if ca {
        builder
            .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
            .unwrap();
    }
    if !sans.is_empty() {
        let mut san = SubjectAlternativeName::new();
        for name in sans {
            san.dns(name);
        }
        let extension = san.build(&builder.x509v3_context(None, None)).unwrap();
        builder.append_extension(extension).unwrap();
    }

    let signing_key = match issuer {
        Some(issuer) => &issuer.key,
        None => &key,
    };
    builder.sign(signing_key, MessageDigest::sha256()).unwrap();

    Issued {
        cert: builder.build(),
        key,
    }
}

/// End-entity certificate valid for 90 days, self-signed when `issuer` is None.
pub fn issue(cn: Option<&str>, sans: &[&str], issuer: Option<&Issued>) -> Issued {
    build(
        cn,
        sans,
        issuer,
        false,
        Asn1Time::days_from_now(0).unwrap(),
        Asn1Time::days_from_now(90).unwrap(),
    )
}

/// CA certificate valid for a year, self-signed when `issuer` is None.
pub fn authority(cn: &str, issuer: Option<&Issued>) -> Issued {
    build(
        Some(cn),
        &[],
        issuer,
        true,
        Asn1Time::days_from_now(0).unwrap(),
        Asn1Time::days_from_now(365).unwrap(),
    )
}

/// Self-signed certificate that expired in 2004.
pub fn expired(cn: &str) -> Issued {
    build(
        Some(cn),
        &[],
        None,
        false,
        Asn1Time::from_unix(1_000_000_000).unwrap(),
        Asn1Time::from_unix(1_090_000_000).unwrap(),
    )
}

/// Root, intermediate and a leaf for `sans`, returned leaf first.
pub fn chain(leaf_cn: &str, sans: &[&str]) -> (Issued, Issued, Issued) {
    let root = authority("Test Root CA", None);
    let intermediate = authority("Test Intermediate CA", Some(&root));
    let leaf = issue(Some(leaf_cn), sans, Some(&intermediate));
    (leaf, intermediate, root)
}

/// Connector answering every handshake with fixed certificates.
#[derive(Debug)]
pub struct StaticConnector {
    pub certificates: Vec<String>,
    pub fail: bool,
    pub calls: Cell<usize>,
    pub seen: RefCell<Vec<(String, u16, Option<PathBuf>)>>,
}

impl StaticConnector {
    pub fn presenting(certificates: Vec<String>) -> Self {
        StaticConnector {
            certificates,
            fail: false,
            calls: Cell::new(0),
            seen: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        StaticConnector {
            fail: true,
            ..StaticConnector::presenting(Vec::new())
        }
    }
}

impl Connector for StaticConnector {
    fn handshake(
        &self,
        host: &str,
        port: u16,
        trusted_ca_file: Option<&Path>,
    ) -> Result<TlsSession, TLSValidationError> {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push((
            host.to_string(),
            port,
            trusted_ca_file.map(Path::to_path_buf),
        ));
        if self.fail {
            return Err(TLSValidationError::ConnectionFailed {
                address: format!("{}:{}", host, port),
                reason: "connection refused".to_string(),
            });
        }
        Ok(TlsSession {
            host: host.to_string(),
            port,
            peer_certificates: self.certificates.clone(),
            cipher: None,
            trusted: trusted_ca_file.is_some(),
            verify_result: "ok".to_string(),
        })
    }
}
