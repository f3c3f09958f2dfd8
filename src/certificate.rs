//! Parsing of PEM encoded X.509 certificates.

use crate::error::TLSValidationError;
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509};
use serde::Serialize;
use std::ops::Deref;
use tracing::debug;

/// A parsed certificate and the host names it is valid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    /// Subject common name, empty when the subject carries none
    pub subject_cn: String,
    /// Subject CN followed by every DNS Subject Alternative Name, deduplicated,
    /// case preserved as found
    pub valid_host_names: Vec<String>,
    /// Subject organization, "None" when absent
    pub subject_organization: String,
    /// Issuer common name, empty when the issuer carries none
    pub issuer_cn: String,
    /// One-line subject distinguished name
    pub subject: String,
    /// One-line issuer distinguished name
    pub issuer: String,
    pub not_before: Option<String>,
    pub not_after: Option<String>,
    pub validity_days: i32,
    pub is_expired: bool,
    pub cert_sn: String,
    pub cert_ver: String,
    pub cert_alg: String,
    /// The PEM block this certificate was parsed from
    #[serde(skip_serializing)]
    pub raw_pem: String,
}

impl Certificate {
    /// Parses a single PEM encoded server certificate.
    ///
    /// Text surrounding the `BEGIN CERTIFICATE` armor is ignored. Fails with
    /// [`TLSValidationError::MalformedCertificate`] when the block does not
    /// decode as X.509 or when it names no host at all.
    pub fn parse(pem: &str) -> Result<Certificate, TLSValidationError> {
        let certificate = Certificate::decode(pem)?;
        if certificate.valid_host_names.is_empty() {
            return Err(TLSValidationError::MalformedCertificate {
                reason: "certificate has neither a subject common name nor DNS alternative names"
                    .to_string(),
            });
        }
        Ok(certificate)
    }

    /// Decodes a PEM encoded certificate without requiring a host name.
    ///
    /// Issuing CAs often carry only an organization in their subject, so chain
    /// members are read with this and may end up with no `valid_host_names`.
    pub fn decode(pem: &str) -> Result<Certificate, TLSValidationError> {
        let x509 = X509::from_pem(pem.as_bytes()).map_err(|e| {
            TLSValidationError::MalformedCertificate {
                reason: format!("not a PEM encoded X.509 certificate: {}", e),
            }
        })?;
        Certificate::from_x509(&x509, pem)
    }

    fn from_x509(x509: &X509, pem: &str) -> Result<Certificate, TLSValidationError> {
        let subject_cn = name_entry(x509.subject_name(), Nid::COMMONNAME)?.unwrap_or_default();
        let issuer_cn = name_entry(x509.issuer_name(), Nid::COMMONNAME)?.unwrap_or_default();
        let subject_organization = name_entry(x509.subject_name(), Nid::ORGANIZATIONNAME)?
            .unwrap_or_else(|| String::from("None"));

        let mut valid_host_names: Vec<String> = Vec::new();
        if !subject_cn.is_empty() {
            valid_host_names.push(subject_cn.clone());
        }
        if let Some(sans) = x509.subject_alt_names() {
            for san in sans.iter() {
                if let Some(dns) = san.dnsname() {
                    if !valid_host_names.iter().any(|known| known == dns) {
                        valid_host_names.push(dns.to_string());
                    }
                }
            }
        }
        let not_after = x509.not_after();
        let certificate = Certificate {
            subject_cn,
            valid_host_names,
            subject_organization,
            issuer_cn,
            subject: one_line(x509.subject_name()),
            issuer: one_line(x509.issuer_name()),
            not_before: Some(x509.not_before().to_string()),
            not_after: Some(not_after.to_string()),
            validity_days: validity_days(not_after)?,
            is_expired: has_expired(not_after)?,
            cert_sn: x509.serial_number().to_bn()?.to_string(),
            cert_ver: x509.version().to_string(),
            cert_alg: x509.signature_algorithm().object().to_string(),
            raw_pem: pem.trim().to_string(),
        };
        debug!(
            subject = %certificate.subject,
            names = ?certificate.valid_host_names,
            "parsed certificate"
        );
        Ok(certificate)
    }

    /// True when the subject and issuer names are identical.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}

fn name_entry(name: &X509NameRef, nid: Nid) -> Result<Option<String>, TLSValidationError> {
    match name.entries_by_nid(nid).next() {
        Some(entry) => {
            let label = nid.short_name().unwrap_or("name entry");
            let value = entry.data().as_utf8().map_err(|e| {
                TLSValidationError::MalformedCertificate {
                    reason: format!("{} is not valid text: {}", label, e),
                }
            })?;
            Ok(Some(value.to_string()))
        }
        None => Ok(None),
    }
}

fn one_line(name: &X509NameRef) -> String {
    name.entries()
        .map(|entry| {
            let key = entry.object().nid().short_name().unwrap_or("?");
            let value = entry
                .data()
                .as_utf8()
                .map(|v| v.to_string())
                .unwrap_or_default();
            format!("{}={}", key, value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn validity_days(not_after: &Asn1TimeRef) -> Result<i32, TLSValidationError> {
    Ok(Asn1Time::days_from_now(0)?.deref().diff(not_after)?.days)
}

fn has_expired(not_after: &Asn1TimeRef) -> Result<bool, TLSValidationError> {
    Ok(not_after < Asn1Time::days_from_now(0)?)
}
