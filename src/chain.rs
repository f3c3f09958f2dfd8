//! Certificate chains and the ordering strategies that build them.
//!
//! No signature is checked here. Ordering is decided purely on names, and
//! trust is left to the TLS library's own verify result.

use crate::certificate::Certificate;
use crate::error::TLSValidationError;
use serde::Serialize;
use tracing::debug;

/// Certificates ordered leaf first, ascending toward the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateChain {
    certificates: Vec<Certificate>,
}

impl CertificateChain {
    /// Decodes every PEM block, failing on the first one that is not X.509,
    /// and lets `builder` order the result. Members naming no host are kept.
    pub fn from_pem_blocks<S, B>(blocks: &[S], builder: &B) -> Result<Self, TLSValidationError>
    where
        S: AsRef<str>,
        B: ChainBuilder + ?Sized,
    {
        let certificates = blocks
            .iter()
            .map(|block| Certificate::decode(block.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(builder.build(certificates))
    }

    pub fn leaf(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn root(&self) -> Option<&Certificate> {
        self.certificates.last()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }

    pub fn into_vec(self) -> Vec<Certificate> {
        self.certificates
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

/// Turns a flat list of parsed certificates into an ordered chain.
pub trait ChainBuilder {
    fn build(&self, certificates: Vec<Certificate>) -> CertificateChain;
}

/// Keeps certificates in the order the peer presented them.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsPresented;

impl ChainBuilder for AsPresented {
    fn build(&self, certificates: Vec<Certificate>) -> CertificateChain {
        CertificateChain { certificates }
    }
}

/// Orders certificates leaf to root by following issuer names.
///
/// The first certificate is taken as the leaf. Each next link is the unused
/// certificate whose subject equals the current issuer; the walk stops at a
/// self-issued certificate or when no issuer is found. Certificates never
/// reached keep their relative order after the linked ones.
#[derive(Debug, Default, Clone, Copy)]
pub struct IssuerOrdered;

impl ChainBuilder for IssuerOrdered {
    fn build(&self, certificates: Vec<Certificate>) -> CertificateChain {
        let mut remaining: Vec<Option<Certificate>> = certificates.into_iter().map(Some).collect();
        let mut ordered = Vec::with_capacity(remaining.len());

        let mut current = remaining.first_mut().and_then(Option::take);
        while let Some(certificate) = current {
            let next = if certificate.is_self_issued() {
                None
            } else {
                remaining
                    .iter_mut()
                    .find(|slot| {
                        slot.as_ref()
                            .map_or(false, |candidate| candidate.subject == certificate.issuer)
                    })
                    .and_then(Option::take)
            };
            ordered.push(certificate);
            current = next;
        }

        let linked = ordered.len();
        ordered.extend(remaining.into_iter().flatten());
        debug!(
            linked,
            unlinked = ordered.len() - linked,
            "ordered certificate chain by issuer"
        );
        CertificateChain {
            certificates: ordered,
        }
    }
}
