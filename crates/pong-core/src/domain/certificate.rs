//! X.509 certificates as carried inside pings and parcels.

use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use x509_parser::prelude::*;

/// Errors parsing a DER-encoded certificate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// The bytes are not an X.509 certificate.
    #[error("Certificate is not DER-encoded X.509: {0}")]
    Malformed(String),

    /// A certificate was followed by unexpected data.
    #[error("Certificate is followed by {0} trailing octets")]
    TrailingBytes(usize),
}

/// A validated DER-encoded X.509 certificate.
///
/// The DER bytes are kept verbatim so re-serialization is lossless.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Certificate {
    der: Vec<u8>,
    private_address: String,
}

impl Certificate {
    /// Parse a certificate, rejecting anything after it.
    pub fn from_der(der: &[u8]) -> Result<Self, CertificateError> {
        let (remainder, parsed) = X509Certificate::from_der(der)
            .map_err(|e| CertificateError::Malformed(e.to_string()))?;
        if !remainder.is_empty() {
            return Err(CertificateError::TrailingBytes(remainder.len()));
        }

        let private_address = private_address_from_spki(parsed.public_key().raw);
        Ok(Self {
            der: der.to_vec(),
            private_address,
        })
    }

    /// The DER encoding.
    #[must_use]
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// Consume the certificate, returning its DER encoding.
    #[must_use]
    pub fn into_der(self) -> Vec<u8> {
        self.der
    }

    /// Private address of the subject: `0` followed by the hex SHA-256 digest
    /// of its DER-encoded public key.
    #[must_use]
    pub fn private_address(&self) -> &str {
        &self.private_address
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("private_address", &self.private_address)
            .field("len", &self.der.len())
            .finish()
    }
}

/// Compute the private address for a DER-encoded `SubjectPublicKeyInfo`.
#[must_use]
pub fn private_address_from_spki(spki_der: &[u8]) -> String {
    format!("0{}", hex::encode(Sha256::digest(spki_der)))
}

/// Whether `address` has the shape of a private address.
#[must_use]
pub fn is_private_address(address: &str) -> bool {
    address.len() == 65
        && address.starts_with('0')
        && address[1..].bytes().all(|b| b.is_ascii_hexdigit())
}
