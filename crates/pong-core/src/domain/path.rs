//! # Certification Path
//!
//! A leaf certificate plus the ordered authorities that chain it to a trust
//! root. The wire form is DER:
//!
//! ```text
//! CertificationPath ::= SEQUENCE {
//!     leaf        [0] EXPLICIT Certificate,
//!     authorities [1] IMPLICIT SEQUENCE OF Certificate
//! }
//! ```
//!
//! Elements are read and written with the `asn1-rs` DER types that
//! `x509-parser` is built on.

use super::certificate::{Certificate, CertificateError};
use thiserror::Error;
use x509_parser::der_parser::asn1_rs::{Any, Class, FromDer, Header, Length, Tag, ToDer};

const LEAF_TAG: Tag = Tag(0);
const AUTHORITIES_TAG: Tag = Tag(1);

/// Errors (de)serializing a certification path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The DER structure is broken.
    #[error("Invalid DER structure: {0}")]
    Der(String),

    /// A certificate inside the path is invalid.
    #[error("Invalid certificate in path: {0}")]
    Certificate(#[from] CertificateError),
}

/// A leaf certificate and its chain of authorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificationPath {
    /// End-entity certificate.
    pub leaf: Certificate,
    /// Authorities, issuer of the leaf first.
    pub authorities: Vec<Certificate>,
}

impl CertificationPath {
    /// Create a path.
    #[must_use]
    pub fn new(leaf: Certificate, authorities: Vec<Certificate>) -> Self {
        Self { leaf, authorities }
    }

    /// Serialize to DER.
    pub fn serialize(&self) -> Result<Vec<u8>, PathError> {
        let authorities: Vec<u8> = self
            .authorities
            .iter()
            .flat_map(|c| c.as_der().iter().copied())
            .collect();

        let mut body = encode(Class::ContextSpecific, LEAF_TAG, self.leaf.as_der())?;
        body.extend(encode(Class::ContextSpecific, AUTHORITIES_TAG, &authorities)?);
        encode(Class::Universal, Tag::Sequence, &body)
    }

    /// Deserialize from DER.
    ///
    /// Trailing data is rejected at every level, as is any encoding that is
    /// valid BER but not DER (for instance non-minimal lengths).
    pub fn deserialize(der: &[u8]) -> Result<Self, PathError> {
        let (rest, outer) = read_element(der, Class::Universal, Tag::Sequence)?;
        ensure_consumed(rest, "path")?;

        let (rest, leaf) = read_element(outer.data, Class::ContextSpecific, LEAF_TAG)?;
        let (rest, authorities) = read_element(rest, Class::ContextSpecific, AUTHORITIES_TAG)?;
        ensure_consumed(rest, "path body")?;

        let leaf = Certificate::from_der(leaf.data)?;

        let mut chain = Vec::new();
        let mut remaining = authorities.data;
        while !remaining.is_empty() {
            let (rest, _) = read_element(remaining, Class::Universal, Tag::Sequence)?;
            let element = &remaining[..remaining.len() - rest.len()];
            chain.push(Certificate::from_der(element)?);
            remaining = rest;
        }

        let path = Self::new(leaf, chain);
        // Certificates are kept verbatim, so only a non-canonical header differs
        if path.serialize()? != der {
            return Err(PathError::Der("path is not DER-encoded".to_string()));
        }
        Ok(path)
    }
}

fn read_element(input: &[u8], class: Class, tag: Tag) -> Result<(&[u8], Any<'_>), PathError> {
    let (rest, element) = Any::from_der(input).map_err(|e| PathError::Der(e.to_string()))?;
    if element.class() != class || element.tag() != tag {
        return Err(PathError::Der(format!(
            "expected {class} tag {}, found {} tag {}",
            tag.0,
            element.class(),
            element.tag().0
        )));
    }
    Ok((rest, element))
}

fn encode(class: Class, tag: Tag, content: &[u8]) -> Result<Vec<u8>, PathError> {
    let header = Header::new(class, true, tag, Length::Definite(content.len()));
    Any::new(header, content)
        .to_der_vec()
        .map_err(|e| PathError::Der(e.to_string()))
}

fn ensure_consumed(rest: &[u8], what: &str) -> Result<(), PathError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(PathError::Der(format!(
            "{} trailing octets after {what}",
            rest.len()
        )))
    }
}
