//! # HTTP Binding
//!
//! CloudEvents HTTP protocol binding, binary content mode: attributes travel
//! as `ce-*` headers and the payload is the raw request body, with
//! `Content-Type` carrying `datacontenttype`.

use crate::events::CloudEvent;
use crate::SPEC_VERSION;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderName, HeaderValue};
use thiserror::Error;

const CE_SPECVERSION: &str = "ce-specversion";
const CE_ID: &str = "ce-id";
const CE_SOURCE: &str = "ce-source";
const CE_TYPE: &str = "ce-type";
const CE_SUBJECT: &str = "ce-subject";
const CE_TIME: &str = "ce-time";

/// Errors decoding or encoding a binary-mode CloudEvent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// A required attribute header is absent.
    #[error("Missing CloudEvent attribute {0}")]
    MissingAttribute(&'static str),

    /// An attribute header is present but unusable.
    #[error("Invalid CloudEvent attribute {name}: {reason}")]
    InvalidAttribute {
        /// Header name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The event uses a spec version other than 1.0.
    #[error("Unsupported CloudEvents spec version {0}")]
    UnsupportedSpecVersion(String),
}

fn optional_header(headers: &HeaderMap, name: &'static str) -> Result<Option<String>, BindingError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.to_string()))
            .map_err(|e| BindingError::InvalidAttribute {
                name,
                reason: e.to_string(),
            }),
    }
}

fn required_header(headers: &HeaderMap, name: &'static str) -> Result<String, BindingError> {
    match optional_header(headers, name)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(BindingError::MissingAttribute(name)),
    }
}

/// Decode a binary-mode CloudEvent from request headers and body.
pub fn decode_binary(headers: &HeaderMap, body: Bytes) -> Result<CloudEvent, BindingError> {
    let spec_version = required_header(headers, CE_SPECVERSION)?;
    if spec_version != SPEC_VERSION {
        return Err(BindingError::UnsupportedSpecVersion(spec_version));
    }

    let time = optional_header(headers, CE_TIME)?
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| BindingError::InvalidAttribute {
                    name: CE_TIME,
                    reason: e.to_string(),
                })
        })
        .transpose()?;

    Ok(CloudEvent {
        id: required_header(headers, CE_ID)?,
        source: required_header(headers, CE_SOURCE)?,
        event_type: required_header(headers, CE_TYPE)?,
        subject: optional_header(headers, CE_SUBJECT)?,
        datacontenttype: optional_header(headers, "content-type")?,
        time,
        data: body.to_vec(),
    })
}

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue, BindingError> {
    HeaderValue::from_str(value).map_err(|e| BindingError::InvalidAttribute {
        name,
        reason: e.to_string(),
    })
}

/// Encode a CloudEvent into binary-mode headers and body.
pub fn encode_binary(event: &CloudEvent) -> Result<(HeaderMap, Bytes), BindingError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(CE_SPECVERSION),
        HeaderValue::from_static(SPEC_VERSION),
    );
    headers.insert(HeaderName::from_static(CE_ID), header_value(CE_ID, &event.id)?);
    headers.insert(
        HeaderName::from_static(CE_SOURCE),
        header_value(CE_SOURCE, &event.source)?,
    );
    headers.insert(
        HeaderName::from_static(CE_TYPE),
        header_value(CE_TYPE, &event.event_type)?,
    );
    if let Some(subject) = &event.subject {
        headers.insert(
            HeaderName::from_static(CE_SUBJECT),
            header_value(CE_SUBJECT, subject)?,
        );
    }
    if let Some(time) = &event.time {
        headers.insert(
            HeaderName::from_static(CE_TIME),
            header_value(CE_TIME, &time.to_rfc3339())?,
        );
    }
    if let Some(content_type) = &event.datacontenttype {
        headers.insert(CONTENT_TYPE, header_value("content-type", content_type)?);
    }

    Ok((headers, Bytes::from(event.data.clone())))
}
