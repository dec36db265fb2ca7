//! HTTP routes.
//!
//! Both generations serve a single path, `/`:
//!
//! | Method | Response |
//! |--------|----------|
//! | `GET` / `HEAD` | plain-text banner (liveness) |
//! | `POST` | ping ingress |
//! | anything else | `405` with `Allow: GET, HEAD, POST` |

pub mod events;
pub mod parcels;

use crate::domain::ApiError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Liveness banner
pub const BANNER: &str = "Success! This is the Awala pong service.";

const ALLOWED_METHODS: &str = "GET, HEAD, POST";

async fn banner() -> &'static str {
    BANNER
}

async fn method_not_allowed() -> Response {
    (
        [(header::ALLOW, ALLOWED_METHODS)],
        ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
    )
        .into_response()
}
