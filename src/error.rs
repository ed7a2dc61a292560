// =============================================================================
// Dashboard errors
// =============================================================================
//
// Three families of failure reach a container:
//   - transport:  the backend answered with a non-2xx status or not at all
//   - payload:    the body parsed but has the wrong shape (missing / empty /
//                 malformed arrays)
//   - lookup:     a container or the config element does not exist
//
// None of them are retried. The controller logs them and writes the localized
// text from `user_message` into the affected container.
// =============================================================================

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use crate::i18n::{self, Msg};
use crate::types::Locale;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The backend responded with a non-success status.
    #[error("HTTP error! status: {status} ({url})")]
    Http { status: u16, url: String },

    /// The request never produced a response (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not have the expected shape.
    #[error("unexpected payload: {0}")]
    Payload(String),

    /// A named container is not registered on the page.
    #[error("container '{0}' not found")]
    MissingContainer(String),

    /// The `data-config` element (or one of its attributes) is missing.
    #[error("config element missing: {0}")]
    MissingConfig(String),

    #[error("invalid resolution: {0}")]
    InvalidResolution(String),
}

/// Coarse classification used for logging and HTTP status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Payload,
    Lookup,
    Request,
}

impl DashboardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Http { .. } | Self::Network(_) => ErrorKind::Transport,
            Self::Payload(_) => ErrorKind::Payload,
            Self::MissingContainer(_) | Self::MissingConfig(_) => ErrorKind::Lookup,
            Self::InvalidResolution(_) => ErrorKind::Request,
        }
    }

    /// Text shown inside a container when a load fails. `fallback` names the
    /// failed operation ("Failed to load order book", ...).
    pub fn user_message(&self, locale: Locale, fallback: Msg) -> String {
        match self {
            Self::Http { status, .. } => {
                format!("{} (HTTP {status})", i18n::text(locale, fallback))
            }
            Self::MissingContainer(id) => {
                format!("{}: {id}", i18n::text(locale, Msg::ContainerNotFound))
            }
            Self::MissingConfig(what) => {
                format!("{}: {what}", i18n::text(locale, Msg::ConfigNotFound))
            }
            Self::Network(_) | Self::Payload(_) | Self::InvalidResolution(_) => {
                i18n::text(locale, fallback).to_string()
            }
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => Self::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None if e.is_decode() => Self::Payload(e.to_string()),
            None => Self::Network(e.to_string()),
        }
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self.kind() {
            ErrorKind::Transport => StatusCode::BAD_GATEWAY,
            ErrorKind::Payload => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Lookup => StatusCode::NOT_FOUND,
            ErrorKind::Request => StatusCode::BAD_REQUEST,
        };
        let body = json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
