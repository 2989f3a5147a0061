//! Error taxonomy for the pipeline.
//!
//! [`EtlError::InvalidArgument`] is raised immediately for bad page ranges,
//! empty inputs and malformed sink parameters. [`FetchError`] describes a
//! failed page download; the catalog scraper logs it and moves on to the
//! next page. Field-level parse failures are not errors at all: they show up
//! as `None` and are filtered out by the normalizer.

use std::fmt;
use thiserror::Error;

/// Top-level error for every fallible pipeline stage.
#[derive(Debug, Error)]
pub enum EtlError {
    /// A caller passed an argument that can never succeed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A page could not be downloaded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Writing a CSV file failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The relational sink rejected the load.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The spreadsheet API or its credentials failed.
    #[error("spreadsheet error: {0}")]
    Sheets(String),

    /// The pipeline config file could not be loaded.
    #[error("config error: {0}")]
    Config(String),
}

impl EtlError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        EtlError::InvalidArgument(msg.into())
    }
}

/// How a page download failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request exceeded the client timeout.
    Timeout,
    /// No connection could be established.
    Connect,
    /// The server answered with a non-2xx status.
    Status(u16),
    /// The response body could not be read.
    Body,
    Other,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Connect => write!(f, "connection failed"),
            FetchErrorKind::Status(code) => write!(f, "HTTP status {code}"),
            FetchErrorKind::Body => write!(f, "unreadable body"),
            FetchErrorKind::Other => write!(f, "request failed"),
        }
    }
}

/// A classified network failure for one URL.
///
/// The transport error is flattened into `kind` plus a message so callers
/// never depend on the HTTP client's error type.
#[derive(Debug, Clone, Error)]
#[error("failed to fetch URL {url}: {kind} ({message})")]
pub struct FetchError {
    pub url: String,
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            message: message.into(),
        }
    }

    /// Classify a `reqwest` failure for `url`.
    pub fn from_transport(url: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            FetchErrorKind::Timeout
        } else if err.is_connect() {
            FetchErrorKind::Connect
        } else if let Some(status) = err.status() {
            FetchErrorKind::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() {
            FetchErrorKind::Body
        } else {
            FetchErrorKind::Other
        };
        Self::new(url, kind, err.to_string())
    }
}
