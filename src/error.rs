//! # Error Types
//!
//! This module defines error types used throughout the easel library.

use std::time::Duration;
use thiserror::Error;

/// Main error type for easel operations
#[derive(Debug, Error)]
pub enum EaselError {
    /// Missing or invalid request fields (dimensions, coordinates, colors)
    #[error("{0}")]
    Validation(String),

    /// Unknown session identifier
    #[error("Canvas not found: {0}")]
    NotFound(String),

    /// Image source could not be fetched
    #[error("Image loading failed: {0}")]
    Fetch(#[from] FetchError),

    /// Payload is not a decodable image
    #[error("Image loading failed: {0}")]
    Decode(String),

    /// Export raster or document could not be produced
    #[error("Export error: {0}")]
    Export(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EaselError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            EaselError::Validation(_) => "validation",
            EaselError::NotFound(_) => "not_found",
            EaselError::Fetch(_) => "fetch",
            EaselError::Decode(_) => "decode",
            EaselError::Export(_) => "export",
            EaselError::Io(_) => "io",
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        EaselError::Validation(msg.into())
    }
}

/// Failure while resolving a remote image source.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Scheme other than http/https
    #[error("Only HTTP(S) protocols are supported, got '{0}'")]
    UnsupportedProtocol(String),

    /// Source could not be parsed as a URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Request did not complete within the configured timeout
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// Terminal response other than 200
    #[error("HTTP {status}: {reason}")]
    Status { status: u16, reason: String },

    /// Redirect chain longer than the configured cap
    #[error("Too many redirects (limit {0})")]
    TooManyRedirects(usize),

    /// Connection, TLS or body read failure
    #[error("Network error: {0}")]
    Network(String),
}
