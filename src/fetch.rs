//! # Image Fetch Adapter
//!
//! Resolves an image element's source to decoded pixels.
//!
//! - Remote sources go through [`normalize_source`] (the single place where a
//!   missing scheme becomes `https://`) and then an [`ImageFetcher`].
//! - Only `http` and `https` are ever requested; anything else fails before a
//!   connection is attempted.
//! - [`HttpFetcher`] follows redirects by hand so the chain length can be
//!   capped, and enforces a per-request timeout.
//! - Uploaded files are read from disk, decoded, and deleted whether or not
//!   decoding succeeded.

use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{StatusCode, Url, header::LOCATION, redirect::Policy};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::element::{Picture, PendingImage};
use crate::error::{EaselError, FetchError};
use crate::render;

/// Outbound fetch settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Whole-request timeout (connect, headers and body).
    pub timeout: Duration,
    /// Maximum number of redirects followed before giving up.
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_redirects: 5,
        }
    }
}

/// Network half of image loading: turns a validated URL into raw bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Where an image element's pixels come from.
#[derive(Debug)]
pub enum ImageSource {
    /// Raw URL as submitted; normalized before fetching.
    Url(String),
    /// File written by the upload layer, owned (and deleted) by the core.
    Upload(UploadedFile),
}

/// A temporary upload on disk. The file is removed when this is dropped.
#[derive(Debug)]
pub struct UploadedFile {
    path: PathBuf,
    name: String,
}

impl UploadedFile {
    /// Take ownership of `path`. `name` is the client-side file name, kept for
    /// display.
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), %e, "Failed to remove upload"),
        }
    }
}

/// Turn a user-supplied image reference into a fetchable URL.
///
/// Sources without a scheme get `https://` prepended. Sources with any scheme
/// other than http/https are rejected.
pub fn normalize_source(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl {
            url: String::new(),
            reason: "empty source".to_string(),
        });
    }

    let candidate = match trimmed.split_once("://") {
        Some((scheme, _)) => {
            let scheme = scheme.to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(FetchError::UnsupportedProtocol(scheme));
            }
            trimmed.to_string()
        }
        None => format!("https://{}", trimmed),
    };

    let url = Url::parse(&candidate).map_err(|e| FetchError::InvalidUrl {
        url: candidate.clone(),
        reason: e.to_string(),
    })?;
    check_scheme(&url)?;
    Ok(url)
}

fn check_scheme(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::UnsupportedProtocol(other.to_string())),
    }
}

/// [`ImageFetcher`] backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, EaselError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("easel/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::none())
            .timeout(config.timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("HTTP client error: {}", e)))?;
        Ok(Self { client, config })
    }

    fn request_error(&self, url: &Url, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            warn!(%url, timeout = ?self.config.timeout, "Image request timed out");
            FetchError::Timeout(self.config.timeout)
        } else {
            warn!(%url, %e, "Image request failed");
            FetchError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        check_scheme(url)?;
        let mut current = url.clone();
        let mut redirects = 0usize;

        loop {
            debug!(url = %current, "Fetching image");
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| self.request_error(&current, e))?;
            let status = response.status();

            if status.is_redirection()
                && let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
            {
                if redirects >= self.config.max_redirects {
                    warn!(url = %current, limit = self.config.max_redirects, "Redirect limit reached");
                    return Err(FetchError::TooManyRedirects(self.config.max_redirects));
                }
                let next = current.join(location).map_err(|e| FetchError::InvalidUrl {
                    url: location.to_string(),
                    reason: e.to_string(),
                })?;
                check_scheme(&next)?;
                info!(from = %current, to = %next, "Following redirect");
                current = next;
                redirects += 1;
                continue;
            }

            if status != StatusCode::OK {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                });
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| self.request_error(&current, e))?;
            debug!(url = %current, size = bytes.len(), "Image fetched");
            return Ok(bytes.to_vec());
        }
    }
}

/// Decode an image payload on the blocking pool.
pub async fn decode(bytes: Vec<u8>) -> Result<DynamicImage, EaselError> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| EaselError::Decode(format!("Decode task failed: {}", e)))?
        .map_err(|e| EaselError::Decode(format!("Failed to decode image: {}", e)))
}

/// Fetch (or read) and decode an image source.
///
/// Returns a label for the source alongside the pixels. Upload files are
/// deleted before this returns, on every path.
pub async fn fetch_and_decode(
    fetcher: &dyn ImageFetcher,
    source: ImageSource,
) -> Result<(String, DynamicImage), EaselError> {
    match source {
        ImageSource::Url(raw) => {
            let url = normalize_source(&raw)?;
            let bytes = fetcher.fetch(&url).await?;
            let image = decode(bytes).await?;
            Ok((url.to_string(), image))
        }
        ImageSource::Upload(upload) => {
            let label = upload.name().to_string();
            let decoded = match tokio::fs::read(upload.path()).await {
                Ok(bytes) => decode(bytes).await,
                Err(e) => Err(EaselError::Io(e)),
            };
            drop(upload);
            decoded.map(|image| (label, image))
        }
    }
}

/// Resolve a validated image placement into a loggable [`Picture`].
pub async fn resolve_picture(
    fetcher: &dyn ImageFetcher,
    pending: PendingImage,
) -> Result<Picture, EaselError> {
    let PendingImage {
        x,
        y,
        width,
        height,
        source,
    } = pending;
    let (label, image) = fetch_and_decode(fetcher, source).await?;

    let pixels = tokio::task::spawn_blocking(move || render::fit_to_box(&image, width, height))
        .await
        .map_err(|e| EaselError::Decode(format!("Resize task failed: {}", e)))?;

    Ok(Picture {
        x,
        y,
        width,
        height,
        source: label,
        pixels: Arc::new(pixels),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_prepends_https() {
        let url = normalize_source("  example.com/cat.png ").unwrap();
        assert_eq!(url.as_str(), "https://example.com/cat.png");
    }

    #[test]
    fn test_normalize_keeps_http() {
        let url = normalize_source("http://example.com/cat.png").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_normalize_rejects_other_protocols() {
        for source in ["ftp://example.com/a.png", "file:///etc/passwd", "FTP://x/y"] {
            match normalize_source(source) {
                Err(FetchError::UnsupportedProtocol(_)) => {}
                other => panic!("{} should be rejected, got {:?}", source, other),
            }
        }
    }

    #[test]
    fn test_normalize_rejects_empty() {
        assert!(matches!(
            normalize_source("   "),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_uploaded_file_removed_on_drop() {
        let path = std::env::temp_dir().join(format!("easel-drop-{}", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"not an image").unwrap();
        let upload = UploadedFile::new(&path, "x.png");
        assert!(path.exists());
        drop(upload);
        assert!(!path.exists());
    }
}
