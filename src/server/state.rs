//! Server state and configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::canvas::{CanvasLimits, CanvasService};
use crate::error::EaselError;
use crate::export::ExportConfig;
use crate::fetch::FetchConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:4000")
    pub listen_addr: String,
    /// Directory for temporary multipart uploads
    pub upload_dir: PathBuf,
    pub fetch: FetchConfig,
    pub export: ExportConfig,
    pub limits: CanvasLimits,
    /// Evict sessions idle this long. `None` keeps them until exit.
    pub session_ttl: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:4000".to_string(),
            upload_dir: PathBuf::from("uploads"),
            fetch: FetchConfig::default(),
            export: ExportConfig::default(),
            limits: CanvasLimits::default(),
            session_ttl: None,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub canvas: CanvasService,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self, EaselError> {
        let canvas = CanvasService::with_http(config.fetch.clone(), config.export, config.limits)?;
        Ok(Self { config, canvas })
    }

    /// State around an already-built service (custom fetcher or replay).
    pub fn with_service(config: ServerConfig, canvas: CanvasService) -> Self {
        Self { config, canvas }
    }
}
