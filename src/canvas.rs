//! # Canvas Service
//!
//! The narrow interface every caller (HTTP handlers, the `render` CLI) goes
//! through. It owns the session store, the image fetcher, the replay engine
//! and the export policy.
//!
//! ## Append ordering
//!
//! 1. Look up the session (NotFound before anything else).
//! 2. Validate the request.
//! 3. Fetch, decode and scale image sources.
//! 4. Lock the session, replay the log plus the new element, commit.
//!
//! Steps 2 and 3 are the only fallible ones and finish before the session is
//! touched, so a failed append leaves both log and surface as they were.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::element::{Element, ElementSpec, PendingElement};
use crate::error::EaselError;
use crate::export::{self, ExportConfig, ExportedPdf};
use crate::fetch::{self, FetchConfig, HttpFetcher, ImageFetcher};
use crate::render::{
    self,
    replay::{FullReplay, ReplayEngine},
};
use crate::session::{self, SessionStore, SessionSummary};

/// Limits applied to session creation.
#[derive(Debug, Clone, Copy)]
pub struct CanvasLimits {
    /// Largest accepted width or height, in pixels.
    pub max_dimension: u32,
}

impl Default for CanvasLimits {
    fn default() -> Self {
        Self {
            max_dimension: 2000,
        }
    }
}

/// Result of a successful append.
#[derive(Debug, Clone, Serialize)]
pub struct AppendOutcome {
    pub message: &'static str,
    pub id: String,
    /// Log length after the append.
    pub elements: usize,
}

/// Identity of a freshly created canvas.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedCanvas {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

/// A whole canvas described up front, as read by `easel render`.
///
/// ```json
/// {"width": 400, "height": 300,
///  "elements": [{"type": "rectangle", "properties": {"x": 0, "y": 0, "w": 50, "h": 50}}]}
/// ```
#[derive(Debug, Deserialize)]
pub struct CanvasScript {
    pub width: i64,
    pub height: i64,
    #[serde(default)]
    pub elements: Vec<ElementSpec>,
}

pub struct CanvasService {
    store: SessionStore,
    fetcher: Arc<dyn ImageFetcher>,
    replay: Arc<dyn ReplayEngine>,
    export: ExportConfig,
    limits: CanvasLimits,
}

impl CanvasService {
    pub fn new(
        fetcher: Arc<dyn ImageFetcher>,
        replay: Arc<dyn ReplayEngine>,
        export: ExportConfig,
        limits: CanvasLimits,
    ) -> Result<Self, EaselError> {
        export.validate()?;
        Ok(Self {
            store: SessionStore::new(),
            fetcher,
            replay,
            export,
            limits,
        })
    }

    /// Service with an HTTP fetcher and full replay.
    pub fn with_http(
        fetch: FetchConfig,
        export: ExportConfig,
        limits: CanvasLimits,
    ) -> Result<Self, EaselError> {
        let fetcher = Arc::new(HttpFetcher::new(fetch)?);
        Self::new(fetcher, Arc::new(FullReplay), export, limits)
    }

    pub fn export_config(&self) -> &ExportConfig {
        &self.export
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a blank canvas. A caller-supplied id replaces any session that
    /// already uses it.
    pub async fn create_session(
        &self,
        width: Option<i64>,
        height: Option<i64>,
        id: Option<String>,
    ) -> Result<CreatedCanvas, EaselError> {
        let (Some(width), Some(height)) = (width, height) else {
            return Err(EaselError::validation("Missing width or height"));
        };
        let max = self.limits.max_dimension as i64;
        if !(1..=max).contains(&width) || !(1..=max).contains(&height) {
            return Err(EaselError::validation(format!(
                "Width and height must be between 1 and {} pixels",
                max
            )));
        }

        let id = id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(session::generate_id);
        let summary = self.store.create(id, width as u32, height as u32).await;
        info!(id = %summary.id, width, height, "Canvas initialized");

        Ok(CreatedCanvas {
            id: summary.id,
            width: summary.width,
            height: summary.height,
        })
    }

    pub async fn append_element(
        &self,
        id: &str,
        spec: ElementSpec,
    ) -> Result<AppendOutcome, EaselError> {
        self.store.get(id).await?;
        let kind = spec.kind();

        let element = match self.prepare(spec).await {
            Ok(element) => element,
            Err(e) => {
                warn!(id, kind, error = %e, "Element rejected");
                return Err(e);
            }
        };

        let elements = self.store.append(id, element, self.replay.clone()).await?;
        info!(id, kind, elements, replay = self.replay.name(), "Element added");

        Ok(AppendOutcome {
            message: "Element added",
            id: id.to_string(),
            elements,
        })
    }

    async fn prepare(&self, spec: ElementSpec) -> Result<Element, EaselError> {
        match spec.validate()? {
            PendingElement::Ready(element) => Ok(element),
            PendingElement::Image(pending) => {
                let picture = fetch::resolve_picture(self.fetcher.as_ref(), pending).await?;
                Ok(Element::Image(picture))
            }
        }
    }

    pub async fn export_session(&self, id: &str) -> Result<ExportedPdf, EaselError> {
        let session = self.store.get(id).await?;
        let surface = {
            let mut session = session.lock().await;
            session.touch();
            session.surface().clone()
        };

        let config = self.export;
        let id_owned = id.to_string();
        let pdf = tokio::task::spawn_blocking(move || export::render_pdf(&id_owned, &surface, &config))
            .await
            .map_err(|e| EaselError::Export(format!("Export task failed: {}", e)))??;

        info!(id, width = pdf.width, height = pdf.height, size = pdf.bytes.len(), "Canvas exported");
        Ok(pdf)
    }

    pub async fn describe(&self, id: &str) -> Result<SessionSummary, EaselError> {
        let session = self.store.get(id).await?;
        let mut session = session.lock().await;
        session.touch();
        Ok(session.summary())
    }

    /// Full-resolution PNG of the current surface.
    pub async fn preview_png(&self, id: &str) -> Result<Vec<u8>, EaselError> {
        let session = self.store.get(id).await?;
        let surface = {
            let mut session = session.lock().await;
            session.touch();
            session.surface().clone()
        };

        tokio::task::spawn_blocking(move || render::to_png(&surface))
            .await
            .map_err(|e| EaselError::Export(format!("Preview task failed: {}", e)))?
    }

    /// Create a canvas and append every scripted element in order.
    ///
    /// Stops at the first rejected element; the error names its position.
    pub async fn run_script(&self, script: CanvasScript) -> Result<String, EaselError> {
        let created = self
            .create_session(Some(script.width), Some(script.height), None)
            .await?;

        for (index, spec) in script.elements.into_iter().enumerate() {
            self.append_element(&created.id, spec)
                .await
                .map_err(|e| match e {
                    EaselError::Validation(msg) => {
                        EaselError::Validation(format!("Element {}: {}", index, msg))
                    }
                    other => other,
                })?;
        }

        Ok(created.id)
    }

    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        self.store.evict_idle(ttl).await
    }
}
