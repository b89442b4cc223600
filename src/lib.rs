//! # Easel - Incremental Canvas Builder
//!
//! Easel builds raster canvases one element at a time and exports them as
//! single-page PDFs. It provides:
//!
//! - **Sessions**: fixed-size canvases keyed by opaque identifiers
//! - **Elements**: rectangles, circles, text and remote or uploaded images
//! - **Replay**: the surface is redrawn from the element log on every append
//! - **Export**: downscaled JPEG wrapped in a one-page PDF
//! - **Server**: JSON and multipart HTTP API
//!
//! ## Quick Start
//!
//! ```no_run
//! use easel::{
//!     canvas::{CanvasLimits, CanvasService},
//!     element::{ElementSpec, RectangleSpec},
//!     export::ExportConfig,
//!     fetch::FetchConfig,
//! };
//!
//! # async fn example() -> Result<(), easel::EaselError> {
//! let service = CanvasService::with_http(
//!     FetchConfig::default(),
//!     ExportConfig::default(),
//!     CanvasLimits::default(),
//! )?;
//!
//! let canvas = service.create_session(Some(400), Some(300), None).await?;
//! service
//!     .append_element(
//!         &canvas.id,
//!         ElementSpec::Rectangle(RectangleSpec {
//!             x: Some(0.0),
//!             y: Some(0.0),
//!             w: Some(400.0),
//!             h: Some(300.0),
//!             color: Some("#ff0000".to_string()),
//!         }),
//!     )
//!     .await?;
//!
//! let pdf = service.export_session(&canvas.id).await?;
//! std::fs::write(&pdf.filename, &pdf.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`canvas`] | Service facade used by the server and CLI |
//! | [`element`] | Element model, request specs and validation |
//! | [`session`] | Sessions and the session store |
//! | [`render`] | Rasterization and replay engines |
//! | [`fetch`] | Image source normalization, fetching and decoding |
//! | [`export`] | PDF export |
//! | [`server`] | HTTP API |
//! | [`error`] | Error types |

pub mod canvas;
pub mod element;
pub mod error;
pub mod export;
pub mod fetch;
pub mod render;
pub mod server;
pub mod session;

// Re-exports for convenience
pub use canvas::CanvasService;
pub use element::Element;
pub use error::EaselError;
