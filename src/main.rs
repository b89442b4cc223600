//! # Easel CLI
//!
//! Command-line interface for the canvas builder.
//!
//! ## Usage
//!
//! ```bash
//! # Run the HTTP API
//! easel serve --listen 0.0.0.0:4000
//!
//! # Expire canvases idle for 30 minutes
//! easel serve --session-ttl 1800
//!
//! # Render a JSON script straight to PDF (and optionally a PNG preview)
//! easel render scene.json --output scene.pdf --png scene.png
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use easel::{
    EaselError,
    canvas::{CanvasLimits, CanvasScript, CanvasService},
    export::ExportConfig,
    fetch::FetchConfig,
    server::{self, ServerConfig},
};

/// Easel - Incremental canvas builder with PDF export
#[derive(Parser, Debug)]
#[command(name = "easel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:4000")]
        listen: String,

        /// Directory for temporary multipart uploads
        #[arg(long, default_value = "uploads")]
        upload_dir: PathBuf,

        #[command(flatten)]
        export: ExportArgs,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "10")]
        fetch_timeout: u64,

        /// Redirects followed per image fetch
        #[arg(long, default_value = "5")]
        max_redirects: usize,

        /// Largest accepted canvas width or height
        #[arg(long, default_value = "2000")]
        max_dimension: u32,

        /// Drop canvases idle for this many seconds (default: keep forever)
        #[arg(long, value_name = "SECS")]
        session_ttl: Option<u64>,
    },

    /// Render a JSON canvas script to PDF
    Render {
        /// Script file: {"width", "height", "elements": [{"type", "properties"}]}
        script: PathBuf,

        /// PDF output path
        #[arg(long, short, default_value = "canvas.pdf")]
        output: PathBuf,

        /// Also write a full-resolution PNG preview
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,

        #[command(flatten)]
        export: ExportArgs,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "10")]
        fetch_timeout: u64,
    },
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Export downscale factor in (0, 1]
    #[arg(long, default_value = "0.5")]
    export_scale: f32,

    /// Export JPEG quality in [0, 1]
    #[arg(long, default_value = "0.6")]
    export_quality: f32,
}

impl ExportArgs {
    fn config(&self) -> Result<ExportConfig, EaselError> {
        let config = ExportConfig {
            scale: self.export_scale,
            quality: self.export_quality,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> Result<(), EaselError> {
    match command {
        Commands::Serve {
            listen,
            upload_dir,
            export,
            fetch_timeout,
            max_redirects,
            max_dimension,
            session_ttl,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                upload_dir,
                fetch: FetchConfig {
                    timeout: Duration::from_secs(fetch_timeout),
                    max_redirects,
                },
                export: export.config()?,
                limits: CanvasLimits { max_dimension },
                session_ttl: session_ttl.map(Duration::from_secs),
            };
            server::serve(config).await
        }

        Commands::Render {
            script,
            output,
            png,
            export,
            fetch_timeout,
        } => {
            let raw = tokio::fs::read_to_string(&script).await?;
            let script: CanvasScript = serde_json::from_str(&raw).map_err(|e| {
                EaselError::Validation(format!("Invalid script {}: {}", script.display(), e))
            })?;

            let service = CanvasService::with_http(
                FetchConfig {
                    timeout: Duration::from_secs(fetch_timeout),
                    ..FetchConfig::default()
                },
                export.config()?,
                CanvasLimits::default(),
            )?;

            let id = service.run_script(script).await?;
            let pdf = service.export_session(&id).await?;
            tokio::fs::write(&output, &pdf.bytes).await?;
            info!(
                output = %output.display(),
                width = pdf.width,
                height = pdf.height,
                size = pdf.bytes.len(),
                "Wrote PDF"
            );

            if let Some(png_path) = png {
                let preview = service.preview_png(&id).await?;
                tokio::fs::write(&png_path, preview).await?;
                info!(output = %png_path.display(), "Wrote preview");
            }

            Ok(())
        }
    }
}
