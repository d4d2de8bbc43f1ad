//! Export pipeline: fetch the full clip batch, encode it as JSON, CSV or a
//! paginated PDF, and save the artifact under a timestamped file name.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::api::{ApiError, ClipService};
use crate::config::Config;
use crate::model::Clip;

pub mod csv;
pub mod html;
pub mod paginate;
pub mod pdf;
pub mod raster;

use self::paginate::PaginateError;
use self::pdf::{A4Document, AssembleError, DocumentAssembler};
use self::raster::{RasterError, RasterOptions, Rasterizer};

pub const EMPTY_PDF_NOTICE: &str = "No clips to export.";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to fetch clips: {0}")]
    Fetch(#[from] ApiError),
    #[error("failed to serialize clips: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to rasterize report: {0}")]
    Raster(#[from] RasterError),
    #[error("failed to paginate report: {0}")]
    Paginate(#[from] PaginateError),
    #[error("failed to assemble PDF: {0}")]
    Assemble(#[from] AssembleError),
    #[error("failed to save {filename}: {source}")]
    Save {
        filename: String,
        #[source]
        source: std::io::Error,
    },
    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Pdf,
    /// PDF rendered by the API server instead of locally.
    ServerPdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf | ExportFormat::ServerPdf => "pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
            ExportFormat::Pdf | ExportFormat::ServerPdf => "PDF",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::ServerPdf => f.write_str("server-pdf"),
            other => f.write_str(other.extension()),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "server-pdf" => Ok(ExportFormat::ServerPdf),
            other => Err(format!(
                "unknown export format '{}' (expected json, csv, pdf or server-pdf)",
                other
            )),
        }
    }
}

/// `clips_export_2024-05-02-21-05-03.csv`: the UTC ISO date-time cut to
/// seconds with `:` and `T` replaced by `-`.
pub fn export_filename(at: &DateTime<Utc>, format: ExportFormat) -> String {
    format!(
        "clips_export_{}.{}",
        at.format("%Y-%m-%d-%H-%M-%S"),
        format.extension()
    )
}

/// Where finished artifacts go.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf>;
}

/// Writes artifacts into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactSink for DirSink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }
}

/// User-facing messages from the export flow.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        eprintln!("{}", message);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub title: String,
    pub scale: f32,
    pub jpeg_quality: u8,
}

impl ExportSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            title: cfg.export.title.clone(),
            scale: cfg.export.scale,
            jpeg_quality: cfg.export.jpeg_quality,
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    /// PDF requested for an empty batch; nothing was written.
    Empty,
}

pub struct Exporter {
    service: Arc<dyn ClipService>,
    rasterizer: Arc<dyn Rasterizer>,
    sink: Arc<dyn ArtifactSink>,
    notifier: Arc<dyn Notifier>,
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(
        service: Arc<dyn ClipService>,
        rasterizer: Arc<dyn Rasterizer>,
        sink: Arc<dyn ArtifactSink>,
        notifier: Arc<dyn Notifier>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            service,
            rasterizer,
            sink,
            notifier,
            settings,
        }
    }

    /// Run one export and report the result to the user. Never fails: errors
    /// are logged and turned into a notice.
    pub async fn run(&self, format: ExportFormat) -> Option<PathBuf> {
        match self.export(format).await {
            Ok(ExportOutcome::Saved(path)) => {
                self.notifier
                    .notify(&format!("Saved {} export to {}", format.label(), path.display()));
                Some(path)
            }
            Ok(ExportOutcome::Empty) => None,
            Err(err) => {
                error!(?err, %format, "export failed");
                self.notifier.notify(&format!(
                    "{} export failed. See logs for details.",
                    format.label()
                ));
                None
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn export(&self, format: ExportFormat) -> Result<ExportOutcome, ExportError> {
        let bytes = match format {
            ExportFormat::ServerPdf => self.service.fetch_export_pdf().await?,
            _ => {
                let clips = self.service.fetch_export().await?;
                info!(count = clips.len(), "fetched export batch");
                match format {
                    ExportFormat::Json => serde_json::to_vec_pretty(&clips)?,
                    ExportFormat::Csv => csv::to_csv(&clips).into_bytes(),
                    _ => {
                        if clips.is_empty() {
                            self.notifier.notify(EMPTY_PDF_NOTICE);
                            return Ok(ExportOutcome::Empty);
                        }
                        self.render_pdf(&clips).await?
                    }
                }
            }
        };

        let filename = export_filename(&Utc::now(), format);
        let path = self
            .sink
            .save(&filename, &bytes)
            .await
            .map_err(|source| ExportError::Save {
                filename: filename.clone(),
                source,
            })?;
        info!(path=%path.display(), bytes = bytes.len(), "export saved");
        Ok(ExportOutcome::Saved(path))
    }

    async fn render_pdf(&self, clips: &[Clip]) -> Result<Vec<u8>, ExportError> {
        let document = html::render_report(clips, &self.settings.title);
        let options = RasterOptions {
            scale: self.settings.scale,
            window_width: html::REPORT_WIDTH_PX,
        };
        let image = self.rasterizer.rasterize(&document, &options).await?;

        let title = self.settings.title.clone();
        let quality = self.settings.jpeg_quality;
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, ExportError> {
            let mut doc = A4Document::new(&title);
            let pages = paginate::paginate(&image, &mut doc, quality)?;
            info!(pages, "assembled PDF");
            Ok(doc.save()?)
        })
        .await?
    }
}
