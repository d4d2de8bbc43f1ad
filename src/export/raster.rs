use async_trait::async_trait;
use image::RgbImage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("rasterizer '{program}' not available: {reason}")]
    Unavailable { program: String, reason: String },
    #[error("rasterizer exited with status {0}")]
    Failed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode rasterized image: {0}")]
    Decode(#[from] image::ImageError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    /// Device-pixel multiplier; a 1200px wide document at scale 2 is 2400 pixels wide.
    pub scale: f32,
    pub window_width: u32,
}

/// Rasterized report plus the scale it was produced at.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub pixels: RgbImage,
    pub scale: f32,
}

impl RasterImage {
    pub fn new(pixels: RgbImage, scale: f32) -> Self {
        Self { pixels, scale }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Turns a styled HTML document into pixels.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, document: &str, options: &RasterOptions) -> Result<RasterImage, RasterError>;
}

/// Rasterizer backed by the `wkhtmltoimage` command-line program.
#[derive(Debug, Clone)]
pub struct WkhtmlRasterizer {
    program: PathBuf,
}

impl WkhtmlRasterizer {
    pub fn new<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Check the program runs by invoking `<program> --version`.
    pub async fn ensure_available(&self) -> Result<(), RasterError> {
        let status = Command::new(&self.program)
            .arg("--version")
            .kill_on_drop(true)
            .status()
            .await;
        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(s) => Err(RasterError::Unavailable {
                program: self.program.display().to_string(),
                reason: format!("exit status {}", s),
            }),
            Err(e) => Err(RasterError::Unavailable {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Arguments for one `wkhtmltoimage` run rendering `input` into a PNG at `output`.
pub fn command_args(options: &RasterOptions, input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "--quiet".into(),
        "--width".into(),
        options.window_width.to_string().into(),
        "--zoom".into(),
        options.scale.to_string().into(),
        "--format".into(),
        "png".into(),
        input.as_os_str().to_owned(),
        output.as_os_str().to_owned(),
    ]
}

#[async_trait]
impl Rasterizer for WkhtmlRasterizer {
    #[instrument(skip_all)]
    async fn rasterize(&self, document: &str, options: &RasterOptions) -> Result<RasterImage, RasterError> {
        // Working files live only for this call.
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("report.html");
        let output = workdir.path().join("report.png");
        tokio::fs::write(&input, document).await?;

        let args = command_args(options, &input, &output);
        debug!(program=%self.program.display(), ?args, "running rasterizer");
        let status = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| RasterError::Unavailable {
                program: self.program.display().to_string(),
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(RasterError::Failed(status.to_string()));
        }

        let bytes = tokio::fs::read(&output).await?;
        let pixels = image::load_from_memory(&bytes)?.to_rgb8();
        debug!(width = pixels.width(), height = pixels.height(), "rasterized report");
        Ok(RasterImage::new(pixels, options.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_args_carry_width_and_zoom() {
        let options = RasterOptions {
            scale: 2.0,
            window_width: 1200,
        };
        let args = command_args(&options, Path::new("/tmp/in.html"), Path::new("/tmp/out.png"));
        let args: Vec<String> = args.into_iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["--quiet", "--width", "1200", "--zoom", "2", "--format", "png", "/tmp/in.html", "/tmp/out.png"]
        );
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let rasterizer = WkhtmlRasterizer::new("/nonexistent/clip-saver-rasterizer");
        let err = rasterizer.ensure_available().await.unwrap_err();
        assert!(matches!(err, RasterError::Unavailable { .. }));

        let options = RasterOptions {
            scale: 1.0,
            window_width: 1200,
        };
        let err = rasterizer.rasterize("<p>x</p>", &options).await.unwrap_err();
        assert!(matches!(err, RasterError::Unavailable { .. }));
    }
}
