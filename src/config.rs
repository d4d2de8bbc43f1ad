//! Configuration loader and validator for the Clip Saver client.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api";
pub const DEFAULT_REPORT_TITLE: &str = "Clip Saver Export";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema. Every section has
/// defaults, so a partial file is accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub api: Api,
    pub export: Export,
    pub rasterizer: Rasterizer,
}

/// REST API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Api {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Export output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Export {
    pub out_dir: String,
    pub title: String,
    /// Device-pixel multiplier used when rasterizing the PDF report.
    pub scale: f32,
    pub jpeg_quality: u8,
}

impl Default for Export {
    fn default() -> Self {
        Self {
            out_dir: "./exports".to_string(),
            title: DEFAULT_REPORT_TITLE.to_string(),
            scale: 2.0,
            jpeg_quality: 95,
        }
    }
}

/// External HTML-to-image program.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Rasterizer {
    pub program: String,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self {
            program: "wkhtmltoimage".to_string(),
        }
    }
}

impl Config {
    /// Ensure required directories exist (creates `export.out_dir` if missing).
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        if self.export.out_dir.trim().is_empty() {
            return Ok(());
        }
        fs::create_dir_all(&self.export.out_dir)
    }
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    validate(&cfg)?;
    Ok(cfg)
}

/// Like [`load`], but a missing file yields the validated defaults.
pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
    if path.exists() {
        return load(Some(path));
    }
    let cfg = Config::default();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let base = cfg.api.base_url.trim();
    if base.is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    if Url::parse(base).is_err() {
        return Err(ConfigError::Invalid("api.base_url must be an absolute URL"));
    }
    if cfg.api.timeout_seconds == 0 {
        return Err(ConfigError::Invalid("api.timeout_seconds must be > 0"));
    }

    if cfg.export.out_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("export.out_dir must be non-empty"));
    }
    if cfg.export.title.trim().is_empty() {
        return Err(ConfigError::Invalid("export.title must be non-empty"));
    }
    if !cfg.export.scale.is_finite() || cfg.export.scale <= 0.0 {
        return Err(ConfigError::Invalid("export.scale must be a positive number"));
    }
    if !(1..=100).contains(&cfg.export.jpeg_quality) {
        return Err(ConfigError::Invalid("export.jpeg_quality must be within 1..=100"));
    }

    if cfg.rasterizer.program.trim().is_empty() {
        return Err(ConfigError::Invalid("rasterizer.program must be non-empty"));
    }

    Ok(())
}

/// Returns the documented example YAML content.
pub fn example() -> &'static str {
    r#"api:
  base_url: "http://localhost:5000/api"
  timeout_seconds: 30

export:
  out_dir: "./exports"
  title: "Clip Saver Export"
  scale: 2.0
  jpeg_quality: 95

rasterizer:
  program: "wkhtmltoimage"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parse_example_ok() {
        let cfg: Config = serde_yaml::from_str(example()).unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn partial_file_uses_defaults() {
        let cfg: Config = serde_yaml::from_str("api:\n  base_url: \"https://clips.example/api\"\n").unwrap();
        validate(&cfg).unwrap();
        assert_eq!(cfg.api.base_url, "https://clips.example/api");
        assert_eq!(cfg.api.timeout_seconds, 30);
        assert_eq!(cfg.export.jpeg_quality, 95);
        assert_eq!(cfg.rasterizer.program, "wkhtmltoimage");
    }

    #[test]
    fn invalid_base_url() {
        let mut cfg = Config::default();
        cfg.api.base_url = "".into();
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("api.base_url")), _ => panic!("wrong error") }

        cfg.api.base_url = "not a url".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn invalid_export_settings() {
        let mut cfg = Config::default();
        cfg.export.scale = 0.0;
        let err = validate(&cfg).unwrap_err();
        match err { ConfigError::Invalid(msg) => assert!(msg.contains("export.scale")), _ => panic!("wrong error") }

        let mut cfg = Config::default();
        cfg.export.scale = f32::NAN;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.export.jpeg_quality = 0;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.export.jpeg_quality = 101;
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.export.out_dir = " ".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));

        let mut cfg = Config::default();
        cfg.rasterizer.program = "".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn ensure_dirs_creates_out_dir() {
        let td = tempdir().unwrap();
        let out = td.path().join("exports");
        let mut cfg = Config::default();
        cfg.export.out_dir = out.to_string_lossy().to_string();
        cfg.ensure_dirs().unwrap();
        assert!(out.exists());
    }

    #[test]
    fn load_from_file_ok() {
        let td = tempdir().unwrap();
        let p = td.path().join("config.yaml");
        fs::write(&p, example()).unwrap();
        let cfg = load(Some(&p)).unwrap();
        assert_eq!(cfg.export.title, DEFAULT_REPORT_TITLE);
    }

    #[test]
    fn load_or_default_without_file() {
        let td = tempdir().unwrap();
        let cfg = load_or_default(&td.path().join("missing.yaml")).unwrap();
        assert_eq!(cfg.api.base_url, DEFAULT_API_BASE);
    }
}
